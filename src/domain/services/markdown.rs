//! Lossy, non-recursive Markdown-to-HTML rendering as an ordered rule
//! pipeline over a string buffer. This is deliberately not a CommonMark
//! parser: each rule is a single non-overlapping regex pass, applied in a
//! fixed order, and whatever the rules miss stays plain text.
//!
//! Input is HTML-escaped before any rule runs, so angle brackets in model
//! output can never become live markup.

#[cfg(test)]
#[path = "markdown_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

impl Rule {
    fn new(pattern: &str, replacement: &'static str) -> Rule {
        return Rule {
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        };
    }
}

// Order matters. Bold runs before italic on the same buffer, which means
// `**text**` is consumed as bold before the italic rule can mis-read its
// stars; mixed forms like `***text***` stay ambiguous. That ordering quirk is
// an accepted limitation of the pipeline, not something to fix here.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    return vec![
        Rule::new(r"(?m)^#\s+(.+)$", "<h1>$1</h1>"),
        Rule::new(r"(?m)^##\s+(.+)$", "<h2>$1</h2>"),
        Rule::new(r"(?m)^###\s+(.+)$", "<h3>$1</h3>"),
        Rule::new(r"(?m)^####\s+(.+)$", "<h4>$1</h4>"),
        Rule::new(r"\*\*(.+?)\*\*", "<strong>$1</strong>"),
        Rule::new(r"\*([^*\n]+)\*", "<em>$1</em>"),
        Rule::new(r"`([^`\n]+)`", "<code>$1</code>"),
        // List items only; no enclosing <ul> is inserted, the consumer styles
        // bare <li> elements.
        Rule::new(r"(?m)^[-*+]\s+(.+)$", "<li>$1</li>"),
    ];
});

static LINK: Lazy<Regex> = Lazy::new(|| return Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());

// Links get their own pass because the URL lands inside a quoted attribute:
// a double quote in it would terminate the href early, so it is escaped here
// rather than in the up-front pass.
fn render_links(html: &str) -> String {
    return LINK
        .replace_all(html, |caps: &regex::Captures| {
            let url = caps[2].replace('"', "&quot;");
            let label = &caps[1];
            return format!(
                r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{label}</a>"#
            );
        })
        .to_string();
}

fn escape_html(text: &str) -> String {
    return text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
}

// Blocks separated by blank lines become paragraphs, unless an earlier rule
// already produced markup in them. A raw '<' can only come from our own
// rules since the input was escaped up front.
fn wrap_paragraphs(html: &str) -> String {
    return html
        .split("\n\n")
        .filter(|block| return !block.trim().is_empty())
        .map(|block| {
            let trimmed = block.trim();
            if trimmed.contains('<') {
                return trimmed.to_string();
            }
            return format!("<p>{trimmed}</p>");
        })
        .collect::<Vec<String>>()
        .join("\n");
}

/// Renders markdown-ish text into a sanitized HTML fragment. Pure function:
/// no retained state, always finite, restartable on every call.
pub fn render(markdown: &str) -> String {
    let mut html = escape_html(markdown);
    for rule in RULES.iter() {
        html = rule.pattern.replace_all(&html, rule.replacement).to_string();
    }
    html = render_links(&html);

    return wrap_paragraphs(&html);
}
