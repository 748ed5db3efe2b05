use std::path;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::ChatError;
use crate::domain::models::Role;
use crate::domain::services::ChatController;
use crate::domain::services::ChatView;
use crate::domain::services::SessionStore;
use crate::infrastructure::backends::openai::OpenAI;
use crate::infrastructure::storage::FileStore;

fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Starts a fresh session, aborting any reply still streaming.
- /sessions (/s) - Lists all sessions, most recently updated first.
- /switch ID - Switches to the session with the given id.
- /clear - Empties the current session without deleting it.
- /help (/h) - Shows this help.
- /quit /exit (/q) - Leave pagepal.

Anything else is sent to the model as a prompt.
        "#;

    return text.trim().to_string();
}

/// Renders bubbles as labeled blocks on stdout. In-progress updates are
/// buffered and only the finalized bubble is printed, keeping the output a
/// readable transcript rather than a redraw loop.
#[derive(Default)]
struct TerminalView {
    bubbles: Vec<Role>,
}

impl TerminalView {
    fn label(role: Role) -> String {
        match role {
            Role::User => return Config::get(ConfigKey::Username),
            Role::Assistant => return Config::get(ConfigKey::Model),
        }
    }

    fn print_bubble(role: Role, html: &str) {
        println!("{}:\n{html}\n", TerminalView::label(role));
    }
}

impl ChatView for TerminalView {
    fn append_bubble(&mut self, role: Role, html: &str) -> usize {
        self.bubbles.push(role);
        if !html.is_empty() {
            TerminalView::print_bubble(role, html);
        }

        return self.bubbles.len() - 1;
    }

    fn update_bubble(&mut self, handle: usize, html: &str, typing: bool) {
        if typing {
            return;
        }

        let role = self.bubbles.get(handle).copied().unwrap_or(Role::Assistant);
        TerminalView::print_bubble(role, html);
    }

    fn set_input_enabled(&mut self, _enabled: bool) {
        // The read loop below only prompts again once a send resolves, so
        // input enablement is implicit in the terminal front-end.
    }

    fn clear(&mut self) {
        self.bubbles.clear();
        println!("----");
    }
}

async fn prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    return Ok(());
}

pub async fn run() -> Result<()> {
    let storage =
        FileStore::new(path::PathBuf::from(Config::get(ConfigKey::DataDir)).join("storage"));
    let store = SessionStore::new(storage, &Config::get(ConfigKey::SourceURL));
    let backend = OpenAI::default();

    if let Err(err) = backend.health_check().await {
        eprintln!("Warning: {err}. Replies may fail until the endpoint is reachable.");
    }

    let mut controller = ChatController::new(backend, store, TerminalView::default());
    controller.open().await;

    println!("pagepal {} - /help for commands", env!("CARGO_PKG_VERSION"));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt().await?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();

        match input {
            "/quit" | "/exit" | "/q" => break,
            "/help" | "/h" => println!("{}", help_text()),
            "/new" | "/n" => {
                let id = controller.new_chat().await;
                println!("Started session {id}");
            }
            "/clear" => controller.clear_chat().await,
            "/sessions" | "/s" => {
                for session in controller.store().list_sessions() {
                    let marker = if Some(session.id.as_str()) == controller.store().current_id() {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{marker} {id}  {updated}  ({count} messages)  {title}",
                        id = session.id,
                        updated = session.updated_at.format("%Y-%m-%d %H:%M"),
                        count = session.messages.len(),
                        title = session.title,
                    );
                }
            }
            _ => {
                if let Some(id) = input.strip_prefix("/switch ") {
                    if !controller.switch(id.trim()).await {
                        println!("No session found for id {}", id.trim());
                    }
                } else if input.starts_with('/') {
                    println!("Unknown command. /help lists what's available.");
                } else if let Err(err) = controller.send(input).await {
                    match err {
                        // Failures are already rendered into the transcript.
                        ChatError::Http { .. }
                        | ChatError::Interrupted { .. }
                        | ChatError::Canceled { .. } => {}
                        ChatError::EmptyPrompt => {}
                        other => println!("{other}"),
                    }
                }
            }
        }

        prompt().await?;
    }

    return Ok(());
}
