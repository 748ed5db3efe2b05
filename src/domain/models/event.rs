/// One incremental fragment emitted while a completion streams, paired with a
/// snapshot of everything received so far. Consumers that keep their own
/// running buffer use the fragment; the snapshot serves the ones that don't.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatDelta {
    pub fragment: String,
    pub accumulated: String,
}
