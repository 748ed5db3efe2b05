pub mod cli;
pub mod repl;
