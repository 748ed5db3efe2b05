#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::process;

use anyhow::Error;

use crate::application::cli;
use crate::application::repl;
use crate::configuration::Config;

fn handle_error(err: Error) {
    eprintln!(
        "pagepal {} failed with the following error:\n\n{err}",
        env!("CARGO_PKG_VERSION")
    );

    process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::build().get_matches();
    if let Err(err) = Config::load(&matches).await {
        handle_error(err);
        return;
    }

    if let Err(err) = repl::run().await {
        handle_error(err);
    }
}
