use clap::Arg;
use clap::Command;

use crate::configuration::ConfigKey;

pub fn build() -> Command {
    return Command::new("pagepal")
        .about("Chat with a model about any page, with streaming replies and persistent sessions")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("PAGEPAL_CONFIG_FILE")
                .num_args(1)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new(ConfigKey::EndpointURL.to_string())
                .long(ConfigKey::EndpointURL.to_string())
                .env("PAGEPAL_ENDPOINT_URL")
                .num_args(1)
                .help("Base URL of the OpenAI-compatible chat completion endpoint"),
        )
        .arg(
            Arg::new(ConfigKey::ApiToken.to_string())
                .long(ConfigKey::ApiToken.to_string())
                .env("PAGEPAL_API_TOKEN")
                .num_args(1)
                .help("Bearer token for the chat completion endpoint"),
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("PAGEPAL_MODEL")
                .num_args(1)
                .help("Model requested for completions"),
        )
        .arg(
            Arg::new(ConfigKey::Temperature.to_string())
                .long(ConfigKey::Temperature.to_string())
                .num_args(1)
                .help("Sampling temperature sent with each request"),
        )
        .arg(
            Arg::new(ConfigKey::MaxTokens.to_string())
                .long(ConfigKey::MaxTokens.to_string())
                .num_args(1)
                .help("Upper bound on tokens generated per reply"),
        )
        .arg(
            Arg::new(ConfigKey::RequestTimeout.to_string())
                .long(ConfigKey::RequestTimeout.to_string())
                .num_args(1)
                .help("Request timeout in milliseconds"),
        )
        .arg(
            Arg::new(ConfigKey::SourceURL.to_string())
                .long(ConfigKey::SourceURL.to_string())
                .num_args(1)
                .help("URL of the page this conversation is about, stored with the session"),
        )
        .arg(
            Arg::new(ConfigKey::DataDir.to_string())
                .long(ConfigKey::DataDir.to_string())
                .env("PAGEPAL_DATA_DIR")
                .num_args(1)
                .help("Directory holding persisted sessions and settings"),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .short('u')
                .long(ConfigKey::Username.to_string())
                .num_args(1)
                .help("Display name used for your side of the transcript"),
        );
}
