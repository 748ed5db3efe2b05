#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::Result;
use clap::parser::ValueSource;
use clap::ArgMatches;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Eq, PartialEq, EnumIter, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiToken,
    ConfigFile,
    DataDir,
    EndpointURL,
    MaxTokens,
    Model,
    RequestTimeout,
    SourceURL,
    Temperature,
    Username,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "User".to_string();
            }

            return user;
        }

        let config_path = dirs::config_dir().unwrap().join("pagepal/config.toml");
        let data_path = dirs::data_dir().unwrap().join("pagepal");

        let res = match key {
            ConfigKey::ApiToken => "",
            ConfigKey::EndpointURL => "https://api.openai.com",
            ConfigKey::MaxTokens => "2048",
            ConfigKey::Model => "gpt-4o-mini",
            ConfigKey::RequestTimeout => "120000",
            ConfigKey::SourceURL => "",
            ConfigKey::Temperature => "0.7",

            // Special
            ConfigKey::ConfigFile => config_path.to_str().unwrap(),
            ConfigKey::DataDir => data_path.to_str().unwrap(),
            ConfigKey::Username => "",
        };

        return res.to_string();
    }

    /// Serializes the defaults as a config file template.
    pub fn serialize_default() -> String {
        let mut doc = toml_edit::Document::new();
        for key in ConfigKey::iter() {
            if key == ConfigKey::ConfigFile {
                continue;
            }
            doc[&key.to_string()] = toml_edit::value(Config::default(key));
        }

        return doc.to_string();
    }

    /// Loads configuration in precedence order: defaults, then the config
    /// file, then command line flags and environment variables.
    pub async fn load(matches: &ArgMatches) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key));
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        if let Some(arg_config_file) = matches.get_one::<String>(&ConfigKey::ConfigFile.to_string())
        {
            config_file = arg_config_file.to_string();
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_float) = val.as_float() {
                        Config::set(key, &val_float.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            let id = key.to_string();
            if let Some(source) = matches.value_source(&id) {
                if source == ValueSource::DefaultValue {
                    continue;
                }
                if let Some(val) = matches.get_one::<String>(&id) {
                    Config::set(key, val);
                }
            }
        }

        return Ok(());
    }
}
