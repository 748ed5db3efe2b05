use std::io::Write;

use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_defaults_to_valid_toml() {
    let res = Config::serialize_default();
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());
}

#[tokio::test]
async fn it_loads_config_with_file_and_flag_precedence() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "endpoint-url = \"http://localhost:8080\"")?;
    writeln!(file, "model = \"from-file\"")?;
    writeln!(file, "max-tokens = 1024")?;
    writeln!(file, "temperature = 0.2")?;

    let config_path = file.path().to_str().unwrap().to_string();
    let matches = cli::build().try_get_matches_from(vec![
        "pagepal",
        "-c",
        &config_path,
        "--model",
        "from-flag",
    ])?;
    Config::load(&matches).await?;

    // File values land, flags win over the file.
    assert_eq!(Config::get(ConfigKey::EndpointURL), "http://localhost:8080");
    assert_eq!(Config::get(ConfigKey::MaxTokens), "1024");
    assert_eq!(Config::get(ConfigKey::Temperature), "0.2");
    assert_eq!(Config::get(ConfigKey::Model), "from-flag");

    // A malformed file fails the load outright. Kept in the same test since
    // the config map is process-global.
    let mut bad_file = tempfile::NamedTempFile::new()?;
    writeln!(bad_file, "model = [unclosed")?;

    let bad_path = bad_file.path().to_str().unwrap().to_string();
    let matches = cli::build().try_get_matches_from(vec!["pagepal", "-c", &bad_path])?;
    let res = Config::load(&matches).await;
    assert!(res.is_err());

    return Ok(());
}
