// Configuration loader
// Loads ~/.hedgebot/config.toml (or an explicit path) with environment fallbacks

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;

/// Default config location: ~/.hedgebot/config.toml
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".hedgebot").join("config.toml"))
}

/// Load configuration from `path` (or the default location), then apply
/// environment fallbacks and validate.
///
/// Returns the config together with the path it was loaded from, so that
/// commands which edit the monitored channel list can write it back.
pub fn load_config(path: Option<&Path>) -> Result<(Config, PathBuf)> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };
    load_with_env(config_path, env_non_empty)
}

fn load_with_env(
    config_path: PathBuf,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(Config, PathBuf)> {
    if !config_path.exists() {
        // Token-only startup is allowed when the environment provides it
        if env("DISCORD_TOKEN").is_some() {
            let mut config = Config::new(String::new(), Vec::new());
            apply_env_fallbacks(&mut config, &env);
            config.validate().context("Configuration validation failed")?;
            return Ok((config, config_path));
        }

        bail!(
            "No configuration found at {}.\n\n\
            Create one with:\n\n\
            hedgebot init --token <DISCORD_TOKEN> --channel <CHANNEL_ID>\n\n\
            Alternatively, set environment variable:\n\
            export DISCORD_TOKEN=\"...\"",
            config_path.display()
        );
    }

    let mut config = read_config_file(&config_path)?;
    apply_env_fallbacks(&mut config, &env);
    config.anchor_data_dir(&config_path);

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok((config, config_path))
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn apply_env_fallbacks(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    if config.discord_token.trim().is_empty() {
        if let Some(token) = env("DISCORD_TOKEN") {
            config.discord_token = token;
            config.env_secrets.discord_token = true;
        }
    }
    if config.openai.api_key.is_none() {
        if let Some(key) = env("OPENAI_API_KEY") {
            config.openai.api_key = Some(key);
            config.env_secrets.openai_api_key = true;
        }
    }
}

/// Write `config` to `path` (pretty TOML), creating the parent directory.
/// Secrets that came from the environment are not written.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let contents = toml::to_string_pretty(&config.without_env_secrets())
        .context("Failed to serialize configuration")?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
    Ok(())
}

/// Create a starter config file. Refuses to overwrite an existing one.
pub fn write_starter_config(path: &Path, token: &str, channel: u64) -> Result<Config> {
    if path.exists() {
        bail!("{} already exists; edit it instead", path.display());
    }
    let config = Config::new(token, vec![channel]);
    config.validate()?;
    save_config(path, &config)?;
    tracing::info!(path = %path.display(), "Configuration file created");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvSecrets;

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
discord_token = "token-123"
channels = [42, 43]
sudo = [7]
data_dir = "store"

[openai]
api_key = "sk-test"
model = "gpt-test"
"#,
        )
        .unwrap();

        let (config, loaded_from) = load_config(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.discord_token, "token-123");
        assert_eq!(config.channels, vec![42, 43]);
        assert!(config.is_sudo(7));
        assert_eq!(config.openai.model, "gpt-test");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.data_dir, dir.path().join("store"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "discord_token = [not toml").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_starter_config_roundtrips_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        write_starter_config(&path, "tok", 99).unwrap();
        let (config, _) = load_config(Some(&path)).unwrap();
        assert_eq!(config.channels, vec![99]);

        assert!(write_starter_config(&path, "tok", 100).is_err());
    }

    fn fake_env(vars: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars.to_vec();
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_env_api_key_is_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "discord_token = \"file-token\"\nchannels = [1]\n").unwrap();

        let env = fake_env(&[("OPENAI_API_KEY", "sk-SECRET-FROM-ENV")]);
        let (mut config, _) = load_with_env(path.clone(), &env).unwrap();
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-SECRET-FROM-ENV"));

        config.add_channel(2);
        save_config(&path, &config).unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("sk-SECRET-FROM-ENV"));
        assert!(saved.contains("file-token"));

        let (reloaded, _) = load_with_env(path, &env).unwrap();
        assert_eq!(reloaded.channels, vec![1, 2]);
        assert_eq!(reloaded.openai.api_key.as_deref(), Some("sk-SECRET-FROM-ENV"));
    }

    #[test]
    fn test_env_token_only_startup_never_writes_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let env = fake_env(&[("DISCORD_TOKEN", "env-token")]);
        let (mut config, loaded_from) = load_with_env(path.clone(), &env).unwrap();
        assert_eq!(config.discord_token, "env-token");

        config.add_channel(5);
        save_config(&loaded_from, &config).unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("env-token"));
        assert!(!saved.contains("discord_token"));

        let (reloaded, _) = load_with_env(path, &env).unwrap();
        assert_eq!(reloaded.discord_token, "env-token");
        assert_eq!(reloaded.channels, vec![5]);
    }

    #[test]
    fn test_file_values_win_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "discord_token = \"file-token\"\n[openai]\napi_key = \"sk-file\"\n").unwrap();

        let env = fake_env(&[("DISCORD_TOKEN", "env-token"), ("OPENAI_API_KEY", "sk-env")]);
        let (config, _) = load_with_env(path, &env).unwrap();
        assert_eq!(config.discord_token, "file-token");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-file"));
        assert_eq!(config.env_secrets, EnvSecrets::default());
    }

    #[test]
    fn test_save_config_persists_channel_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = write_starter_config(&path, "tok", 1).unwrap();

        config.add_channel(2);
        save_config(&path, &config).unwrap();

        let (reloaded, _) = load_config(Some(&path)).unwrap();
        assert_eq!(reloaded.channels, vec![1, 2]);
    }
}
