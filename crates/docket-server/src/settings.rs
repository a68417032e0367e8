//! Runtime configuration: a TOML file layered with `DOCKET_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Runtime server configuration, deserialised from `docket.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  #[serde(default = "default_file_dir")]
  pub file_dir:            PathBuf,
  /// HS256 secret for issuing and verifying tokens.
  pub jwt_secret:          String,
  #[serde(default = "default_token_ttl")]
  pub token_ttl_secs:      u64,
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs: u64,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/docket/docket.db") }
fn default_file_dir() -> PathBuf { PathBuf::from("~/.local/share/docket/files") }
fn default_token_ttl() -> u64 { 3600 }
fn default_sweep_interval() -> u64 { 3600 }

impl ServerConfig {
  /// Read `path` (if it exists), then apply `DOCKET_*` overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DOCKET"))
      .build()
      .context("failed to read config file")?;

    let cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    if cfg.jwt_secret.len() < 16 {
      anyhow::bail!("jwt_secret must be at least 16 bytes");
    }
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn file_dir(&self) -> PathBuf { expand_tilde(&self.file_dir) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn write_config(body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("docket-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn file_values_and_defaults() {
    let path = write_config(
      r#"
        port = 9000
        jwt_secret = "0123456789abcdef0123"
        store_path = "/var/lib/docket/docket.db"
      "#,
    );
    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:9000");
    assert_eq!(cfg.store_path(), PathBuf::from("/var/lib/docket/docket.db"));
    assert_eq!(cfg.token_ttl_secs, 3600);
    assert_eq!(cfg.sweep_interval_secs, 3600);
    let _ = std::fs::remove_file(path);
  }

  #[test]
  fn short_secret_is_refused() {
    let path = write_config(r#"jwt_secret = "short""#);
    assert!(ServerConfig::load(&path).is_err());
    let _ = std::fs::remove_file(path);
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x/y")), PathBuf::from(home).join("x/y"));
    assert_eq!(expand_tilde(Path::new("/a/~/b")), PathBuf::from("/a/~/b"));
  }
}
