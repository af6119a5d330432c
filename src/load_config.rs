/// `load_config` module: loads the optional YAML config file and applies
/// environment overrides on top of it.
///
/// # Responsibilities
/// - Parse a user-supplied YAML file into [`CliConfig`]; every key is optional
/// - Fall back to built-in defaults when no file is given
/// - Let `IOFXML_BASE_URL` override the remote endpoint
///
/// # Errors
/// All errors use `anyhow::Error` and name the offending path; they surface at
/// the CLI boundary before any network or file activity begins.
///
/// Accepted shape:
///
/// ```yaml
/// remote:
///   base_url: "http://loggator2.worldofo.com/winsplits.php"
///   referer: "http://loggator2.worldofo.com"
/// download:
///   output_dir: ./results
/// ```
use anyhow::Result;
use iofxml_core::catalog::RemoteConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const BASE_URL_ENV: &str = "IOFXML_BASE_URL";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub remote: RemoteConfig,
    pub download: DownloadSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DownloadSection {
    pub output_dir: PathBuf,
}

impl Default for DownloadSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

/// Load the config file at `path` (or defaults when `None`), then apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => {
            info!("No config file given, using defaults");
            CliConfig::default()
        }
    };

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
        info!(base_url = %base_url, "Overriding remote base URL from environment");
        config.remote.base_url = base_url;
    }

    info!(
        base_url = %config.remote.base_url,
        output_dir = %config.download.output_dir.display(),
        "Config loaded"
    );
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<CliConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    if content.trim().is_empty() {
        return Ok(CliConfig::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(config) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML {:?}: {e}", path))
        }
    }
}
