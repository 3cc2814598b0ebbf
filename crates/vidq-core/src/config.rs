//! User configuration in `~/.config/vidq/config.toml`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::filename::{DEFAULT_MAX_FILE_NAME_LEN, MAX_FILE_NAME_LEN_LIMIT};
use crate::registry::RegistrySettings;

/// Which media source to use and where its manifests come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Shown in "could not find requested stream in <name>" failures.
    #[serde(default = "default_source_name")]
    pub name: String,
    /// Manifest URL template; `{id}` is replaced by the media id.
    #[serde(default)]
    pub manifest_url: Option<String>,
}

fn default_source_name() -> String {
    "remote".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: default_source_name(),
            manifest_url: None,
        }
    }
}

/// Global configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VidqConfig {
    /// Root directory for downloaded files.
    pub download_dir: PathBuf,
    /// Schedule database file; unset means `~/.local/state/vidq/schedule.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Longest file name written, extension included.
    #[serde(default = "default_max_file_name_len")]
    pub max_file_name_len: usize,
    /// Cap on transfers running at once (None = no cap).
    #[serde(default)]
    pub max_concurrent_downloads: Option<usize>,
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_max_file_name_len() -> usize {
    DEFAULT_MAX_FILE_NAME_LEN
}

impl Default for VidqConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            database_path: None,
            max_file_name_len: DEFAULT_MAX_FILE_NAME_LEN,
            max_concurrent_downloads: None,
            source: SourceConfig::default(),
        }
    }
}

/// `$HOME/Downloads/vidq`, or the XDG data dir when `$HOME` is unset.
fn default_download_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME").filter(|h| !h.is_empty()) {
        return PathBuf::from(home).join("Downloads").join("vidq");
    }
    xdg::BaseDirectories::with_prefix("vidq")
        .map(|d| d.get_data_home().join("downloads"))
        .unwrap_or_else(|_| PathBuf::from("vidq-downloads"))
}

impl VidqConfig {
    pub fn validate(&self) -> Result<()> {
        if self.download_dir.as_os_str().is_empty() {
            anyhow::bail!("download_dir must not be empty");
        }
        if !(1..=MAX_FILE_NAME_LEN_LIMIT).contains(&self.max_file_name_len) {
            anyhow::bail!(
                "max_file_name_len is {}, expected 1..={MAX_FILE_NAME_LEN_LIMIT}",
                self.max_file_name_len
            );
        }
        if self.max_concurrent_downloads == Some(0) {
            anyhow::bail!("max_concurrent_downloads must be at least 1 when set");
        }
        if self.source.name.trim().is_empty() {
            anyhow::bail!("source.name must not be blank");
        }
        if let Some(url) = &self.source.manifest_url {
            if !url.contains("{id}") {
                anyhow::bail!("source.manifest_url must contain {{id}}");
            }
        }
        Ok(())
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            download_root: self.download_dir.clone(),
            max_file_name_len: self.max_file_name_len,
            max_concurrent_downloads: self.max_concurrent_downloads,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vidq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VidqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VidqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: VidqConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
