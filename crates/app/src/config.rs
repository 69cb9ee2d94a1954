use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chequera_ocr::{DetectionStrategy, TemplateRegistry};
use serde::Deserialize;

/// Runtime settings. Every path defaults to a location under the data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub unprocessed_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub database: PathBuf,
    pub gazetteer: PathBuf,
    /// TOML file with `[[bank]]` tables replacing the built-in templates.
    pub templates: Option<PathBuf>,
    pub detection: DetectionStrategy,
    pub document_timeout_secs: u64,
}

/// On-disk shape: every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    unprocessed_dir: Option<PathBuf>,
    processed_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    database: Option<PathBuf>,
    gazetteer: Option<PathBuf>,
    templates: Option<PathBuf>,
    detection: Option<DetectionStrategy>,
    document_timeout_secs: Option<u64>,
}

impl Config {
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            unprocessed_dir: data_dir.join("unprocessed"),
            processed_dir: data_dir.join("processed"),
            cache_dir: data_dir.join("cache"),
            database: data_dir.join("ledger.db"),
            gazetteer: data_dir.join("territories.txt"),
            templates: None,
            detection: DetectionStrategy::default(),
            document_timeout_secs: 60,
        }
    }

    /// Values from `content` override the defaults for `data_dir`.
    pub fn from_toml(content: &str, data_dir: &Path) -> anyhow::Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("Invalid configuration")?;
        let defaults = Self::with_data_dir(data_dir);
        Ok(Self {
            unprocessed_dir: file.unprocessed_dir.unwrap_or(defaults.unprocessed_dir),
            processed_dir: file.processed_dir.unwrap_or(defaults.processed_dir),
            cache_dir: file.cache_dir.unwrap_or(defaults.cache_dir),
            database: file.database.unwrap_or(defaults.database),
            gazetteer: file.gazetteer.unwrap_or(defaults.gazetteer),
            templates: file.templates,
            detection: file.detection.unwrap_or(defaults.detection),
            document_timeout_secs: file.document_timeout_secs.unwrap_or(defaults.document_timeout_secs),
        })
    }

    /// Read `explicit` if given, otherwise `config.toml` in the platform
    /// config directory when it exists, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let dirs = project_dirs()?;
        let data_dir = dirs.data_dir();

        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = dirs.config_dir().join("config.toml");
                if !p.exists() {
                    return Ok(Self::with_data_dir(data_dir));
                }
                p
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content, data_dir)
            .with_context(|| format!("Failed to load config {}", path.display()))
    }

    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs.max(1))
    }

    pub fn load_registry(&self) -> anyhow::Result<Arc<TemplateRegistry>> {
        match &self.templates {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read templates {}", path.display()))?;
                let registry = TemplateRegistry::from_toml(&content)
                    .with_context(|| format!("Invalid templates {}", path.display()))?;
                Ok(Arc::new(registry))
            }
            None => Ok(Arc::new(TemplateRegistry::builtin().clone())),
        }
    }
}

fn project_dirs() -> anyhow::Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "chequera", "Chequera")
        .context("Failed to determine the application directories")
}
