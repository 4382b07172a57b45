mod identifiers;

pub use identifiers::IdentifiersFile;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use directories::BaseDirs;

use crate::components::{FeedConfig, PullRefreshConfig};
use crate::error::{ForkfulError, Result};
use crate::ids::IdentifierMapper;
use crate::visibility::VisibilityThreshold;

pub const CONFIG_DIR: &str = "forkful";
const MAIN_CONFIG_FILE: &str = "config.toml";
const IDENTIFIERS_FILE: &str = "identifiers.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[derive(Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub visibility: VisibilityConfig,
    pub refresh: PullRefreshConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub threshold: VisibilityThreshold,
}

/// Something noticed while loading, held until logging is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadDiagnostic {
    Info(String),
    Warning(String),
}

pub struct ConfigManager {
    config_dir: PathBuf,
    app_config: AppConfig,
    identifiers: IdentifierMapper,
    diagnostics: Vec<LoadDiagnostic>,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::load_from(config_dir))
    }

    /// Load from a directory the user named explicitly; it must exist.
    pub fn open(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        if !config_dir.is_dir() {
            return Err(ForkfulError::ConfigNotFound { path: config_dir });
        }
        Ok(Self::load_from(config_dir))
    }

    /// Load from a directory. Missing or broken files fall back to defaults.
    pub fn load_from(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let mut diagnostics = Vec::new();
        let app_config = Self::load_app_config(&config_dir, &mut diagnostics);
        let identifiers = Self::load_identifiers(&config_dir, &mut diagnostics);

        Self {
            config_dir,
            app_config,
            identifiers,
            diagnostics,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn app_config(&self) -> &AppConfig {
        &self.app_config
    }

    pub fn identifiers(&self) -> &IdentifierMapper {
        &self.identifiers
    }

    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    /// Emit what loading noticed. Call once the subscriber is installed.
    pub fn log_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            match diagnostic {
                LoadDiagnostic::Info(message) => tracing::info!("{}", message),
                LoadDiagnostic::Warning(message) => tracing::warn!("{}", message),
            }
        }
    }

    fn get_config_dir() -> Result<PathBuf> {
        BaseDirs::new()
            .map(|dirs| dirs.config_dir().join(CONFIG_DIR))
            .ok_or_else(|| ForkfulError::Config("Could not determine config directory".to_string()))
    }

    fn load_app_config(config_dir: &Path, diagnostics: &mut Vec<LoadDiagnostic>) -> AppConfig {
        let path = config_dir.join(MAIN_CONFIG_FILE);
        let config: AppConfig = Self::load_toml_file(&path, diagnostics).unwrap_or_default();
        if let Err(e) = config.refresh.validate() {
            diagnostics.push(LoadDiagnostic::Warning(format!(
                "Ignoring [refresh] in {}: {}",
                path.display(),
                e
            )));
            return AppConfig {
                refresh: PullRefreshConfig::default(),
                ..config
            };
        }
        config
    }

    fn load_identifiers(config_dir: &Path, diagnostics: &mut Vec<LoadDiagnostic>) -> IdentifierMapper {
        let path = config_dir.join(IDENTIFIERS_FILE);
        let Some(file) = Self::load_toml_file::<IdentifiersFile>(&path, diagnostics) else {
            return IdentifierMapper::builtin();
        };
        match file.into_mapper() {
            Ok(mapper) => {
                diagnostics.push(LoadDiagnostic::Info(format!(
                    "Loaded {} identifier pairs (built-in + {})",
                    mapper.len(),
                    path.display()
                )));
                mapper
            }
            Err(e) => {
                diagnostics.push(LoadDiagnostic::Warning(format!("Ignoring {}: {}", path.display(), e)));
                IdentifierMapper::builtin()
            }
        }
    }

    fn load_toml_file<T: for<'de> Deserialize<'de> + Default>(
        path: &Path,
        diagnostics: &mut Vec<LoadDiagnostic>,
    ) -> Option<T> {
        if !path.exists() {
            return None;
        }

        let failure = match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return Some(config),
                Err(e) => format!("Failed to parse {}: {}", path.display(), e),
            },
            Err(e) => format!("Failed to read {}: {}", path.display(), e),
        };
        diagnostics.push(LoadDiagnostic::Warning(failure));
        None
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)
                .map_err(|e| ForkfulError::Config(format!("Failed to create config dir: {}", e)))?;
        }
        Ok(())
    }

    pub fn write_default_configs(&self) -> Result<()> {
        self.ensure_config_dir()?;

        let main_path = self.config_dir.join(MAIN_CONFIG_FILE);
        if !main_path.exists() {
            let content = toml::to_string_pretty(&AppConfig::default())
                .map_err(|e| ForkfulError::Config(format!("Failed to serialize config: {}", e)))?;
            std::fs::write(&main_path, content)
                .map_err(|e| ForkfulError::Config(format!("Failed to write config: {}", e)))?;
        }

        Ok(())
    }
}
