use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOURCE_REPO: &str = "projects.registry.vmware.com/tkg";

/// Tool settings read from `~/.config/airgap/config.toml`.
///
/// Every field has a default, so an empty or absent file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    pub source_repo: String,
    pub export_concurrency: usize,
    pub import_concurrency: usize,
    pub imgpkg_bin: String,
    pub timeout_secs: Option<u64>,
    /// Parent directory for resolver scratch space. System temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            source_repo: DEFAULT_SOURCE_REPO.to_owned(),
            export_concurrency: 5,
            import_concurrency: 1,
            imgpkg_bin: "imgpkg".to_owned(),
            timeout_secs: None,
            scratch_dir: None,
        }
    }
}

impl BundleConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the default config file, or defaults when it does not exist.
    pub fn load_default() -> Result<Self, CoreError> {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.export_concurrency == 0 || self.import_concurrency == 0 {
            return Err(CoreError::InvalidConfiguration(
                "concurrency must be at least 1".to_owned(),
            ));
        }
        if self.imgpkg_bin.trim().is_empty() {
            return Err(CoreError::InvalidConfiguration(
                "imgpkg_bin must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn to_toml(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/airgap/config.toml"))
}
