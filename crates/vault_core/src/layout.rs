//! Project layout and settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::state::METADATA_DIR;

/// Settings file inside the config directory.
pub const SETTINGS_FILE: &str = "vault.toml";

/// Well-known directories of a VAULT project.
///
/// ```text
/// <root>/labs/<provider>/<lab>/
/// <root>/.state/
/// <root>/.state/.metadata/
/// <root>/config/common-<provider>.tfvars
/// <root>/config/vault.toml
/// ```
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn labs_dir(&self) -> PathBuf {
        self.root.join("labs")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".state")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.state_dir().join(METADATA_DIR)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir().join(SETTINGS_FILE)
    }

    /// Create the state and config directories.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        fs::create_dir_all(self.state_dir())?;
        fs::create_dir_all(self.config_dir())?;
        Ok(())
    }

    /// Load `config/vault.toml`, or defaults when it does not exist.
    pub fn load_settings(&self) -> CoreResult<VaultSettings> {
        VaultSettings::load(&self.settings_path())
    }
}

/// Operator settings from `config/vault.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// IaC binary to invoke
    pub terraform_binary: String,
    /// Name recorded in metadata; `$USER` when unset
    pub operator: Option<String>,
    /// Echo apply/destroy output while it runs
    pub stream_output: bool,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            terraform_binary: "terraform".to_string(),
            operator: None,
            stream_output: true,
        }
    }
}

impl VaultSettings {
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        if settings.terraform_binary.trim().is_empty() {
            return Err(CoreError::InvalidSettings(
                "terraform_binary must not be empty".to_string(),
            ));
        }
        Ok(settings)
    }

    /// Operator name for metadata records.
    pub fn operator(&self) -> String {
        self.operator
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_paths() {
        let layout = ProjectLayout::new("/srv/vault");
        assert_eq!(layout.labs_dir(), PathBuf::from("/srv/vault/labs"));
        assert_eq!(layout.metadata_dir(), PathBuf::from("/srv/vault/.state/.metadata"));
        assert_eq!(layout.settings_path(), PathBuf::from("/srv/vault/config/vault.toml"));
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let temp = tempdir().unwrap();
        let layout = ProjectLayout::new(temp.path());
        layout.ensure_dirs().unwrap();
        assert!(layout.state_dir().is_dir());

        assert_eq!(layout.load_settings().unwrap(), VaultSettings::default());

        fs::write(
            layout.settings_path(),
            "terraform_binary = \"tofu\"\noperator = \"alice\"\n",
        )
        .unwrap();
        let settings = layout.load_settings().unwrap();
        assert_eq!(settings.terraform_binary, "tofu");
        assert_eq!(settings.operator(), "alice");
        assert!(settings.stream_output);
    }

    #[test]
    fn test_invalid_settings() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(SETTINGS_FILE);

        fs::write(&path, "terraform_binary = \"\"\n").unwrap();
        assert!(matches!(VaultSettings::load(&path), Err(CoreError::InvalidSettings(_))));

        fs::write(&path, "stream_output = \"yes\"\n").unwrap();
        assert!(matches!(VaultSettings::load(&path), Err(CoreError::Toml(_))));
    }
}
