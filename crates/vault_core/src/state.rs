//! Deployment state tracking.
//!
//! Terraform owns the per-lab state file; this module only reads it. The
//! metadata sidecar is ours and records who last acted on a lab and when.
//!
//! On-disk layout:
//! ```text
//! .state/
//! ├── <provider>_<lab>/terraform.tfstate   # written by terraform
//! └── .metadata/<provider>_<lab>.json      # LabMetadata sidecar
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::CoreResult;
use crate::lab::{DeploymentStatus, Lab, LabAction, LabMetadata};

/// State file name inside each lab's state directory.
pub const TFSTATE_FILE: &str = "terraform.tfstate";
/// Metadata directory name inside the state directory.
pub const METADATA_DIR: &str = ".metadata";
#[cfg(unix)]
const METADATA_MODE: u32 = 0o644;

/// The parts of a Terraform state file this crate reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outputs: BTreeMap<String, serde_json::Value>,
}

/// An explicit `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl StateFile {
    fn read(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("Treating unreadable state file {:?} as absent: {}", path, e);
                None
            }
        }
    }

    /// Whether any resource carries `"status": "error"`.
    pub fn has_errors(&self) -> bool {
        self.resources
            .iter()
            .any(|r| r.get("status").and_then(|s| s.as_str()) == Some("error"))
    }
}

/// Convert a state key back to `<provider>/<name>`.
///
/// Provider names never contain `_`, so only the first one separates them.
pub fn lab_path_from_key(key: &str) -> String {
    match key.split_once('_') {
        Some((provider, name)) => format!("{}/{}", provider, name),
        None => key.to_string(),
    }
}

/// Reads Terraform state and manages metadata sidecars.
#[derive(Debug, Clone)]
pub struct StateManager {
    state_dir: PathBuf,
    metadata_dir: PathBuf,
}

impl StateManager {
    /// Create a state manager, creating the metadata directory if needed.
    pub fn new(state_dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let state_dir = state_dir.into();
        let metadata_dir = state_dir.join(METADATA_DIR);
        fs::create_dir_all(&metadata_dir)?;
        Ok(Self {
            state_dir,
            metadata_dir,
        })
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn metadata_dir(&self) -> &Path {
        &self.metadata_dir
    }

    /// Per-lab state directory, `.state/<provider>_<name>`.
    pub fn state_path(&self, lab: &Lab) -> PathBuf {
        self.state_dir.join(lab.state_key())
    }

    pub fn tfstate_path(&self, lab: &Lab) -> PathBuf {
        self.state_path(lab).join(TFSTATE_FILE)
    }

    pub fn metadata_path(&self, lab: &Lab) -> PathBuf {
        self.metadata_dir.join(format!("{}.json", lab.state_key()))
    }

    /// Parsed state file, or `None` when missing or corrupt.
    pub fn load_state(&self, lab: &Lab) -> Option<StateFile> {
        StateFile::read(&self.tfstate_path(lab))
    }

    /// True when the state file exists, parses, and lists at least one resource.
    pub fn is_deployed(&self, lab: &Lab) -> bool {
        self.load_state(lab)
            .map(|state| !state.resources.is_empty())
            .unwrap_or(false)
    }

    pub fn deployment_status(&self, lab: &Lab) -> DeploymentStatus {
        match self.load_state(lab) {
            Some(state) if !state.resources.is_empty() => {
                if state.has_errors() {
                    DeploymentStatus::Error
                } else {
                    DeploymentStatus::Deployed
                }
            }
            _ => DeploymentStatus::NotDeployed,
        }
    }

    pub fn resource_count(&self, lab: &Lab) -> usize {
        self.load_state(lab)
            .map(|state| state.resources.len())
            .unwrap_or(0)
    }

    /// Record an action, capturing the current resource count.
    ///
    /// The sidecar is written to a temporary file and renamed into place so a
    /// reader never sees a partial document.
    pub fn save_metadata(
        &self,
        lab: &Lab,
        action: LabAction,
        deployed_by: &str,
        region: &str,
    ) -> CoreResult<LabMetadata> {
        let metadata = LabMetadata {
            lab_name: lab.relative_path(),
            csp: lab.provider,
            last_action: action,
            timestamp: Utc::now().naive_utc(),
            deployed_by: deployed_by.to_string(),
            region: region.to_string(),
            resources_count: self.resource_count(lab),
        };

        fs::create_dir_all(&self.metadata_dir)?;
        let mut file = NamedTempFile::new_in(&self.metadata_dir)?;
        file.write_all(serde_json::to_string_pretty(&metadata)?.as_bytes())?;
        file.flush()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Temp files are created 0600; sidecars are shared with other tooling
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(METADATA_MODE))?;
        }
        file.persist(self.metadata_path(lab)).map_err(|e| e.error)?;

        info!(
            "Recorded {} for {} ({} resources)",
            action, metadata.lab_name, metadata.resources_count
        );
        Ok(metadata)
    }

    /// Load the sidecar, or `None` when missing or corrupt.
    pub fn load_metadata(&self, lab: &Lab) -> Option<LabMetadata> {
        read_metadata(&self.metadata_path(lab))
    }

    /// Labs whose sidecar is backed by a state file with live resources,
    /// most recent first.
    pub fn active_deployments(&self) -> Vec<(String, LabMetadata)> {
        let entries = match fs::read_dir(&self.metadata_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read metadata directory {:?}: {}", self.metadata_dir, e);
                return Vec::new();
            }
        };

        let mut active: Vec<(String, LabMetadata)> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                let key = path.file_stem()?.to_string_lossy().into_owned();
                let metadata = read_metadata(&path)?;
                let state = StateFile::read(&self.state_dir.join(&key).join(TFSTATE_FILE));
                match state {
                    Some(state) if !state.resources.is_empty() => {
                        Some((lab_path_from_key(&key), metadata))
                    }
                    _ => {
                        debug!("Metadata for {} has no live resources", key);
                        None
                    }
                }
            })
            .collect();

        active.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        active
    }

    /// Remove state files with an empty resource list, and their directory
    /// when nothing else is left in it. Returns the number of state files removed.
    pub fn cleanup_empty_states(&self) -> usize {
        let entries = match fs::read_dir(&self.state_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read state directory {:?}: {}", self.state_dir, e);
                return 0;
            }
        };

        let mut cleaned = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let dir = entry.path();
            if entry.file_name() == METADATA_DIR || !dir.is_dir() {
                continue;
            }

            let tfstate = dir.join(TFSTATE_FILE);
            let Some(state) = StateFile::read(&tfstate) else {
                continue;
            };
            if !state.resources.is_empty() {
                continue;
            }

            if let Err(e) = fs::remove_file(&tfstate) {
                warn!("Failed to remove {:?}: {}", tfstate, e);
                continue;
            }
            cleaned += 1;

            let is_empty = fs::read_dir(&dir)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if is_empty {
                if let Err(e) = fs::remove_dir(&dir) {
                    warn!("Failed to remove {:?}: {}", dir, e);
                }
            }
            debug!("Cleaned empty state in {:?}", dir);
        }

        cleaned
    }
}

fn read_metadata(path: &Path) -> Option<LabMetadata> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!("Ignoring corrupt metadata {:?}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::CloudProvider;
    use tempfile::tempdir;

    fn write_state(manager: &StateManager, lab: &Lab, content: &str) {
        let path = manager.tfstate_path(lab);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_paths_use_state_key() {
        let temp = tempdir().unwrap();
        let manager = StateManager::new(temp.path()).unwrap();
        let lab = Lab::new("iam-privesc", "/labs/aws/iam-privesc", CloudProvider::Aws);

        assert!(temp.path().join(".metadata").is_dir());
        assert_eq!(manager.state_path(&lab), temp.path().join("aws_iam-privesc"));
        assert_eq!(
            manager.tfstate_path(&lab),
            temp.path().join("aws_iam-privesc").join("terraform.tfstate")
        );
        assert_eq!(
            manager.metadata_path(&lab),
            temp.path().join(".metadata").join("aws_iam-privesc.json")
        );
    }

    #[test]
    fn test_corrupt_state_is_not_deployed() {
        let temp = tempdir().unwrap();
        let manager = StateManager::new(temp.path()).unwrap();
        let lab = Lab::new("broken", "/labs/aws/broken", CloudProvider::Aws);

        assert!(!manager.is_deployed(&lab));
        write_state(&manager, &lab, "{ not json");
        assert!(!manager.is_deployed(&lab));
        assert_eq!(manager.deployment_status(&lab), DeploymentStatus::NotDeployed);
        assert_eq!(manager.resource_count(&lab), 0);

        write_state(&manager, &lab, r#"{"version": 4}"#);
        assert_eq!(manager.deployment_status(&lab), DeploymentStatus::NotDeployed);
    }

    #[test]
    fn test_corrupt_metadata_loads_as_none() {
        let temp = tempdir().unwrap();
        let manager = StateManager::new(temp.path()).unwrap();
        let lab = Lab::new("demo", "/labs/gcp/demo", CloudProvider::Gcp);

        assert!(manager.load_metadata(&lab).is_none());
        fs::write(manager.metadata_path(&lab), "{\"lab_name\": 3").unwrap();
        assert!(manager.load_metadata(&lab).is_none());
    }

    #[test]
    fn test_null_sections_read_as_empty() {
        let temp = tempdir().unwrap();
        let manager = StateManager::new(temp.path()).unwrap();
        let lab = Lab::new("demo", "/labs/aws/demo", CloudProvider::Aws);

        write_state(&manager, &lab, r#"{"resources": [{}, {}], "outputs": null}"#);
        assert_eq!(manager.deployment_status(&lab), DeploymentStatus::Deployed);
        assert_eq!(manager.resource_count(&lab), 2);
        assert!(manager.load_state(&lab).unwrap().outputs.is_empty());

        write_state(&manager, &lab, r#"{"resources": null, "outputs": {}}"#);
        assert_eq!(manager.deployment_status(&lab), DeploymentStatus::NotDeployed);
    }

    #[cfg(unix)]
    #[test]
    fn test_metadata_sidecar_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let manager = StateManager::new(temp.path()).unwrap();
        let lab = Lab::new("demo", "/labs/aws/demo", CloudProvider::Aws);

        manager
            .save_metadata(&lab, LabAction::Deployed, "alice", "us-east-1")
            .unwrap();
        let mode = fs::metadata(manager.metadata_path(&lab))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_lab_path_from_key() {
        assert_eq!(lab_path_from_key("aws_iam-privesc"), "aws/iam-privesc");
        assert_eq!(lab_path_from_key("gcp_bucket_leak"), "gcp/bucket_leak");
        assert_eq!(lab_path_from_key("orphan"), "orphan");
    }

    #[test]
    fn test_cleanup_keeps_directories_with_other_artifacts() {
        let temp = tempdir().unwrap();
        let manager = StateManager::new(temp.path()).unwrap();
        let lab = Lab::new("demo", "/labs/aws/demo", CloudProvider::Aws);

        write_state(&manager, &lab, r#"{"resources": []}"#);
        fs::write(manager.state_path(&lab).join("terraform.tfstate.backup"), "{}").unwrap();

        assert_eq!(manager.cleanup_empty_states(), 1);
        assert!(!manager.tfstate_path(&lab).exists());
        assert!(manager.state_path(&lab).is_dir());
        assert!(manager.metadata_dir().is_dir());
    }
}
