//! Integration tests for lab discovery and state tracking.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tempfile::tempdir;
use vault_core::discovery::DEFAULT_MIN_SCORE;
use vault_core::{
    CloudProvider, DeploymentStatus, DifficultyLevel, Lab, LabAction, LabDiscovery,
    ProjectLayout, StateManager,
};

fn make_lab(labs_dir: &Path, provider: &str, name: &str, readme: Option<&str>) -> PathBuf {
    let dir = labs_dir.join(provider).join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("main.tf"), "resource \"null_resource\" \"x\" {}\n").unwrap();
    if let Some(readme) = readme {
        fs::write(dir.join("README.md"), readme).unwrap();
    }
    dir
}

fn write_state(state: &StateManager, lab: &Lab, json: &str) {
    let path = state.tfstate_path(lab);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, json).unwrap();
}

fn aws_lab(name: &str) -> Lab {
    Lab::new(name, format!("/labs/aws/{}", name), CloudProvider::Aws)
}

#[test]
fn test_discover_is_cached_until_forced() {
    let temp = tempdir().unwrap();
    let labs_dir = temp.path().join("labs");
    make_lab(&labs_dir, "aws", "ssrf-metadata", None);
    make_lab(&labs_dir, "azure", "keyvault-dump", None);

    let mut discovery = LabDiscovery::new(&labs_dir);
    let first: Vec<String> = discovery.discover(false).iter().map(|l| l.relative_path()).collect();
    assert_eq!(first, vec!["aws/ssrf-metadata", "azure/keyvault-dump"]);

    make_lab(&labs_dir, "aws", "iam-privesc", None);

    let second: Vec<String> = discovery.discover(false).iter().map(|l| l.relative_path()).collect();
    assert_eq!(first, second);
    assert!(discovery.get_by_path("iam-privesc").is_none());

    let refreshed: Vec<String> = discovery.discover(true).iter().map(|l| l.relative_path()).collect();
    assert_eq!(
        refreshed,
        vec!["aws/iam-privesc", "aws/ssrf-metadata", "azure/keyvault-dump"]
    );
}

#[test]
fn test_readme_enrichment_is_optional() {
    let temp = tempdir().unwrap();
    let labs_dir = temp.path().join("labs");
    make_lab(
        &labs_dir,
        "aws",
        "ssrf-metadata",
        Some("# SSRF\n\nDifficulty: **5/10**\n\nEstimated Time: 30 minutes\n"),
    );
    make_lab(&labs_dir, "aws", "no-readme", None);
    let garbage = make_lab(&labs_dir, "gcp", "binary-readme", None);
    fs::write(garbage.join("README.md"), [0xff_u8, 0xfe, 0x00, 0x41]).unwrap();

    let mut discovery = LabDiscovery::new(&labs_dir);
    let labs = discovery.discover(false).to_vec();
    assert_eq!(labs.len(), 3);

    let ssrf = labs.iter().find(|l| l.name == "ssrf-metadata").unwrap();
    assert_eq!(ssrf.difficulty.level(), DifficultyLevel::Hard);
    assert_eq!(ssrf.estimated_time, "30 minutes");
    assert!(ssrf.description.is_empty());

    let plain = labs.iter().find(|l| l.name == "no-readme").unwrap();
    assert!(plain.difficulty.is_unknown());
    assert!(plain.learning_objectives.is_empty());

    assert!(labs.iter().any(|l| l.name == "binary-readme"));
}

#[test]
fn test_search_ranks_relevant_lab_first() {
    let temp = tempdir().unwrap();
    let labs_dir = temp.path().join("labs");
    make_lab(
        &labs_dir,
        "aws",
        "ssrf-metadata",
        Some("Difficulty: **4/10**\n\nDescription: Server-side request forgery against instance metadata\n\n"),
    );
    make_lab(
        &labs_dir,
        "aws",
        "lambda-secrets-exposure",
        Some("Difficulty: **7/10**\n\nDescription: Secrets leaked through function configuration\n\n"),
    );

    let mut discovery = LabDiscovery::new(&labs_dir);

    let results = discovery.search("ssrf", None, None, DEFAULT_MIN_SCORE);
    assert!(!results.is_empty());
    assert_eq!(results[0].lab.name, "ssrf-metadata");
    assert!(results[0].matched_fields.contains(&"name".to_string()));
    if let Some(pos) = results.iter().position(|r| r.lab.name == "lambda-secrets-exposure") {
        assert!(pos > 0);
    }

    assert!(discovery
        .search("nonexistent-xyz", None, None, DEFAULT_MIN_SCORE)
        .is_empty());

    let by_path = discovery.search("aws/lambda", None, None, DEFAULT_MIN_SCORE);
    assert_eq!(by_path[0].lab.name, "lambda-secrets-exposure");
    assert_eq!(by_path[0].score, 90.0);

    let hard = discovery.search("", None, Some(DifficultyLevel::VeryHard), DEFAULT_MIN_SCORE);
    assert_eq!(hard.len(), 1);
    assert_eq!(hard[0].lab.name, "lambda-secrets-exposure");

    assert!(discovery
        .search("ssrf", Some(CloudProvider::Gcp), None, DEFAULT_MIN_SCORE)
        .is_empty());
}

#[test]
fn test_status_derivation_from_state_shape() {
    let temp = tempdir().unwrap();
    let state = StateManager::new(temp.path()).unwrap();

    let empty = aws_lab("empty");
    write_state(&state, &empty, r#"{"version": 4, "resources": []}"#);
    assert!(!state.is_deployed(&empty));
    assert_eq!(state.deployment_status(&empty), DeploymentStatus::NotDeployed);

    let healthy = aws_lab("healthy");
    write_state(
        &state,
        &healthy,
        r#"{"resources": [{"type": "aws_instance", "name": "web"}, {"type": "aws_s3_bucket", "name": "data", "status": "ok"}]}"#,
    );
    assert!(state.is_deployed(&healthy));
    assert_eq!(state.deployment_status(&healthy), DeploymentStatus::Deployed);
    assert_eq!(state.resource_count(&healthy), 2);

    let broken = aws_lab("broken");
    write_state(
        &state,
        &broken,
        r#"{"resources": [{"type": "aws_instance", "name": "web"}, {"type": "aws_iam_role", "name": "r", "status": "error"}]}"#,
    );
    assert!(state.is_deployed(&broken));
    assert_eq!(state.deployment_status(&broken), DeploymentStatus::Error);

    let missing = aws_lab("missing");
    assert_eq!(state.deployment_status(&missing), DeploymentStatus::NotDeployed);
    assert_eq!(state.resource_count(&missing), 0);
}

#[test]
fn test_metadata_round_trip_captures_count_at_save_time() {
    let temp = tempdir().unwrap();
    let state = StateManager::new(temp.path()).unwrap();
    let lab = aws_lab("iam-privesc");

    write_state(&state, &lab, r#"{"resources": [{}, {}, {}]}"#);
    let saved = state
        .save_metadata(&lab, LabAction::Deployed, "alice", "us-east-1")
        .unwrap();
    assert_eq!(saved.resources_count, 3);
    assert!(temp.path().join(".metadata").join("aws_iam-privesc.json").exists());

    write_state(&state, &lab, r#"{"resources": [{}]}"#);
    let loaded = state.load_metadata(&lab).unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.lab_name, "aws/iam-privesc");
    assert_eq!(loaded.csp, CloudProvider::Aws);
    assert_eq!(loaded.resources_count, 3);

    let leftovers: Vec<_> = fs::read_dir(state.metadata_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(true, |ext| ext != "json"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_active_deployments_require_live_resources() {
    let temp = tempdir().unwrap();
    let state = StateManager::new(temp.path()).unwrap();

    let older = aws_lab("older");
    write_state(&state, &older, r#"{"resources": [{}]}"#);
    state.save_metadata(&older, LabAction::Deployed, "alice", "us-east-1").unwrap();

    thread::sleep(Duration::from_millis(20));

    let newer = Lab::new("bucket-leak", "/labs/gcp/bucket-leak", CloudProvider::Gcp);
    write_state(&state, &newer, r#"{"resources": [{}, {}]}"#);
    state.save_metadata(&newer, LabAction::Deployed, "bob", "us-east4").unwrap();

    let emptied = aws_lab("emptied");
    write_state(&state, &emptied, r#"{"resources": [{}]}"#);
    state.save_metadata(&emptied, LabAction::Deployed, "alice", "us-east-1").unwrap();
    write_state(&state, &emptied, r#"{"resources": []}"#);

    let orphaned = aws_lab("orphaned");
    write_state(&state, &orphaned, r#"{"resources": [{}]}"#);
    state.save_metadata(&orphaned, LabAction::Deployed, "alice", "us-east-1").unwrap();
    fs::remove_dir_all(state.state_path(&orphaned)).unwrap();

    let active = state.active_deployments();
    let paths: Vec<&str> = active.iter().map(|(path, _)| path.as_str()).collect();
    assert_eq!(paths, vec!["gcp/bucket-leak", "aws/older"]);
    assert_eq!(active[0].1.deployed_by, "bob");
}

#[test]
fn test_cleanup_counts_each_empty_state() {
    let temp = tempdir().unwrap();
    let state = StateManager::new(temp.path()).unwrap();

    let first = aws_lab("first");
    let second = aws_lab("second");
    let live = aws_lab("live");
    write_state(&state, &first, r#"{"resources": []}"#);
    write_state(&state, &second, r#"{"resources": []}"#);
    write_state(&state, &live, r#"{"resources": [{}]}"#);
    state.save_metadata(&first, LabAction::Destroyed, "alice", "us-east-1").unwrap();

    assert_eq!(state.cleanup_empty_states(), 2);
    assert!(!state.state_path(&first).exists());
    assert!(!state.state_path(&second).exists());
    assert!(state.tfstate_path(&live).exists());
    assert!(state.metadata_path(&first).exists());

    assert_eq!(state.cleanup_empty_states(), 0);
}

#[test]
fn test_layout_matches_on_disk_contract() {
    let temp = tempdir().unwrap();
    let layout = ProjectLayout::new(temp.path());
    layout.ensure_dirs().unwrap();

    let labs_dir = layout.labs_dir();
    make_lab(&labs_dir, "aws", "iam-privesc", None);

    let mut discovery = LabDiscovery::new(layout.labs_dir());
    let lab = discovery.get_by_path("aws/iam-privesc").unwrap().clone();
    let state = StateManager::new(layout.state_dir()).unwrap();

    assert_eq!(
        state.tfstate_path(&lab),
        temp.path().join(".state/aws_iam-privesc/terraform.tfstate")
    );
    assert_eq!(
        state.metadata_path(&lab),
        temp.path().join(".state/.metadata/aws_iam-privesc.json")
    );
}
