//! Lab catalog model.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Root Terraform definition file every lab must contain.
pub const ROOT_DEFINITION: &str = "main.tf";

/// Cloud provider a lab targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
    Unknown,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Azure => "azure",
            CloudProvider::Gcp => "gcp",
            CloudProvider::Unknown => "unknown",
        }
    }

    /// Parse user input, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "aws" => Some(CloudProvider::Aws),
            "azure" => Some(CloudProvider::Azure),
            "gcp" => Some(CloudProvider::Gcp),
            "unknown" => Some(CloudProvider::Unknown),
            _ => None,
        }
    }

    /// Map a directory under `labs/` to a provider.
    ///
    /// Matching is exact so that two spellings of one provider can never yield
    /// colliding state keys. `unknown` is not a provider directory.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|p| p.as_str() == name)
    }

    /// Every concrete cloud provider.
    pub fn all() -> Vec<Self> {
        vec![CloudProvider::Aws, CloudProvider::Azure, CloudProvider::Gcp]
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse difficulty bands, used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifficultyLevel {
    Unknown,
    Easy,
    Medium,
    Hard,
    VeryHard,
    Nightmare,
}

impl DifficultyLevel {
    pub fn label(&self) -> &'static str {
        match self {
            DifficultyLevel::Unknown => "Unknown",
            DifficultyLevel::Easy => "Easy",
            DifficultyLevel::Medium => "Medium",
            DifficultyLevel::Hard => "Hard",
            DifficultyLevel::VeryHard => "Very Hard",
            DifficultyLevel::Nightmare => "NIGHTMARE",
        }
    }

    /// Parse a label such as `easy`, `Very Hard` or `very-hard`.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "easy" => Some(DifficultyLevel::Easy),
            "medium" => Some(DifficultyLevel::Medium),
            "hard" => Some(DifficultyLevel::Hard),
            "very hard" => Some(DifficultyLevel::VeryHard),
            "nightmare" => Some(DifficultyLevel::Nightmare),
            "unknown" => Some(DifficultyLevel::Unknown),
            _ => None,
        }
    }

    /// Representative rating for a band.
    fn rating(&self) -> u8 {
        match self {
            DifficultyLevel::Unknown => 0,
            DifficultyLevel::Easy => 2,
            DifficultyLevel::Medium => 4,
            DifficultyLevel::Hard => 6,
            DifficultyLevel::VeryHard => 8,
            DifficultyLevel::Nightmare => 10,
        }
    }
}

/// Difficulty rating on a 1-10 scale; 0 means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Difficulty {
    rating: u8,
}

impl Difficulty {
    pub fn from_rating(rating: u8) -> Self {
        Self {
            rating: rating.clamp(1, 10),
        }
    }

    pub fn unknown() -> Self {
        Self { rating: 0 }
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn is_unknown(&self) -> bool {
        self.rating == 0
    }

    pub fn level(&self) -> DifficultyLevel {
        match self.rating {
            0 => DifficultyLevel::Unknown,
            1..=2 => DifficultyLevel::Easy,
            3..=4 => DifficultyLevel::Medium,
            5..=6 => DifficultyLevel::Hard,
            7..=8 => DifficultyLevel::VeryHard,
            _ => DifficultyLevel::Nightmare,
        }
    }

    pub fn label(&self) -> &'static str {
        self.level().label()
    }

    /// Parse README values like `6/10`, `7` or `Hard`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            // Anything too long for u32 is far above the scale anyway
            let rating = digits.parse::<u32>().unwrap_or(u32::MAX).min(10) as u8;
            return Some(Self::from_rating(rating));
        }
        DifficultyLevel::parse(s).map(|level| match level {
            DifficultyLevel::Unknown => Self::unknown(),
            other => Self::from_rating(other.rating()),
        })
    }

    /// Gauge such as `██████░░░░`.
    pub fn bar(&self, width: usize) -> String {
        let filled = (self.rating as usize).min(width);
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "Unknown")
        } else {
            write!(f, "{}/10 - {}", self.rating, self.label())
        }
    }
}

/// Deployment status, derived from the Terraform state file and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    NotDeployed,
    Deployed,
    /// Not produced by the current derivation; kept for state files that may
    /// one day report partial applies.
    Partial,
    Error,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::NotDeployed => "not_deployed",
            DeploymentStatus::Deployed => "deployed",
            DeploymentStatus::Partial => "partial",
            DeploymentStatus::Error => "error",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Last lifecycle action recorded for a lab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabAction {
    Deployed,
    Destroyed,
}

impl fmt::Display for LabAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabAction::Deployed => write!(f, "deployed"),
            LabAction::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Metadata sidecar stored at `.state/.metadata/<state_key>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabMetadata {
    /// Relative lab path, e.g. `aws/iam-privesc`
    pub lab_name: String,
    pub csp: CloudProvider,
    pub last_action: LabAction,
    /// UTC time of the action
    pub timestamp: NaiveDateTime,
    pub deployed_by: String,
    pub region: String,
    #[serde(default)]
    pub resources_count: usize,
}

/// A discovered lab.
#[derive(Debug, Clone, PartialEq)]
pub struct Lab {
    pub name: String,
    pub path: PathBuf,
    pub provider: CloudProvider,
    pub difficulty: Difficulty,
    pub description: String,
    pub estimated_time: String,
    pub learning_objectives: Vec<String>,
}

impl Lab {
    pub fn new(name: impl Into<String>, path: impl AsRef<Path>, provider: CloudProvider) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
            provider,
            difficulty: Difficulty::unknown(),
            description: String::new(),
            estimated_time: String::new(),
            learning_objectives: Vec::new(),
        }
    }

    /// Canonical `<provider>/<name>` identifier.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.provider, self.name)
    }

    /// Normalized key naming both the state directory and the metadata file.
    pub fn state_key(&self) -> String {
        self.relative_path().replace('/', "_")
    }

    pub fn readme_path(&self) -> PathBuf {
        self.path.join("README.md")
    }

    pub fn has_readme(&self) -> bool {
        self.readme_path().exists()
    }

    /// Directory Terraform runs in.
    pub fn terraform_dir(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Lab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// A lab matched by a search, with its score (0-100).
#[derive(Debug, Clone)]
pub struct LabSearchResult {
    pub lab: Lab,
    pub score: f64,
    pub matched_fields: Vec<String>,
}
