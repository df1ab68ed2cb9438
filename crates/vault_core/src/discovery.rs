//! Lab discovery, lookup and search.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::fuzzy::partial_ratio;
use crate::lab::{CloudProvider, DifficultyLevel, Lab, LabSearchResult, ROOT_DEFINITION};
use crate::readme::parse_readme;

/// Default minimum score for a search hit.
pub const DEFAULT_MIN_SCORE: f64 = 60.0;

const NAME_WEIGHT: f64 = 1.0;
const DESCRIPTION_WEIGHT: f64 = 0.8;
const OBJECTIVE_WEIGHT: f64 = 0.7;
const PATH_MATCH_SCORE: f64 = 90.0;

/// Discovers labs under `labs/<provider>/<name>/` and caches the catalog.
///
/// The cache lives as long as the discovery value and is only replaced by an
/// explicit `discover(true)` / [`LabDiscovery::refresh`].
pub struct LabDiscovery {
    labs_dir: PathBuf,
    cache: Option<Vec<Lab>>,
}

impl LabDiscovery {
    pub fn new(labs_dir: impl Into<PathBuf>) -> Self {
        Self {
            labs_dir: labs_dir.into(),
            cache: None,
        }
    }

    pub fn labs_dir(&self) -> &Path {
        &self.labs_dir
    }

    /// Return the catalog sorted by (provider, name), scanning only when the
    /// cache is empty or `force_refresh` is set.
    pub fn discover(&mut self, force_refresh: bool) -> &[Lab] {
        if force_refresh || self.cache.is_none() {
            self.cache = Some(self.scan());
        }
        self.cache.as_deref().unwrap_or_default()
    }

    /// Rescan the labs directory.
    pub fn refresh(&mut self) -> &[Lab] {
        self.discover(true)
    }

    /// Lab at a zero-based position in the sorted catalog.
    pub fn get_by_index(&mut self, index: usize) -> Option<&Lab> {
        self.discover(false).get(index)
    }

    /// Lab by `<provider>/<name>` or bare name.
    pub fn get_by_path(&mut self, identifier: &str) -> Option<&Lab> {
        self.discover(false)
            .iter()
            .find(|lab| lab.relative_path() == identifier || lab.name == identifier)
    }

    /// Labs whose name, description or objectives mention any of `tags`.
    pub fn filter_by_tags(&mut self, tags: &[&str]) -> Vec<Lab> {
        let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        self.discover(false)
            .iter()
            .filter(|lab| {
                let text = format!(
                    "{} {} {}",
                    lab.name,
                    lab.description,
                    lab.learning_objectives.join(" ")
                )
                .to_lowercase();
                tags.iter().any(|tag| text.contains(tag.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Rank labs against `query`.
    ///
    /// Filters apply first. An empty query returns every remaining lab with a
    /// score of 100. Otherwise a lab's score is the best of its weighted name,
    /// description and objective similarities, or 90 when the query is a
    /// substring of its relative path; only scores above `min_score` are kept.
    pub fn search(
        &mut self,
        query: &str,
        provider: Option<CloudProvider>,
        difficulty: Option<DifficultyLevel>,
        min_score: f64,
    ) -> Vec<LabSearchResult> {
        let labs = self
            .discover(false)
            .iter()
            .filter(|lab| provider.map_or(true, |p| lab.provider == p))
            .filter(|lab| difficulty.map_or(true, |d| lab.difficulty.level() == d));

        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return labs
                .map(|lab| LabSearchResult {
                    lab: lab.clone(),
                    score: 100.0,
                    matched_fields: Vec::new(),
                })
                .collect();
        }

        let mut results: Vec<LabSearchResult> = labs
            .filter_map(|lab| score_lab(lab, &query, min_score))
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }

    fn scan(&self) -> Vec<Lab> {
        info!("Discovering labs in {:?}", self.labs_dir);

        if !self.labs_dir.exists() {
            warn!("Labs directory does not exist: {:?}", self.labs_dir);
            return Vec::new();
        }

        let mut labs = Vec::new();
        let mut seen = HashSet::new();

        for provider_entry in subdirectories(&self.labs_dir) {
            let dir_name = provider_entry.file_name().to_string_lossy().into_owned();
            let Some(provider) = CloudProvider::from_dir_name(&dir_name) else {
                debug!("Skipping non-provider directory {:?}", provider_entry.path());
                continue;
            };

            for lab_entry in subdirectories(provider_entry.path()) {
                let lab_dir = lab_entry.path();
                if !lab_dir.join(ROOT_DEFINITION).exists() {
                    debug!("Skipping {:?}: no {}", lab_dir, ROOT_DEFINITION);
                    continue;
                }

                let lab = build_lab(lab_dir, provider);
                if !seen.insert(lab.state_key()) {
                    warn!("Duplicate lab key {}, ignoring {:?}", lab.state_key(), lab_dir);
                    continue;
                }
                labs.push(lab);
            }
        }

        labs.sort_by(|a, b| {
            (a.provider.as_str(), a.name.as_str()).cmp(&(b.provider.as_str(), b.name.as_str()))
        });
        info!("Discovered {} lab(s)", labs.len());
        labs
    }
}

fn subdirectories(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
}

fn build_lab(lab_dir: &Path, provider: CloudProvider) -> Lab {
    let name = lab_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut lab = Lab::new(name, lab_dir, provider);

    if lab.has_readme() {
        match fs::read_to_string(lab.readme_path()) {
            Ok(content) => parse_readme(&content).apply_to(&mut lab),
            Err(e) => debug!("Could not read README for {}: {}", lab, e),
        }
    }

    lab
}

fn score_lab(lab: &Lab, query: &str, min_score: f64) -> Option<LabSearchResult> {
    let mut score = 0.0_f64;
    let mut matched_fields = Vec::new();

    let name_score = partial_ratio(query, &lab.name.to_lowercase());
    if name_score > min_score {
        score = score.max(name_score * NAME_WEIGHT);
        matched_fields.push("name".to_string());
    }

    let description_score = partial_ratio(query, &lab.description.to_lowercase());
    if description_score > min_score {
        score = score.max(description_score * DESCRIPTION_WEIGHT);
        matched_fields.push("description".to_string());
    }

    for objective in &lab.learning_objectives {
        let objective_score = partial_ratio(query, &objective.to_lowercase());
        if objective_score > min_score {
            score = score.max(objective_score * OBJECTIVE_WEIGHT);
            if !matched_fields.iter().any(|f| f == "objectives") {
                matched_fields.push("objectives".to_string());
            }
        }
    }

    if lab.relative_path().to_lowercase().contains(query) {
        score = score.max(PATH_MATCH_SCORE);
        matched_fields.push("path".to_string());
    }

    (score > min_score).then(|| LabSearchResult {
        lab: lab.clone(),
        score,
        matched_fields,
    })
}
