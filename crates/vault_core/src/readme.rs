//! Best-effort README enrichment.
//!
//! Labs may describe themselves with an optional YAML front-matter block and/or
//! `Field: value` lines in the README body. Every field is independent; anything
//! missing or malformed leaves the default in place.

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::lab::{Difficulty, Lab};

/// Fields extracted from a README.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadmeInfo {
    pub difficulty: Option<Difficulty>,
    pub description: Option<String>,
    pub estimated_time: Option<String>,
    pub learning_objectives: Vec<String>,
}

impl ReadmeInfo {
    /// Copy the fields that were found onto `lab`.
    pub fn apply_to(self, lab: &mut Lab) {
        if let Some(difficulty) = self.difficulty {
            lab.difficulty = difficulty;
        }
        if let Some(description) = self.description {
            lab.description = description;
        }
        if let Some(estimated_time) = self.estimated_time {
            lab.estimated_time = estimated_time;
        }
        if !self.learning_objectives.is_empty() {
            lab.learning_objectives = self.learning_objectives;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    difficulty: Option<serde_yaml::Value>,
    description: Option<String>,
    #[serde(alias = "time", alias = "duration")]
    estimated_time: Option<String>,
    #[serde(default, alias = "objectives")]
    learning_objectives: Vec<String>,
}

/// Parse README content.
pub fn parse_readme(content: &str) -> ReadmeInfo {
    let content = content.replace("\r\n", "\n");
    let (front, body) = split_front_matter(&content);

    let mut info = ReadmeInfo::default();

    if let Some(front) = front {
        match serde_yaml::from_str::<FrontMatter>(front) {
            Ok(fm) => {
                info.difficulty = fm.difficulty.as_ref().and_then(yaml_difficulty);
                info.description = fm.description.map(|s| s.trim().to_string());
                info.estimated_time = fm.estimated_time.map(|s| s.trim().to_string());
                info.learning_objectives = fm.learning_objectives;
            }
            Err(e) => debug!("Ignoring malformed README front matter: {}", e),
        }
    }

    if info.difficulty.is_none() {
        info.difficulty = capture(r"(?i)Difficulty:\s*\*\*(.+?)\*\*", body)
            .and_then(|s| Difficulty::parse(&s));
    }
    if info.description.is_none() {
        info.description = capture(r"(?is)(?:Description|Overview):\s*(.+?)(?:\n\n|\n#|\z)", body);
    }
    if info.estimated_time.is_none() {
        info.estimated_time = capture(r"(?i)(?:Estimated Time|Duration):\s*(.+)", body);
    }
    if info.learning_objectives.is_empty() {
        if let Some(section) = capture(
            r"(?is)(?:Learning Objectives|Objectives):\s*(.+?)(?:\n\n|\n#|\z)",
            body,
        ) {
            info.learning_objectives = section
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| line.trim_start_matches(['-', '•', '*']).trim().to_string())
                .filter(|line| !line.is_empty())
                .collect();
        }
    }

    info
}

fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return (None, content);
    };
    match rest.find("\n---") {
        Some(end) => {
            let body = &rest[end + 4..];
            (Some(&rest[..end]), body.strip_prefix('\n').unwrap_or(body))
        }
        None => (None, content),
    }
}

fn yaml_difficulty(value: &serde_yaml::Value) -> Option<Difficulty> {
    match value {
        serde_yaml::Value::Number(n) => n.as_u64().map(|r| Difficulty::from_rating(r.min(10) as u8)),
        serde_yaml::Value::String(s) => Difficulty::parse(s),
        _ => None,
    }
}

fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let value = re
        .captures(text)?
        .get(1)?
        .as_str()
        .trim_matches(|c: char| c == '*' || c.is_whitespace())
        .to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
