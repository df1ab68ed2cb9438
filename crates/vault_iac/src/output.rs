//! Terraform output and deployment result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder shown instead of sensitive output values.
pub const REDACTED: &str = "<sensitive>";

/// One Terraform output, as found in state files and `terraform output -json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerraformOutput {
    pub value: Value,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(rename = "type", default)]
    pub output_type: Value,
}

impl TerraformOutput {
    /// Value for display. Strings are shown bare, everything else as compact JSON.
    pub fn display_value(&self, show_sensitive: bool) -> String {
        if self.sensitive && !show_sensitive {
            return REDACTED.to_string();
        }
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Parse a `name -> {value, sensitive, type}` object, skipping malformed entries.
pub(crate) fn parse_outputs(raw: BTreeMap<String, Value>) -> BTreeMap<String, TerraformOutput> {
    raw.into_iter()
        .filter_map(|(name, value)| match serde_json::from_value(value) {
            Ok(output) => Some((name, output)),
            Err(e) => {
                tracing::debug!("Skipping malformed output {}: {}", name, e);
                None
            }
        })
        .collect()
}

/// Flatten outputs into `name -> display value`, sensitive values included.
pub fn output_values(outputs: &BTreeMap<String, TerraformOutput>) -> BTreeMap<String, String> {
    outputs
        .iter()
        .map(|(name, output)| (name.clone(), output.display_value(true)))
        .collect()
}

/// Outcome of `apply`.
#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub success: bool,
    pub lab_name: String,
    pub outputs: BTreeMap<String, TerraformOutput>,
    pub error_message: Option<String>,
    pub resources_created: usize,
}

impl DeploymentResult {
    pub fn succeeded(
        lab_name: impl Into<String>,
        outputs: BTreeMap<String, TerraformOutput>,
        resources_created: usize,
    ) -> Self {
        Self {
            success: true,
            lab_name: lab_name.into(),
            outputs,
            error_message: None,
            resources_created,
        }
    }

    pub fn failed(lab_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            lab_name: lab_name.into(),
            outputs: BTreeMap::new(),
            error_message: Some(error_message.into()),
            resources_created: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value_redacts_sensitive() {
        let output = TerraformOutput {
            value: json!("hunter2"),
            sensitive: true,
            output_type: json!("string"),
        };
        assert_eq!(output.display_value(false), REDACTED);
        assert_eq!(output.display_value(true), "hunter2");
    }

    #[test]
    fn test_display_value_non_string() {
        let output: TerraformOutput =
            serde_json::from_value(json!({"value": ["a", "b"], "type": ["list", "string"]})).unwrap();
        assert!(!output.sensitive);
        assert_eq!(output.display_value(false), r#"["a","b"]"#);
    }

    #[test]
    fn test_parse_outputs_skips_malformed() {
        let mut raw = BTreeMap::new();
        raw.insert("url".to_string(), json!({"value": "http://x", "type": "string"}));
        raw.insert("broken".to_string(), json!("not an object"));

        let outputs = parse_outputs(raw);
        assert_eq!(outputs.len(), 1);
        assert_eq!(output_values(&outputs)["url"], "http://x");
    }
}
