//! Attack-chain walkthrough registry.
//!
//! A chain is a guided walkthrough for one lab, built from the lab's Terraform
//! outputs as a plain `name -> value` map. The registry is a fixed table keyed by
//! provider and lab name; it performs no network activity.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::lab::{CloudProvider, Lab};

/// Registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainKey {
    pub provider: CloudProvider,
    pub lab: &'static str,
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.lab)
    }
}

/// One walkthrough step.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainPhase {
    pub name: &'static str,
    pub description: String,
    /// Every output this step depends on is present
    pub ready: bool,
}

/// Result of checking a chain's required outputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preflight {
    pub missing: Vec<String>,
}

impl Preflight {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }
}

/// A lab-specific walkthrough.
pub trait AttackChain {
    fn title(&self) -> &'static str;

    /// Output names the walkthrough cannot run without.
    fn required_outputs(&self) -> &'static [&'static str];

    fn outputs(&self) -> &BTreeMap<String, String>;

    fn phases(&self) -> Vec<ChainPhase>;

    fn preflight(&self) -> Preflight {
        let missing = self
            .required_outputs()
            .iter()
            .filter(|name| self.outputs().get(**name).map_or(true, |v| v.trim().is_empty()))
            .map(|name| name.to_string())
            .collect();
        Preflight { missing }
    }
}

fn output<'a>(outputs: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    outputs
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

fn phase(name: &'static str, value: Option<&str>, describe: impl FnOnce(&str) -> String) -> ChainPhase {
    match value {
        Some(v) => ChainPhase {
            name,
            description: describe(v),
            ready: true,
        },
        None => ChainPhase {
            name,
            description: "waiting on missing output".to_string(),
            ready: false,
        },
    }
}

/// SSRF against the instance metadata service, pivoting to S3.
pub struct SsrfMetadataChain {
    outputs: BTreeMap<String, String>,
}

impl AttackChain for SsrfMetadataChain {
    fn title(&self) -> &'static str {
        "SSRF to instance metadata credentials"
    }

    fn required_outputs(&self) -> &'static [&'static str] {
        &["service_url", "instance_role", "data_bucket"]
    }

    fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    fn phases(&self) -> Vec<ChainPhase> {
        let url = output(&self.outputs, "service_url");
        let role = output(&self.outputs, "instance_role");
        let bucket = output(&self.outputs, "data_bucket");
        vec![
            phase("Service Check", url, |u| format!("Confirm {}/health responds", u)),
            phase("SSRF Probe", url, |u| {
                format!(
                    "Request {}/check?url=http://169.254.169.254/latest/meta-data/",
                    u
                )
            }),
            phase("Credential Extraction", role, |r| {
                format!("Read security-credentials/{} through the SSRF", r)
            }),
            phase("S3 Enumeration", bucket, |b| {
                format!("List s3://{} with the recovered credentials", b)
            }),
            phase("Data Exfiltration", bucket, |b| {
                format!("Download the sensitive objects from s3://{}", b)
            }),
        ]
    }
}

/// Secrets leaked through Lambda configuration, pivoting to the database.
pub struct LambdaSecretsChain {
    outputs: BTreeMap<String, String>,
}

impl AttackChain for LambdaSecretsChain {
    fn title(&self) -> &'static str {
        "Lambda secrets exposure"
    }

    fn required_outputs(&self) -> &'static [&'static str] {
        &["api_endpoint", "db_endpoint"]
    }

    fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    fn phases(&self) -> Vec<ChainPhase> {
        let api = output(&self.outputs, "api_endpoint");
        let db = output(&self.outputs, "db_endpoint");
        let db_name = output(&self.outputs, "db_name").unwrap_or("production");
        vec![
            phase("API Enumeration", api, |a| format!("Map the routes exposed by {}", a)),
            phase("Configuration Extraction", api, |a| {
                format!("Trigger verbose errors from {} to leak function configuration", a)
            }),
            phase("Secrets Retrieval", api, |_| {
                "Recover database credentials from the leaked environment".to_string()
            }),
            phase("Database Access", db, |d| {
                format!("Connect to {} database on {}", db_name, d)
            }),
            phase("Flag Extraction", db, |_| "Query the flag table".to_string()),
        ]
    }
}

/// Builds a chain from lab outputs.
pub type ChainFactory = fn(BTreeMap<String, String>) -> Box<dyn AttackChain>;

const BUILTIN_CHAINS: &[(CloudProvider, &str, ChainFactory)] = &[
    (CloudProvider::Aws, "ssrf-metadata", ssrf_metadata),
    (CloudProvider::Aws, "lambda-secrets-exposure", lambda_secrets),
];

fn ssrf_metadata(outputs: BTreeMap<String, String>) -> Box<dyn AttackChain> {
    Box::new(SsrfMetadataChain { outputs })
}

fn lambda_secrets(outputs: BTreeMap<String, String>) -> Box<dyn AttackChain> {
    Box::new(LambdaSecretsChain { outputs })
}

/// Lookup table from `(provider, lab)` to chain factory.
pub struct ChainRegistry {
    table: HashMap<ChainKey, ChainFactory>,
}

impl ChainRegistry {
    /// Registry holding every built-in chain.
    pub fn builtin() -> Self {
        let table = BUILTIN_CHAINS
            .iter()
            .map(|(provider, lab, factory)| {
                (
                    ChainKey {
                        provider: *provider,
                        lab: *lab,
                    },
                    *factory,
                )
            })
            .collect();
        Self { table }
    }

    pub fn contains(&self, lab: &Lab) -> bool {
        self.factory(lab).is_some()
    }

    /// Instantiate the chain for `lab`, if one is registered.
    pub fn create(&self, lab: &Lab, outputs: BTreeMap<String, String>) -> Option<Box<dyn AttackChain>> {
        self.factory(lab).map(|factory| factory(outputs))
    }

    /// Registered keys, sorted.
    pub fn list(&self) -> Vec<ChainKey> {
        let mut keys: Vec<ChainKey> = self.table.keys().copied().collect();
        keys.sort();
        keys
    }

    fn factory(&self, lab: &Lab) -> Option<ChainFactory> {
        self.table
            .iter()
            .find(|(key, _)| key.provider == lab.provider && key.lab == lab.name)
            .map(|(_, factory)| *factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ChainRegistry::builtin();
        let keys: Vec<String> = registry.list().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["aws/lambda-secrets-exposure", "aws/ssrf-metadata"]);

        let lab = Lab::new("ssrf-metadata", "/labs/aws/ssrf-metadata", CloudProvider::Aws);
        assert!(registry.contains(&lab));

        let other = Lab::new("ssrf-metadata", "/labs/gcp/ssrf-metadata", CloudProvider::Gcp);
        assert!(!registry.contains(&other));
        assert!(registry.create(&other, BTreeMap::new()).is_none());
    }

    #[test]
    fn test_preflight_reports_missing_outputs() {
        let registry = ChainRegistry::builtin();
        let lab = Lab::new("ssrf-metadata", "/labs/aws/ssrf-metadata", CloudProvider::Aws);

        let chain = registry
            .create(&lab, outputs(&[("service_url", "http://10.0.0.5:8080"), ("data_bucket", " ")]))
            .unwrap();

        let preflight = chain.preflight();
        assert!(!preflight.is_ready());
        assert_eq!(preflight.missing, vec!["instance_role", "data_bucket"]);

        let phases = chain.phases();
        assert_eq!(phases.len(), 5);
        assert!(phases[0].ready);
        assert!(phases[1].description.contains("http://10.0.0.5:8080/check?url="));
        assert!(!phases[2].ready);
    }

    #[test]
    fn test_lambda_chain_defaults_db_name() {
        let lab = Lab::new(
            "lambda-secrets-exposure",
            "/labs/aws/lambda-secrets-exposure",
            CloudProvider::Aws,
        );
        let chain = ChainRegistry::builtin()
            .create(
                &lab,
                outputs(&[("api_endpoint", "https://api.example"), ("db_endpoint", "db:5432")]),
            )
            .unwrap();

        assert!(chain.preflight().is_ready());
        let db = chain
            .phases()
            .into_iter()
            .find(|p| p.name == "Database Access")
            .unwrap();
        assert_eq!(db.description, "Connect to production database on db:5432");
    }
}
