//! # vault_core
//!
//! Lab catalog and deployment state tracking for VAULT.
//!
//! A lab is a self-contained Terraform project living at
//! `labs/<provider>/<name>/`. This crate discovers labs, resolves the
//! provider-specific variable files they need, and derives whether they are
//! deployed purely from the Terraform state files kept under `.state/`.
//!
//! # Architecture
//!
//! - **Lab model**: [`Lab`], [`CloudProvider`], [`Difficulty`], [`LabMetadata`]
//! - **Discovery**: [`LabDiscovery`] scans, caches, indexes and searches labs
//! - **Providers**: one [`Provider`] per cloud, chosen by [`ProviderFactory`]
//! - **State**: [`StateManager`] reads state files and owns metadata sidecars
//! - **Layout**: [`ProjectLayout`] and [`VaultSettings`] locate everything on disk
//! - **Chains**: [`ChainRegistry`] maps labs to their attack-chain walkthroughs
//!
//! # Example
//!
//! ```rust,no_run
//! use vault_core::{LabDiscovery, ProjectLayout, StateManager};
//!
//! let layout = ProjectLayout::new(".");
//! let mut discovery = LabDiscovery::new(layout.labs_dir());
//! let state = StateManager::new(layout.state_dir()).unwrap();
//!
//! for lab in discovery.discover(false) {
//!     println!("{} -> {}", lab, state.deployment_status(lab));
//! }
//! ```

pub mod chains;
pub mod discovery;
pub mod error;
pub mod fuzzy;
pub mod lab;
pub mod layout;
pub mod provider;
pub mod readme;
pub mod state;

pub use chains::{AttackChain, ChainKey, ChainPhase, ChainRegistry, Preflight};
pub use discovery::LabDiscovery;
pub use error::{CoreError, CoreResult};
pub use lab::{
    CloudProvider, DeploymentStatus, Difficulty, DifficultyLevel, Lab, LabAction, LabMetadata,
    LabSearchResult,
};
pub use layout::{ProjectLayout, VaultSettings};
pub use provider::{AwsProvider, AzureProvider, GcpProvider, Provider, ProviderFactory};
pub use state::StateManager;
