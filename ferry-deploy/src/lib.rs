//! # ferry-deploy
//!
//! Webhook signature checks and the sync → setup → startup deploy pipeline.
//!
//! Call [`signature::verify`] on the raw request body before anything else,
//! then [`DeploymentOrchestrator::deploy`] for the verified repository.

pub mod error;
pub mod orchestrator;
pub mod runner;
pub mod signature;
pub mod workspace;

pub use error::{DeployError, SignatureError};
pub use orchestrator::{Deploy, DeployReport, DeploymentOrchestrator};
pub use runner::{CommandRunner, ProcessHandle, SystemRunner};
pub use signature::SignatureScheme;
pub use workspace::{GitCli, SyncResult, VersionControl, WorkspaceSynchronizer};
