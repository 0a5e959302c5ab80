//! # Orchestration
//!
//! The three units of work the engine runs: scans, cleanups and policy
//! applications. Each orchestrator owns its collaborators behind `Arc`s and is
//! safe to invoke concurrently.

pub mod cleanup_orchestrator;
pub mod lease;
pub mod policy_applier;
pub mod scan_orchestrator;
pub mod types;

pub use cleanup_orchestrator::CleanupOrchestrator;
pub use lease::{CleanupLeases, LeaseGuard};
pub use policy_applier::PolicyApplier;
pub use scan_orchestrator::ScanOrchestrator;
pub use types::{ApplyPolicyRequest, CleanupRequest, PolicyApplicationReport, ScanRequest};
