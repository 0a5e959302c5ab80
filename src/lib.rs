#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # CloudSweep Core
//!
//! Resource lifecycle governance engine for multi-cloud inventories.
//!
//! ## Overview
//!
//! CloudSweep discovers cloud resources, classifies idle ones, estimates their
//! monthly cost and carbon footprint, evaluates organization policies against
//! them, and executes remediation (delete, stop, tag, notify) with per-resource
//! results that tolerate partial failure.
//!
//! ## Module Organization
//!
//! - [`models`] - Resources, scans, policies, organizations and cloud accounts
//! - [`state_machine`] - Scan lifecycle transitions
//! - [`providers`] - Scanner/Cleaner contracts and the provider registry
//! - [`policy`] - Declarative condition evaluation
//! - [`orchestration`] - Scan, cleanup and policy application
//! - [`messaging`] - Task payloads and dispatch
//! - [`reporting`] - Cleanup/scan reports and inventory summaries
//! - [`repository`] - Persistence contracts with in-memory and Postgres adapters
//! - [`events`] - Lifecycle event publishing
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging setup
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloudsweep_core::events::EventPublisher;
//! use cloudsweep_core::models::CloudProvider;
//! use cloudsweep_core::orchestration::{ScanOrchestrator, ScanRequest};
//! use cloudsweep_core::providers::{Credentials, ProviderRegistry};
//! use cloudsweep_core::repository::InMemoryRepository;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryRepository::new());
//! let orchestrator = ScanOrchestrator::new(
//!     Arc::new(ProviderRegistry::empty()),
//!     store.clone(),
//!     store,
//!     EventPublisher::default(),
//! );
//!
//! let request = ScanRequest::new(
//!     Uuid::new_v4(),
//!     CloudProvider::Aws,
//!     vec!["us-east-1".to_string()],
//!     vec![],
//!     Credentials::default(),
//! );
//! let report = orchestrator.run_scan(request).await?;
//! println!("{} unused resources found", report.unused_found);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod policy;
pub mod providers;
pub mod reporting;
pub mod repository;
pub mod state_machine;

pub use config::CloudSweepConfig;
pub use error::{CloudSweepError, Result};
pub use events::EventPublisher;
pub use models::{CloudProvider, Policy, Resource, ResourceStatus, ResourceType, Scan};
pub use orchestration::{CleanupOrchestrator, PolicyApplier, ScanOrchestrator};
pub use reporting::{CleanupReport, CleanupResult, ScanReport};
