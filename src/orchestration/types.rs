//! Requests accepted by the orchestrators and the policy application report.

use crate::error::{CloudSweepError, Result};
use crate::models::{CloudProvider, PolicyAction, ResourceType};
use crate::providers::Credentials;
use crate::reporting::CleanupReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub organization_id: Uuid,
    pub provider: CloudProvider,
    pub regions: Vec<String>,
    /// Empty means every type the provider's scanner knows
    pub resource_types: Vec<ResourceType>,
    pub credentials: Credentials,
    /// Caller-allocated id; a redelivered request reuses it
    pub scan_id: Option<Uuid>,
}

impl ScanRequest {
    pub fn new(
        organization_id: Uuid,
        provider: CloudProvider,
        regions: Vec<String>,
        resource_types: Vec<ResourceType>,
        credentials: Credentials,
    ) -> Self {
        Self {
            organization_id,
            provider,
            regions,
            resource_types,
            credentials,
            scan_id: None,
        }
    }

    pub fn with_scan_id(mut self, scan_id: Uuid) -> Self {
        self.scan_id = Some(scan_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() || self.regions.iter().any(|r| r.trim().is_empty()) {
            return Err(CloudSweepError::validation(
                "scan requires at least one non-empty region",
            ));
        }
        if let Some(foreign) = self
            .resource_types
            .iter()
            .find(|t| t.provider() != self.provider)
        {
            return Err(CloudSweepError::validation(format!(
                "resource type {foreign} does not belong to provider {}",
                self.provider
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CleanupRequest {
    pub organization_id: Uuid,
    pub resource_ids: Vec<Uuid>,
    /// Raw action name; anything other than delete/stop/tag fails per resource
    pub action: String,
    /// Used for every provider group. Empty credentials defer to the
    /// orchestrator's credential resolver, when one is configured.
    pub credentials: Credentials,
    pub dry_run: bool,
}

impl CleanupRequest {
    pub fn new(
        organization_id: Uuid,
        resource_ids: Vec<Uuid>,
        action: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            organization_id,
            resource_ids,
            action: action.into(),
            credentials,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApplyPolicyRequest {
    pub organization_id: Uuid,
    pub policy_id: Uuid,
    pub credentials: Credentials,
    pub dry_run: bool,
}

/// What one `policy:apply` run evaluated and did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyApplicationReport {
    pub policy_id: Uuid,
    pub evaluated: usize,
    pub matched: usize,
    pub notified: bool,
    /// One cleanup per remediation action, most severe first
    pub cleanups: Vec<(PolicyAction, CleanupReport)>,
}

impl PolicyApplicationReport {
    pub fn empty(policy_id: Uuid) -> Self {
        Self {
            policy_id,
            evaluated: 0,
            matched: 0,
            notified: false,
            cleanups: Vec::new(),
        }
    }
}
