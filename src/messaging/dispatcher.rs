//! # Task Dispatcher
//!
//! Maps task envelopes onto the orchestrators. Payload decoding and credential
//! resolution happen here so the orchestrators only ever see typed requests.
//! Every handler is safe under redelivery: scans key off `scan_id`, resources
//! are upserted by natural key, and cleanups key off resource status.

use super::message::{
    ApplyPolicyPayload, CleanupResourcesPayload, ScanResourcesPayload, SendNotificationPayload,
    TaskEnvelope,
};
use super::notifier::Notifier;
use crate::constants::task_types;
use crate::error::{CloudSweepError, Result};
use crate::orchestration::{
    ApplyPolicyRequest, CleanupOrchestrator, CleanupRequest, PolicyApplicationReport,
    PolicyApplier, ScanOrchestrator, ScanRequest,
};
use crate::providers::{CredentialResolver, Credentials};
use crate::reporting::{CleanupReport, ScanReport};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// What a dispatched task produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "report", rename_all = "snake_case")]
pub enum TaskOutcome {
    Scan(ScanReport),
    Cleanup(CleanupReport),
    PolicyApplied(PolicyApplicationReport),
    NotificationSent,
}

pub struct TaskDispatcher {
    scans: Arc<ScanOrchestrator>,
    cleanup: Arc<CleanupOrchestrator>,
    policies: Arc<PolicyApplier>,
    notifier: Arc<dyn Notifier>,
    credentials: Arc<dyn CredentialResolver>,
}

impl TaskDispatcher {
    pub fn new(
        scans: Arc<ScanOrchestrator>,
        cleanup: Arc<CleanupOrchestrator>,
        policies: Arc<PolicyApplier>,
        notifier: Arc<dyn Notifier>,
        credentials: Arc<dyn CredentialResolver>,
    ) -> Self {
        Self {
            scans,
            cleanup,
            policies,
            notifier,
            credentials,
        }
    }

    #[instrument(skip(self, envelope), fields(task_id = %envelope.id, task_type = %envelope.task_type, attempt = envelope.attempt))]
    pub async fn dispatch(&self, envelope: &TaskEnvelope) -> Result<TaskOutcome> {
        let outcome = match envelope.task_type.as_str() {
            task_types::SCAN_RESOURCES => {
                TaskOutcome::Scan(self.handle_scan(envelope.decode()?).await?)
            }
            task_types::CLEANUP_RESOURCES => {
                TaskOutcome::Cleanup(self.handle_cleanup(envelope.decode()?).await?)
            }
            task_types::APPLY_POLICY => {
                TaskOutcome::PolicyApplied(self.handle_apply_policy(envelope.decode()?).await?)
            }
            task_types::SEND_NOTIFICATION => {
                let payload: SendNotificationPayload = envelope.decode()?;
                self.notifier.notify(&payload).await?;
                TaskOutcome::NotificationSent
            }
            other => {
                return Err(CloudSweepError::UnsupportedOperation(format!(
                    "unknown task type: {other}"
                )))
            }
        };
        info!("Task handled");
        Ok(outcome)
    }

    async fn handle_scan(&self, payload: ScanResourcesPayload) -> Result<ScanReport> {
        let credentials = self
            .credentials
            .credentials(payload.organization_id, payload.provider)
            .await?;
        let mut request = ScanRequest::new(
            payload.organization_id,
            payload.provider,
            payload.regions,
            payload.resource_types,
            credentials,
        );
        request.scan_id = payload.scan_id;
        self.scans.run_scan(request).await
    }

    async fn handle_cleanup(&self, payload: CleanupResourcesPayload) -> Result<CleanupReport> {
        if payload.resource_ids.is_empty() {
            return Err(CloudSweepError::validation(
                "cleanup requires at least one resource id",
            ));
        }
        // Resources may span providers; the orchestrator resolves credentials per group
        let request = CleanupRequest::new(
            payload.organization_id,
            payload.resource_ids,
            payload.action,
            Credentials::default(),
        )
        .dry_run(payload.dry_run);
        Ok(self.cleanup.run_cleanup(request).await)
    }

    async fn handle_apply_policy(
        &self,
        payload: ApplyPolicyPayload,
    ) -> Result<PolicyApplicationReport> {
        let policy = self
            .policies
            .load_policy(payload.organization_id, payload.policy_id)
            .await?;
        let credentials = if policy.is_enabled {
            self.credentials
                .credentials(payload.organization_id, policy.provider)
                .await?
        } else {
            Credentials::default()
        };
        self.policies
            .apply_policy(ApplyPolicyRequest {
                organization_id: payload.organization_id,
                policy_id: payload.policy_id,
                credentials,
                dry_run: payload.dry_run.unwrap_or(false),
            })
            .await
    }
}
