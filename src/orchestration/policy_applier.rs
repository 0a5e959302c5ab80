//! # Policy Applier
//!
//! Handles `policy:apply`: evaluates one policy over the organization's live
//! inventory for the policy's provider, requests a notification when the
//! policy asks for one, then runs a cleanup per remediation action, most
//! severe first.

use super::cleanup_orchestrator::CleanupOrchestrator;
use super::types::{ApplyPolicyRequest, CleanupRequest, PolicyApplicationReport};
use crate::constants::events;
use crate::error::{CloudSweepError, Result};
use crate::events::EventPublisher;
use crate::messaging::{Notifier, SendNotificationPayload};
use crate::models::{Policy, PolicyAction, Resource};
use crate::policy::PolicyMatcher;
use crate::repository::{PolicyRepository, ResourceFilter, ResourceRepository};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

pub const POLICY_MATCHED_NOTIFICATION: &str = "policy_matched";

pub struct PolicyApplier {
    policies: Arc<dyn PolicyRepository>,
    resources: Arc<dyn ResourceRepository>,
    cleanup: Arc<CleanupOrchestrator>,
    notifier: Arc<dyn Notifier>,
    event_publisher: EventPublisher,
}

impl PolicyApplier {
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        resources: Arc<dyn ResourceRepository>,
        cleanup: Arc<CleanupOrchestrator>,
        notifier: Arc<dyn Notifier>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            policies,
            resources,
            cleanup,
            notifier,
            event_publisher,
        }
    }

    /// Fetch a policy scoped to its organization
    pub async fn load_policy(&self, organization_id: Uuid, policy_id: Uuid) -> Result<Policy> {
        self.policies
            .get(policy_id)
            .await?
            .filter(|p| p.organization_id == organization_id)
            .ok_or_else(|| CloudSweepError::not_found("policy", policy_id))
    }

    #[instrument(
        skip(self, request),
        fields(
            organization_id = %request.organization_id,
            policy_id = %request.policy_id,
            dry_run = request.dry_run
        )
    )]
    pub async fn apply_policy(&self, request: ApplyPolicyRequest) -> Result<PolicyApplicationReport> {
        let policy = self
            .load_policy(request.organization_id, request.policy_id)
            .await?;
        let mut report = PolicyApplicationReport::empty(policy.id);

        if !policy.is_enabled {
            debug!("Policy disabled; nothing to apply");
            return Ok(report);
        }

        let filter = ResourceFilter::for_organization(request.organization_id)
            .provider(policy.provider)
            .exclude_deleted();
        let inventory = self.resources.list(&filter).await?;
        report.evaluated = inventory.len();

        let now = Utc::now();
        let matcher = PolicyMatcher::new(&policy);
        let matched: Vec<&Resource> = inventory
            .iter()
            .filter(|r| matcher.applies(r, now))
            .collect();
        report.matched = matched.len();

        if matched.is_empty() {
            debug!(evaluated = report.evaluated, "No resources matched");
            self.publish_applied(&policy, &report, request.dry_run).await;
            return Ok(report);
        }

        if policy.has_action(PolicyAction::Notify) {
            report.notified = self.notify(&policy, &matched, request.dry_run).await;
        }

        let resource_ids: Vec<_> = matched.iter().map(|r| r.id).collect();
        for action in PolicyAction::REMEDIATIONS_BY_SEVERITY {
            if !policy.has_action(action) {
                continue;
            }
            let cleanup = CleanupRequest::new(
                request.organization_id,
                resource_ids.clone(),
                action.as_str(),
                request.credentials.clone(),
            )
            .dry_run(request.dry_run);
            let outcome = self.cleanup.run_cleanup(cleanup).await;
            report.cleanups.push((action, outcome));
        }

        info!(
            evaluated = report.evaluated,
            matched = report.matched,
            notified = report.notified,
            cleanups = report.cleanups.len(),
            "Policy applied"
        );
        self.publish_applied(&policy, &report, request.dry_run).await;
        Ok(report)
    }

    async fn notify(&self, policy: &Policy, matched: &[&Resource], dry_run: bool) -> bool {
        let potential_savings: f64 = matched.iter().map(|r| r.monthly_cost).sum();
        let notification = SendNotificationPayload {
            kind: POLICY_MATCHED_NOTIFICATION.to_string(),
            to: format!("organization:{}", policy.organization_id),
            subject: format!(
                "Policy '{}' matched {} resource(s)",
                policy.name,
                matched.len()
            ),
            data: json!({
                "policy_id": policy.id,
                "organization_id": policy.organization_id,
                "dry_run": dry_run,
                "resource_ids": matched.iter().map(|r| r.id).collect::<Vec<_>>(),
                "potential_monthly_savings": potential_savings,
            }),
        };

        if let Err(e) = self
            .event_publisher
            .publish_payload(events::NOTIFICATION_REQUESTED, &notification)
            .await
        {
            warn!(error = %e, "Failed to publish notification event");
        }

        match self.notifier.notify(&notification).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Policy notification could not be delivered");
                false
            }
        }
    }

    async fn publish_applied(&self, policy: &Policy, report: &PolicyApplicationReport, dry_run: bool) {
        let cleanups: Vec<_> = report
            .cleanups
            .iter()
            .map(|(action, outcome)| {
                json!({
                    "action": action,
                    "success_count": outcome.success_count,
                    "failure_count": outcome.failure_count,
                    "total_cost_saved": outcome.total_cost_saved,
                })
            })
            .collect();
        let context = json!({
            "policy_id": policy.id,
            "organization_id": policy.organization_id,
            "dry_run": dry_run,
            "evaluated": report.evaluated,
            "matched": report.matched,
            "notified": report.notified,
            "cleanups": cleanups,
        });
        if let Err(e) = self.event_publisher.publish(events::POLICY_APPLIED, context).await {
            warn!(error = %e, "Failed to publish policy.applied event");
        }
    }
}
