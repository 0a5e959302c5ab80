//! # Cleanup Orchestrator
//!
//! Executes one remediation action over a set of resources and reports every
//! outcome. Never fails wholesale: lookup, registry and provider errors all
//! become per-resource failed results.
//!
//! Resources are partitioned by provider. Groups run concurrently; inside a
//! group at most `cleanup.max_concurrency` provider calls are in flight. Every
//! result is sent to a single aggregator task, which restores request order.

use super::lease::CleanupLeases;
use super::types::CleanupRequest;
use crate::config::CleanupConfig;
use crate::constants::{
    events, messages, MARKED_FOR_DELETION_TAG_KEY, MARKED_FOR_DELETION_TAG_VALUE,
};
use crate::events::EventPublisher;
use crate::models::{CloudProvider, PolicyAction, Resource, Tags};
use crate::providers::{Cleaner, CredentialResolver, ProviderRegistry};
use crate::reporting::{spawn_aggregator, CleanupReport, CleanupResult, PositionedResult};
use crate::repository::ResourceRepository;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

type ProviderGroups = BTreeMap<CloudProvider, Vec<(usize, Resource)>>;

/// Actions a `Cleaner` can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Remediation {
    Delete,
    Stop,
    Tag,
}

impl Remediation {
    fn parse(action: &str) -> Option<Self> {
        match action.parse::<PolicyAction>().ok()? {
            PolicyAction::Delete => Some(Self::Delete),
            PolicyAction::Stop => Some(Self::Stop),
            PolicyAction::Tag => Some(Self::Tag),
            PolicyAction::Notify => None,
        }
    }
}

pub struct CleanupOrchestrator {
    registry: Arc<ProviderRegistry>,
    resources: Arc<dyn ResourceRepository>,
    event_publisher: EventPublisher,
    leases: CleanupLeases,
    credential_resolver: Option<Arc<dyn CredentialResolver>>,
    config: CleanupConfig,
}

impl CleanupOrchestrator {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        resources: Arc<dyn ResourceRepository>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self::with_config(registry, resources, event_publisher, CleanupConfig::default())
    }

    pub fn with_config(
        registry: Arc<ProviderRegistry>,
        resources: Arc<dyn ResourceRepository>,
        event_publisher: EventPublisher,
        config: CleanupConfig,
    ) -> Self {
        Self {
            registry,
            resources,
            event_publisher,
            leases: CleanupLeases::new(),
            credential_resolver: None,
            config,
        }
    }

    /// Resolve per-provider credentials when a request carries none
    pub fn with_credential_resolver(mut self, resolver: Arc<dyn CredentialResolver>) -> Self {
        self.credential_resolver = Some(resolver);
        self
    }

    pub fn leases(&self) -> &CleanupLeases {
        &self.leases
    }

    #[instrument(
        skip(self, request),
        fields(
            organization_id = %request.organization_id,
            action = %request.action,
            dry_run = request.dry_run,
            requested = request.resource_ids.len()
        )
    )]
    pub async fn run_cleanup(&self, request: CleanupRequest) -> CleanupReport {
        let (sender, aggregator) = spawn_aggregator(request.resource_ids.len());

        let groups = self.resolve(&request, &sender).await;
        if groups.is_empty() {
            debug!("No resources resolved");
        }

        join_all(
            groups
                .into_iter()
                .map(|(provider, members)| self.run_group(provider, members, &request, &sender)),
        )
        .await;
        drop(sender);

        let report = match aggregator.await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Cleanup aggregator task failed");
                CleanupReport::default()
            }
        };

        info!(
            success_count = report.success_count,
            failure_count = report.failure_count,
            total_cost_saved = report.total_cost_saved,
            "Cleanup finished"
        );
        self.emit(events::CLEANUP_COMPLETED, json!({
            "organization_id": request.organization_id,
            "action": request.action,
            "dry_run": request.dry_run,
            "success_count": report.success_count,
            "failure_count": report.failure_count,
            "total_cost_saved": report.total_cost_saved,
            "total_carbon_saved_kg": report.total_carbon_saved,
        }))
        .await;
        report
    }

    /// Load each requested id; anything missing, unreadable or foreign is reported as not found.
    /// A repeated id keeps only its first position.
    async fn resolve(
        &self,
        request: &CleanupRequest,
        sender: &mpsc::Sender<PositionedResult>,
    ) -> ProviderGroups {
        let mut groups = ProviderGroups::new();
        let mut seen = HashSet::with_capacity(request.resource_ids.len());
        for (position, id) in request.resource_ids.iter().enumerate() {
            if !seen.insert(*id) {
                debug!(resource_id = %id, position, "Skipping repeated resource id");
                continue;
            }
            match self.resources.get(*id).await {
                Ok(Some(resource)) if resource.organization_id == request.organization_id => {
                    groups
                        .entry(resource.provider)
                        .or_default()
                        .push((position, resource));
                }
                Ok(_) => {
                    send(sender, position, not_found(*id, &request.action)).await;
                }
                Err(e) => {
                    warn!(resource_id = %id, error = %e, "Resource lookup failed");
                    send(sender, position, not_found(*id, &request.action)).await;
                }
            }
        }
        groups
    }

    async fn run_group(
        &self,
        provider: CloudProvider,
        members: Vec<(usize, Resource)>,
        request: &CleanupRequest,
        sender: &mpsc::Sender<PositionedResult>,
    ) {
        let cleaner = match self.cleaner_for(provider, request).await {
            Ok(cleaner) => cleaner,
            Err(message) => {
                warn!(provider = %provider, error = %message, "Skipping provider group");
                for (position, resource) in members {
                    send(
                        sender,
                        position,
                        CleanupResult::failed(resource.id, &request.action, message.clone()),
                    )
                    .await;
                }
                return;
            }
        };

        let cleaner = cleaner.as_ref();
        stream::iter(members)
            .for_each_concurrent(self.config.max_concurrency.max(1), |(position, resource)| async move {
                let result = self.process(cleaner, resource, request).await;
                send(sender, position, result).await;
            })
            .await;
    }

    async fn cleaner_for(
        &self,
        provider: CloudProvider,
        request: &CleanupRequest,
    ) -> Result<Arc<dyn Cleaner>, String> {
        let resolved;
        let credentials = match (&self.credential_resolver, request.credentials.is_empty()) {
            (Some(resolver), true) => {
                resolved = resolver
                    .credentials(request.organization_id, provider)
                    .await
                    .map_err(|e| format!("failed to create cleaner: {e}"))?;
                &resolved
            }
            _ => &request.credentials,
        };
        self.registry
            .cleaner(provider, credentials)
            .await
            .map_err(|e| format!("failed to create cleaner: {e}"))
    }

    async fn process(
        &self,
        cleaner: &dyn Cleaner,
        resource: Resource,
        request: &CleanupRequest,
    ) -> CleanupResult {
        if request.dry_run {
            return CleanupResult::succeeded(
                resource.id,
                &request.action,
                resource.monthly_cost,
                resource.carbon_footprint,
            );
        }

        let Some(remediation) = Remediation::parse(&request.action) else {
            return CleanupResult::failed(resource.id, &request.action, messages::UNSUPPORTED_ACTION);
        };

        let Some(_lease) = self.leases.try_acquire(resource.id) else {
            debug!(resource_id = %resource.id, "Resource leased by another cleanup");
            return CleanupResult::failed(resource.id, &request.action, messages::CLEANUP_IN_PROGRESS);
        };

        // Another delivery may have finished this resource since it was resolved
        let mut resource = match self.resources.get(resource.id).await {
            Ok(Some(current)) => current,
            Ok(None) => resource,
            Err(e) => {
                debug!(resource_id = %resource.id, error = %e, "Re-read failed; using resolved copy");
                resource
            }
        };
        if resource.is_deleted() {
            return CleanupResult::already_applied(resource.id, &request.action);
        }

        let outcome = match remediation {
            Remediation::Delete => cleaner.delete(&resource).await,
            Remediation::Stop => cleaner.stop(&resource).await,
            Remediation::Tag => cleaner.tag(&resource, &marker_tags()).await,
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(resource_id = %resource.id, error = %e, "Remediation failed");
                return CleanupResult::failed(resource.id, &request.action, e.to_string());
            }
        };

        if result.success {
            resource.mark_as_deleted();
            if let Err(e) = self.resources.update(&resource).await {
                error!(
                    resource_id = %resource.id,
                    native_id = %resource.resource_id,
                    error = %e,
                    "Remediation succeeded but resource status could not be persisted"
                );
                self.emit(events::RESOURCE_STATUS_PERSIST_FAILED, json!({
                    "resource_id": resource.id,
                    "organization_id": resource.organization_id,
                    "provider": resource.provider,
                    "native_id": resource.resource_id,
                    "action": request.action,
                    "error": e.to_string(),
                }))
                .await;
            }
        }
        result
    }

    async fn emit(&self, name: &str, context: Value) {
        if let Err(e) = self.event_publisher.publish(name, context).await {
            warn!(event = %name, error = %e, "Failed to publish event");
        }
    }
}

fn marker_tags() -> Tags {
    let mut tags = Tags::new();
    tags.insert(
        MARKED_FOR_DELETION_TAG_KEY.to_string(),
        MARKED_FOR_DELETION_TAG_VALUE.to_string(),
    );
    tags
}

fn not_found(id: Uuid, action: &str) -> CleanupResult {
    CleanupResult::failed(id, action, messages::RESOURCE_NOT_FOUND)
}

async fn send(sender: &mpsc::Sender<PositionedResult>, position: usize, result: CleanupResult) {
    if sender
        .send(PositionedResult::new(position, result))
        .await
        .is_err()
    {
        error!(position, "Cleanup aggregator stopped before all results were recorded");
    }
}
