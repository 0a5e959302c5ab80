//! # Scan Orchestrator
//!
//! Turns a provider + regions + resource types request into a persisted
//! inventory annotated with unused status, cost and carbon.
//!
//! ## Flow
//!
//! ```text
//! create scan (pending) -> start (running) -> scanner from registry
//!   -> discover -> stamp organization -> collapse by natural key
//!   -> classify unused -> estimate cost/carbon (bounded, ordered)
//!   -> merge with stored statuses -> cancellation check
//!   -> bulk upsert -> complete
//! ```
//!
//! Any failure after the scan row exists routes through the fail path, which
//! records the message on the scan unless it was cancelled in the meantime.
//! Resources become durable only in the single bulk upsert near the end.

use super::types::ScanRequest;
use crate::config::ScanConfig;
use crate::constants::events;
use crate::error::{CloudSweepError, Result};
use crate::events::EventPublisher;
use crate::models::{Resource, ResourceKey, ResourceStatus, Scan};
use crate::providers::{ProviderRegistry, Scanner};
use crate::reporting::ScanReport;
use crate::repository::{ResourceFilter, ResourceRepository, ScanRepository};
use crate::state_machine::ScanState;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn, Span};

/// How an incoming request relates to an existing scan row
enum ScanStart {
    /// Redelivery of a scan that already completed
    AlreadyCompleted(ScanReport),
    Proceed(Scan),
}

pub struct ScanOrchestrator {
    registry: Arc<ProviderRegistry>,
    resources: Arc<dyn ResourceRepository>,
    scans: Arc<dyn ScanRepository>,
    event_publisher: EventPublisher,
    config: ScanConfig,
}

impl ScanOrchestrator {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        resources: Arc<dyn ResourceRepository>,
        scans: Arc<dyn ScanRepository>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self::with_config(
            registry,
            resources,
            scans,
            event_publisher,
            ScanConfig::default(),
        )
    }

    pub fn with_config(
        registry: Arc<ProviderRegistry>,
        resources: Arc<dyn ResourceRepository>,
        scans: Arc<dyn ScanRepository>,
        event_publisher: EventPublisher,
        config: ScanConfig,
    ) -> Self {
        Self {
            registry,
            resources,
            scans,
            event_publisher,
            config,
        }
    }

    #[instrument(
        skip(self, request),
        fields(
            organization_id = %request.organization_id,
            provider = %request.provider,
            scan_id = tracing::field::Empty
        )
    )]
    pub async fn run_scan(&self, request: ScanRequest) -> Result<ScanReport> {
        request.validate()?;

        let mut scan = match self.begin(&request).await? {
            ScanStart::AlreadyCompleted(report) => {
                info!(scan_id = %report.scan_id, "Scan already completed, returning stored report");
                return Ok(report);
            }
            ScanStart::Proceed(scan) => scan,
        };
        Span::current().record("scan_id", tracing::field::display(scan.id));

        match self.execute(&mut scan, &request).await {
            Ok(report) => Ok(report),
            Err(CloudSweepError::ScanCancelled(id)) => {
                info!(scan_id = %id, "Scan cancelled before inventory was written");
                self.emit(events::SCAN_CANCELLED, json!({
                    "scan_id": id,
                    "organization_id": scan.organization_id,
                }))
                .await;
                Err(CloudSweepError::ScanCancelled(id))
            }
            Err(e) => {
                self.fail(&mut scan, &e).await;
                Err(e)
            }
        }
    }

    /// Create the scan row, or pick up an existing one on redelivery
    async fn begin(&self, request: &ScanRequest) -> Result<ScanStart> {
        if let Some(scan_id) = request.scan_id {
            if let Some(existing) = self.scans.get(scan_id).await? {
                if existing.organization_id != request.organization_id {
                    return Err(CloudSweepError::not_found("scan", scan_id));
                }
                return match existing.status {
                    ScanState::Completed => Ok(ScanStart::AlreadyCompleted(ScanReport::from(
                        &existing,
                    ))),
                    ScanState::Cancelled => Err(CloudSweepError::ScanCancelled(scan_id)),
                    ScanState::Pending | ScanState::Running => {
                        debug!(scan_id = %scan_id, status = %existing.status, "Resuming redelivered scan");
                        Ok(ScanStart::Proceed(existing))
                    }
                    ScanState::Failed => Err(CloudSweepError::UnsupportedOperation(format!(
                        "scan {scan_id} already failed; submit a new scan id to retry"
                    ))),
                };
            }
        }

        let scan = match request.scan_id {
            Some(id) => Scan::with_id(
                id,
                request.organization_id,
                request.provider,
                request.regions.clone(),
                request.resource_types.clone(),
            ),
            None => Scan::new(
                request.organization_id,
                request.provider,
                request.regions.clone(),
                request.resource_types.clone(),
            ),
        };
        self.scans.create(&scan).await?;
        debug!(scan_id = %scan.id, "Scan record created");
        Ok(ScanStart::Proceed(scan))
    }

    async fn execute(&self, scan: &mut Scan, request: &ScanRequest) -> Result<ScanReport> {
        if scan.status == ScanState::Pending {
            scan.start()?;
            self.scans.update(scan).await?;
            self.emit(events::SCAN_STARTED, scan_context(scan)).await;
        }

        let scanner = self
            .registry
            .scanner(request.provider, &request.credentials)
            .await?;

        let mut discovered = scanner
            .discover(&request.regions, &request.resource_types)
            .await?;
        for resource in discovered.iter_mut() {
            resource.organization_id = request.organization_id;
        }
        let listed = discovered.len();
        let mut discovered = collapse_by_key(discovered);
        debug!(listed, count = discovered.len(), "Resources discovered");

        scanner.classify_unused(&mut discovered).await?;
        self.annotate_estimates(scanner.as_ref(), &mut discovered)
            .await;

        let stored = self.stored_statuses(request).await?;
        let (unused_found, estimated_savings, carbon_savings) =
            unused_totals(&discovered, &stored);

        if let Some(stored) = self.scans.get(scan.id).await? {
            if stored.status == ScanState::Cancelled {
                *scan = stored;
                return Err(CloudSweepError::ScanCancelled(scan.id));
            }
        }

        self.resources.bulk_upsert(&discovered).await?;

        scan.complete(
            discovered.len(),
            unused_found,
            estimated_savings,
            carbon_savings,
        )?;
        self.scans.update(scan).await?;

        let report = ScanReport::from(&*scan);
        info!(
            resources_found = report.resources_found,
            unused_found = report.unused_found,
            estimated_savings = report.estimated_savings,
            carbon_savings = report.carbon_savings,
            "Scan completed"
        );
        self.emit(events::SCAN_COMPLETED, json!({
            "scan_id": report.scan_id,
            "organization_id": scan.organization_id,
            "resources_found": report.resources_found,
            "unused_found": report.unused_found,
            "estimated_savings": report.estimated_savings,
            "carbon_savings_kg": report.carbon_savings,
        }))
        .await;
        Ok(report)
    }

    /// Statuses already in the inventory for this organization and provider, by native id
    async fn stored_statuses(&self, request: &ScanRequest) -> Result<HashMap<String, ResourceStatus>> {
        let filter =
            ResourceFilter::for_organization(request.organization_id).provider(request.provider);
        Ok(self
            .resources
            .list(&filter)
            .await?
            .into_iter()
            .map(|r| (r.resource_id, r.status))
            .collect())
    }

    /// Best-effort cost and carbon estimates; a failed estimate leaves 0.0
    async fn annotate_estimates(&self, scanner: &dyn Scanner, resources: &mut [Resource]) {
        let estimates: Vec<(f64, f64)> = stream::iter(resources.iter())
            .map(|resource| async move {
                let (cost, carbon) = futures::join!(
                    scanner.estimate_cost(resource),
                    scanner.estimate_carbon(resource)
                );
                let cost = cost.unwrap_or_else(|e| {
                    warn!(resource_id = %resource.resource_id, error = %e, "Cost estimate failed");
                    0.0
                });
                let carbon = carbon.unwrap_or_else(|e| {
                    warn!(resource_id = %resource.resource_id, error = %e, "Carbon estimate failed");
                    0.0
                });
                (cost, carbon)
            })
            .buffered(self.config.estimate_concurrency.max(1))
            .collect()
            .await;

        for (resource, (cost, carbon)) in resources.iter_mut().zip(estimates) {
            resource.monthly_cost = cost;
            resource.carbon_footprint = carbon;
        }
    }

    /// Record the failure unless the scan was cancelled in the meantime
    async fn fail(&self, scan: &mut Scan, cause: &CloudSweepError) {
        match self.scans.get(scan.id).await {
            Ok(Some(stored)) if stored.status == ScanState::Cancelled => {
                info!(scan_id = %scan.id, error = %cause, "Scan cancelled; not recording failure");
                *scan = stored;
                return;
            }
            Ok(Some(stored)) => *scan = stored,
            Ok(None) => {}
            Err(e) => warn!(scan_id = %scan.id, error = %e, "Could not reload scan before failing it"),
        }

        let message = cause.to_string();
        if let Err(e) = scan.fail(message.clone()) {
            warn!(scan_id = %scan.id, status = %scan.status, error = %e, "Scan cannot be marked failed");
            return;
        }
        if let Err(e) = self.scans.update(scan).await {
            error!(scan_id = %scan.id, error = %e, "Failed to persist scan failure");
        }

        warn!(scan_id = %scan.id, error = %message, "Scan failed");
        self.emit(events::SCAN_FAILED, json!({
            "scan_id": scan.id,
            "organization_id": scan.organization_id,
            "error": message,
        }))
        .await;
    }

    async fn emit(&self, name: &str, context: Value) {
        if let Err(e) = self.event_publisher.publish(name, context).await {
            warn!(event = %name, error = %e, "Failed to publish event");
        }
    }
}

fn scan_context(scan: &Scan) -> Value {
    json!({
        "scan_id": scan.id,
        "organization_id": scan.organization_id,
        "provider": scan.provider,
        "regions": scan.regions,
    })
}

/// One resource per natural key; the last listing wins, at the position of the first
fn collapse_by_key(resources: Vec<Resource>) -> Vec<Resource> {
    let mut positions: HashMap<ResourceKey, usize> = HashMap::with_capacity(resources.len());
    let mut unique: Vec<Resource> = Vec::with_capacity(resources.len());
    for resource in resources {
        match positions.get(&resource.key()) {
            Some(&index) => unique[index] = resource,
            None => {
                positions.insert(resource.key(), unique.len());
                unique.push(resource);
            }
        }
    }
    unique
}

/// Count and sums over resources whose status after the rescan merge is `unused`
fn unused_totals(
    resources: &[Resource],
    stored: &HashMap<String, ResourceStatus>,
) -> (usize, f64, f64) {
    resources
        .iter()
        .filter(|r| {
            let merged = stored
                .get(&r.resource_id)
                .map_or(r.status, |current| current.merge_rescan(r.status));
            merged == ResourceStatus::Unused
        })
        .fold((0, 0.0, 0.0), |(count, cost, carbon), r| {
            (count + 1, cost + r.monthly_cost, carbon + r.carbon_footprint)
        })
}
