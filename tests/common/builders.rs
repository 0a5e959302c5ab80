//! Fixtures shared by the integration tests: stored resources, wired-up
//! orchestrators, and a repository wrapper that injects persistence failures.

use async_trait::async_trait;
use cloudsweep_core::events::EventPublisher;
use cloudsweep_core::models::{CloudProvider, Resource, ResourceStatus, ResourceType};
use cloudsweep_core::orchestration::{CleanupOrchestrator, ScanOrchestrator};
use cloudsweep_core::providers::{ProviderConnector, ProviderRegistry};
use cloudsweep_core::repository::{
    InMemoryRepository, PersistenceError, PersistenceResult, ResourceFilter, ResourceRepository,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A discovered resource with cost and carbon already annotated
pub fn resource(
    provider: CloudProvider,
    resource_type: ResourceType,
    native_id: &str,
    region: &str,
    monthly_cost: f64,
    carbon: f64,
) -> Resource {
    let mut r = Resource::new(provider, resource_type, native_id, region, native_id);
    r.monthly_cost = monthly_cost;
    r.carbon_footprint = carbon;
    r
}

pub fn aws_instance(native_id: &str, monthly_cost: f64) -> Resource {
    resource(
        CloudProvider::Aws,
        ResourceType::Ec2Instance,
        native_id,
        "us-east-1",
        monthly_cost,
        monthly_cost / 10.0,
    )
}

/// Insert a resource owned by `organization_id` and return it as stored
pub async fn store(
    repo: &InMemoryRepository,
    organization_id: Uuid,
    mut resource: Resource,
    status: ResourceStatus,
) -> Resource {
    resource.organization_id = organization_id;
    resource.status = status;
    ResourceRepository::create(repo, &resource)
        .await
        .expect("Failed to store test resource");
    resource
}

pub fn registry_with(connectors: Vec<Arc<dyn ProviderConnector>>) -> Arc<ProviderRegistry> {
    let builder = connectors
        .into_iter()
        .fold(ProviderRegistry::builder(), |builder, c| builder.register(c));
    Arc::new(builder.build())
}

pub fn scan_orchestrator(
    registry: Arc<ProviderRegistry>,
    repo: Arc<InMemoryRepository>,
    events: EventPublisher,
) -> ScanOrchestrator {
    ScanOrchestrator::new(registry, repo.clone(), repo, events)
}

pub fn cleanup_orchestrator(
    registry: Arc<ProviderRegistry>,
    resources: Arc<dyn ResourceRepository>,
    events: EventPublisher,
) -> CleanupOrchestrator {
    CleanupOrchestrator::new(registry, resources, events)
}

/// Delegates to an `InMemoryRepository`, failing selected operations on demand
#[derive(Debug, Default)]
pub struct FlakyResourceRepository {
    pub inner: Arc<InMemoryRepository>,
    fail_updates: AtomicBool,
    fail_gets: AtomicBool,
    fail_bulk_upsert: AtomicBool,
}

impl FlakyResourceRepository {
    pub fn new(inner: Arc<InMemoryRepository>) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_bulk_upsert(&self, fail: bool) {
        self.fail_bulk_upsert.store(fail, Ordering::SeqCst);
    }

    fn injected(flag: &AtomicBool) -> PersistenceResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(PersistenceError::Database("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResourceRepository for FlakyResourceRepository {
    async fn create(&self, resource: &Resource) -> PersistenceResult<()> {
        ResourceRepository::create(self.inner.as_ref(), resource).await
    }

    async fn update(&self, resource: &Resource) -> PersistenceResult<()> {
        Self::injected(&self.fail_updates)?;
        ResourceRepository::update(self.inner.as_ref(), resource).await
    }

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Resource>> {
        Self::injected(&self.fail_gets)?;
        ResourceRepository::get(self.inner.as_ref(), id).await
    }

    async fn list(&self, filter: &ResourceFilter) -> PersistenceResult<Vec<Resource>> {
        ResourceRepository::list(self.inner.as_ref(), filter).await
    }

    async fn count(&self, filter: &ResourceFilter) -> PersistenceResult<i64> {
        ResourceRepository::count(self.inner.as_ref(), filter).await
    }

    async fn bulk_upsert(&self, resources: &[Resource]) -> PersistenceResult<()> {
        Self::injected(&self.fail_bulk_upsert)?;
        self.inner.bulk_upsert(resources).await
    }

    async fn bulk_update(&self, resources: &[Resource]) -> PersistenceResult<()> {
        Self::injected(&self.fail_updates)?;
        self.inner.bulk_update(resources).await
    }
}
