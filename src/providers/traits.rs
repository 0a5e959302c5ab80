//! # Provider Executor Contracts
//!
//! Per-cloud integrations implement [`Scanner`] and [`Cleaner`]; a
//! [`ProviderConnector`] turns credentials into instances of both and is what
//! gets registered with the [`ProviderRegistry`](super::ProviderRegistry).

use super::credentials::Credentials;
use super::errors::ProviderResult;
use crate::models::{CloudProvider, Resource, ResourceType, Tags};
use crate::reporting::CleanupResult;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Scanner: Send + Sync {
    /// Enumerate resources of `resource_types` in `regions`. An empty type list means all types.
    async fn discover(
        &self,
        regions: &[String],
        resource_types: &[ResourceType],
    ) -> ProviderResult<Vec<Resource>>;

    /// Mark resources the provider considers idle as `unused`, in place
    async fn classify_unused(&self, resources: &mut [Resource]) -> ProviderResult<()>;

    /// Monthly cost estimate in USD
    async fn estimate_cost(&self, resource: &Resource) -> ProviderResult<f64>;

    /// Monthly carbon estimate in kg CO2e
    async fn estimate_carbon(&self, resource: &Resource) -> ProviderResult<f64>;

    fn provider(&self) -> CloudProvider;
}

#[async_trait]
pub trait Cleaner: Send + Sync {
    async fn delete(&self, resource: &Resource) -> ProviderResult<CleanupResult>;

    async fn stop(&self, resource: &Resource) -> ProviderResult<CleanupResult>;

    async fn tag(&self, resource: &Resource, tags: &Tags) -> ProviderResult<CleanupResult>;

    fn provider(&self) -> CloudProvider;
}

/// Factory for one provider's Scanner/Cleaner, bound to a set of credentials
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    fn provider(&self) -> CloudProvider;

    async fn scanner(&self, credentials: &Credentials) -> ProviderResult<Arc<dyn Scanner>>;

    async fn cleaner(&self, credentials: &Credentials) -> ProviderResult<Arc<dyn Cleaner>>;
}
