//! # Repository Contracts
//!
//! Storage seams for the orchestrators. Every query is scoped through a filter
//! carrying the organization id; implementations never cross tenants unless
//! the filter leaves the organization unset.

use super::errors::PersistenceResult;
use crate::models::{CloudProvider, Policy, Resource, ResourceStatus, ResourceType, Scan};
use crate::state_machine::ScanState;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub organization_id: Option<Uuid>,
    pub provider: Option<CloudProvider>,
    pub resource_type: Option<ResourceType>,
    pub status: Option<ResourceStatus>,
    pub region: Option<String>,
    /// Skip resources already marked `deleted`
    pub exclude_deleted: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ResourceFilter {
    pub fn for_organization(organization_id: Uuid) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Default::default()
        }
    }

    pub fn provider(mut self, provider: CloudProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn status(mut self, status: ResourceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn exclude_deleted(mut self) -> Self {
        self.exclude_deleted = true;
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// In-process evaluation of the filter predicates (pagination excluded)
    pub fn accepts(&self, resource: &Resource) -> bool {
        self.organization_id
            .map_or(true, |org| resource.organization_id == org)
            && self.provider.map_or(true, |p| resource.provider == p)
            && self
                .resource_type
                .map_or(true, |t| resource.resource_type == t)
            && self.status.map_or(true, |s| resource.status == s)
            && self
                .region
                .as_ref()
                .map_or(true, |r| &resource.region == r)
            && !(self.exclude_deleted && resource.is_deleted())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanFilter {
    pub organization_id: Option<Uuid>,
    pub provider: Option<CloudProvider>,
    pub status: Option<ScanState>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ScanFilter {
    pub fn for_organization(organization_id: Uuid) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Default::default()
        }
    }

    pub fn accepts(&self, scan: &Scan) -> bool {
        self.organization_id
            .map_or(true, |org| scan.organization_id == org)
            && self.provider.map_or(true, |p| scan.provider == p)
            && self.status.map_or(true, |s| scan.status == s)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyFilter {
    pub organization_id: Option<Uuid>,
    pub provider: Option<CloudProvider>,
    pub is_enabled: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PolicyFilter {
    pub fn for_organization(organization_id: Uuid) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Default::default()
        }
    }

    pub fn accepts(&self, policy: &Policy) -> bool {
        self.organization_id
            .map_or(true, |org| policy.organization_id == org)
            && self.provider.map_or(true, |p| policy.provider == p)
            && self.is_enabled.map_or(true, |e| policy.is_enabled == e)
    }
}

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn create(&self, resource: &Resource) -> PersistenceResult<()>;

    async fn update(&self, resource: &Resource) -> PersistenceResult<()>;

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Resource>>;

    async fn list(&self, filter: &ResourceFilter) -> PersistenceResult<Vec<Resource>>;

    async fn count(&self, filter: &ResourceFilter) -> PersistenceResult<i64>;

    /// Insert or refresh by `(organization_id, provider, resource_id)`, all or nothing.
    /// Existing rows keep their id and never leave a non-active status.
    async fn bulk_upsert(&self, resources: &[Resource]) -> PersistenceResult<()>;

    async fn bulk_update(&self, resources: &[Resource]) -> PersistenceResult<()>;
}

#[async_trait]
pub trait ScanRepository: Send + Sync {
    async fn create(&self, scan: &Scan) -> PersistenceResult<()>;

    async fn update(&self, scan: &Scan) -> PersistenceResult<()>;

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Scan>>;

    /// Newest first
    async fn list(&self, filter: &ScanFilter) -> PersistenceResult<Vec<Scan>>;

    async fn latest(
        &self,
        organization_id: Uuid,
        provider: Option<CloudProvider>,
    ) -> PersistenceResult<Option<Scan>>;
}

#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn create(&self, policy: &Policy) -> PersistenceResult<()>;

    async fn update(&self, policy: &Policy) -> PersistenceResult<()>;

    async fn delete(&self, id: Uuid) -> PersistenceResult<()>;

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Policy>>;

    async fn list(&self, filter: &PolicyFilter) -> PersistenceResult<Vec<Policy>>;

    async fn enabled_for_organization(&self, organization_id: Uuid) -> PersistenceResult<Vec<Policy>>;
}
