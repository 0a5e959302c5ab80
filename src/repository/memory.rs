//! `DashMap`-backed repository used by tests and single-process deployments.

use super::errors::{PersistenceError, PersistenceResult};
use super::traits::{
    PolicyFilter, PolicyRepository, ResourceFilter, ResourceRepository, ScanFilter,
    ScanRepository,
};
use crate::models::{CloudProvider, Policy, Resource, ResourceKey, Scan};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    resources: DashMap<Uuid, Resource>,
    /// Natural key index; always locked before `resources`
    resource_keys: DashMap<ResourceKey, Uuid>,
    scans: DashMap<Uuid, Scan>,
    policies: DashMap<Uuid, Policy>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    fn upsert_one(&self, observed: &Resource) {
        match self.resource_keys.entry(observed.key()) {
            Entry::Occupied(entry) => {
                let id = *entry.get();
                match self.resources.get_mut(&id) {
                    Some(mut stored) => stored.absorb_rescan(observed),
                    None => {
                        self.resources.insert(id, Resource { id, ..observed.clone() });
                    }
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(observed.id);
                self.resources.insert(observed.id, observed.clone());
            }
        }
    }
}

fn paginate<T>(items: Vec<T>, limit: Option<i64>, offset: Option<i64>) -> Vec<T> {
    let offset = offset.and_then(|o| usize::try_from(o).ok()).unwrap_or(0);
    let iter = items.into_iter().skip(offset);
    match limit.and_then(|l| usize::try_from(l).ok()) {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

#[async_trait]
impl ResourceRepository for InMemoryRepository {
    async fn create(&self, resource: &Resource) -> PersistenceResult<()> {
        match self.resource_keys.entry(resource.key()) {
            Entry::Occupied(_) => Err(PersistenceError::Conflict {
                entity: "resource",
                key: format!("{}/{}", resource.provider, resource.resource_id),
            }),
            Entry::Vacant(entry) => {
                entry.insert(resource.id);
                self.resources.insert(resource.id, resource.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, resource: &Resource) -> PersistenceResult<()> {
        match self.resources.get_mut(&resource.id) {
            Some(mut stored) => {
                *stored = resource.clone();
                Ok(())
            }
            None => Err(PersistenceError::not_found("resource", resource.id)),
        }
    }

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Resource>> {
        Ok(self.resources.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self, filter: &ResourceFilter) -> PersistenceResult<Vec<Resource>> {
        let mut matched: Vec<Resource> = self
            .resources
            .iter()
            .filter(|r| filter.accepts(r.value()))
            .map(|r| r.value().clone())
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(matched, filter.limit, filter.offset))
    }

    async fn count(&self, filter: &ResourceFilter) -> PersistenceResult<i64> {
        let count = self
            .resources
            .iter()
            .filter(|r| filter.accepts(r.value()))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn bulk_upsert(&self, resources: &[Resource]) -> PersistenceResult<()> {
        for resource in resources {
            self.upsert_one(resource);
        }
        Ok(())
    }

    async fn bulk_update(&self, resources: &[Resource]) -> PersistenceResult<()> {
        if let Some(missing) = resources.iter().find(|r| !self.resources.contains_key(&r.id)) {
            return Err(PersistenceError::not_found("resource", missing.id));
        }
        for resource in resources {
            self.resources.insert(resource.id, resource.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl ScanRepository for InMemoryRepository {
    async fn create(&self, scan: &Scan) -> PersistenceResult<()> {
        match self.scans.entry(scan.id) {
            Entry::Occupied(_) => Err(PersistenceError::Conflict {
                entity: "scan",
                key: scan.id.to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(scan.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, scan: &Scan) -> PersistenceResult<()> {
        match self.scans.get_mut(&scan.id) {
            Some(mut stored) => {
                *stored = scan.clone();
                Ok(())
            }
            None => Err(PersistenceError::not_found("scan", scan.id)),
        }
    }

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Scan>> {
        Ok(self.scans.get(&id).map(|s| s.value().clone()))
    }

    async fn list(&self, filter: &ScanFilter) -> PersistenceResult<Vec<Scan>> {
        let mut matched: Vec<Scan> = self
            .scans
            .iter()
            .filter(|s| filter.accepts(s.value()))
            .map(|s| s.value().clone())
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(matched, filter.limit, filter.offset))
    }

    async fn latest(
        &self,
        organization_id: Uuid,
        provider: Option<CloudProvider>,
    ) -> PersistenceResult<Option<Scan>> {
        let filter = ScanFilter {
            provider,
            ..ScanFilter::for_organization(organization_id)
        };
        Ok(ScanRepository::list(self, &filter).await?.into_iter().next())
    }
}

#[async_trait]
impl PolicyRepository for InMemoryRepository {
    async fn create(&self, policy: &Policy) -> PersistenceResult<()> {
        match self.policies.entry(policy.id) {
            Entry::Occupied(_) => Err(PersistenceError::Conflict {
                entity: "policy",
                key: policy.id.to_string(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(policy.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, policy: &Policy) -> PersistenceResult<()> {
        match self.policies.get_mut(&policy.id) {
            Some(mut stored) => {
                *stored = policy.clone();
                Ok(())
            }
            None => Err(PersistenceError::not_found("policy", policy.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> PersistenceResult<()> {
        self.policies
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("policy", id))
    }

    async fn get(&self, id: Uuid) -> PersistenceResult<Option<Policy>> {
        Ok(self.policies.get(&id).map(|p| p.value().clone()))
    }

    async fn list(&self, filter: &PolicyFilter) -> PersistenceResult<Vec<Policy>> {
        let mut matched: Vec<Policy> = self
            .policies
            .iter()
            .filter(|p| filter.accepts(p.value()))
            .map(|p| p.value().clone())
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(matched, filter.limit, filter.offset))
    }

    async fn enabled_for_organization(&self, organization_id: Uuid) -> PersistenceResult<Vec<Policy>> {
        let filter = PolicyFilter {
            is_enabled: Some(true),
            ..PolicyFilter::for_organization(organization_id)
        };
        PolicyRepository::list(self, &filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResourceStatus, ResourceType};

    fn instance(org: Uuid, native_id: &str) -> Resource {
        let mut r = Resource::new(
            CloudProvider::Aws,
            ResourceType::Ec2Instance,
            native_id,
            "us-east-1",
            native_id,
        );
        r.organization_id = org;
        r
    }

    #[tokio::test]
    async fn test_bulk_upsert_is_keyed_by_natural_key() {
        let repo = InMemoryRepository::new();
        let org = Uuid::new_v4();

        let first = instance(org, "i-1");
        repo.bulk_upsert(&[first.clone()]).await.unwrap();

        let mut rescan = instance(org, "i-1");
        rescan.monthly_cost = 30.0;
        repo.bulk_upsert(&[rescan]).await.unwrap();

        assert_eq!(repo.resource_count(), 1);
        let stored = ResourceRepository::get(&repo, first.id).await.unwrap().unwrap();
        assert_eq!(stored.monthly_cost, 30.0);
    }

    #[tokio::test]
    async fn test_upsert_never_reactivates() {
        let repo = InMemoryRepository::new();
        let org = Uuid::new_v4();

        let mut deleted = instance(org, "i-2");
        deleted.mark_as_deleted();
        ResourceRepository::create(&repo, &deleted).await.unwrap();

        repo.bulk_upsert(&[instance(org, "i-2")]).await.unwrap();
        let stored = ResourceRepository::get(&repo, deleted.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ResourceStatus::Deleted);
    }

    #[tokio::test]
    async fn test_same_native_id_in_other_org_is_distinct() {
        let repo = InMemoryRepository::new();
        repo.bulk_upsert(&[instance(Uuid::new_v4(), "i-3"), instance(Uuid::new_v4(), "i-3")])
            .await
            .unwrap();
        assert_eq!(repo.resource_count(), 2);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_natural_key() {
        let repo = InMemoryRepository::new();
        let org = Uuid::new_v4();
        ResourceRepository::create(&repo, &instance(org, "i-4")).await.unwrap();
        let err = ResourceRepository::create(&repo, &instance(org, "i-4"))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_filters_and_pagination() {
        let repo = InMemoryRepository::new();
        let org = Uuid::new_v4();
        let mut unused = instance(org, "i-5");
        unused.mark_as_unused();
        repo.bulk_upsert(&[instance(org, "i-6"), unused, instance(Uuid::new_v4(), "i-7")])
            .await
            .unwrap();

        let filter = ResourceFilter::for_organization(org);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);
        assert_eq!(
            repo.count(&filter.clone().status(ResourceStatus::Unused))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            ResourceRepository::list(&repo, &filter.page(1, 1))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_policy_crud_and_enabled_lookup() {
        let repo = InMemoryRepository::new();
        let org = Uuid::new_v4();
        let enabled = Policy::new(org, "a", "", CloudProvider::Aws);
        let mut disabled = Policy::new(org, "b", "", CloudProvider::Aws);
        disabled.disable();

        PolicyRepository::create(&repo, &enabled).await.unwrap();
        PolicyRepository::create(&repo, &disabled).await.unwrap();

        let active = repo.enabled_for_organization(org).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, enabled.id);

        PolicyRepository::delete(&repo, enabled.id).await.unwrap();
        assert!(PolicyRepository::get(&repo, enabled.id).await.unwrap().is_none());
        assert!(PolicyRepository::delete(&repo, enabled.id).await.is_err());
    }
}
