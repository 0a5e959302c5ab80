use super::provider::{CloudProvider, ResourceType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

pub type Tags = BTreeMap<String, String>;

/// Lifecycle status of a discovered resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Active,
    Unused,
    Deleted,
    Excluded,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Unused => "unused",
            Self::Deleted => "deleted",
            Self::Excluded => "excluded",
        }
    }

    /// Status to keep when a re-scan observes `incoming` for a stored resource.
    /// Only `active` may move; nothing is reactivated.
    pub fn merge_rescan(self, incoming: ResourceStatus) -> ResourceStatus {
        match self {
            Self::Active => match incoming {
                Self::Active | Self::Unused => incoming,
                // scanners do not decide deletion or exclusion
                Self::Deleted | Self::Excluded => self,
            },
            other => other,
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "unused" => Ok(Self::Unused),
            "deleted" => Ok(Self::Deleted),
            "excluded" => Ok(Self::Excluded),
            _ => Err(format!("Invalid resource status: {s}")),
        }
    }
}

/// Natural key of a resource within a tenant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub organization_id: Uuid,
    pub provider: CloudProvider,
    pub native_id: String,
}

/// A discovered cloud object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub provider: CloudProvider,
    pub resource_type: ResourceType,
    /// Provider-native identifier (instance id, bucket name, ...)
    pub resource_id: String,
    pub region: String,
    pub name: String,
    pub status: ResourceStatus,
    pub tags: Tags,
    pub metadata: HashMap<String, serde_json::Value>,
    pub monthly_cost: f64,
    #[serde(rename = "carbon_footprint_kg")]
    pub carbon_footprint: f64,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Create a freshly discovered resource. The organization id is nil until
    /// the scan orchestrator stamps it.
    pub fn new(
        provider: CloudProvider,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
        region: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            provider,
            resource_type,
            resource_id: resource_id.into(),
            region: region.into(),
            name: name.into(),
            status: ResourceStatus::Active,
            tags: Tags::new(),
            metadata: HashMap::new(),
            monthly_cost: 0.0,
            carbon_footprint: 0.0,
            last_seen_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            organization_id: self.organization_id,
            provider: self.provider,
            native_id: self.resource_id.clone(),
        }
    }

    pub fn mark_as_unused(&mut self) {
        self.status = ResourceStatus::Unused;
        self.updated_at = Utc::now();
    }

    pub fn mark_as_deleted(&mut self) {
        self.status = ResourceStatus::Deleted;
        self.updated_at = Utc::now();
    }

    pub fn is_unused(&self) -> bool {
        self.status == ResourceStatus::Unused
    }

    pub fn is_deleted(&self) -> bool {
        self.status == ResourceStatus::Deleted
    }

    /// Fold a re-observation into this stored resource, keeping its identity
    pub fn absorb_rescan(&mut self, observed: &Resource) {
        self.name = observed.name.clone();
        self.region = observed.region.clone();
        self.tags = observed.tags.clone();
        self.metadata = observed.metadata.clone();
        self.monthly_cost = observed.monthly_cost;
        self.carbon_footprint = observed.carbon_footprint;
        self.status = self.status.merge_rescan(observed.status);
        self.last_seen_at = observed.last_seen_at;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_resource_is_active_with_nil_org() {
        let r = Resource::new(
            CloudProvider::Aws,
            ResourceType::EbsVolume,
            "vol-123",
            "us-east-1",
            "data",
        );
        assert_eq!(r.status, ResourceStatus::Active);
        assert!(r.organization_id.is_nil());
        assert_eq!(r.monthly_cost, 0.0);
    }

    #[test]
    fn test_rescan_status_is_monotone() {
        use ResourceStatus::*;
        assert_eq!(Active.merge_rescan(Unused), Unused);
        assert_eq!(Unused.merge_rescan(Active), Unused);
        assert_eq!(Deleted.merge_rescan(Active), Deleted);
        assert_eq!(Excluded.merge_rescan(Unused), Excluded);
        assert_eq!(Active.merge_rescan(Deleted), Active);
    }

    #[test]
    fn test_absorb_rescan_keeps_identity() {
        let mut stored = Resource::new(
            CloudProvider::Aws,
            ResourceType::Ec2Instance,
            "i-1",
            "us-east-1",
            "old",
        );
        let original_id = stored.id;
        let mut observed = stored.clone();
        observed.id = Uuid::new_v4();
        observed.name = "new".into();
        observed.monthly_cost = 12.0;
        observed.status = ResourceStatus::Unused;

        stored.absorb_rescan(&observed);
        assert_eq!(stored.id, original_id);
        assert_eq!(stored.name, "new");
        assert_eq!(stored.monthly_cost, 12.0);
        assert!(stored.is_unused());
    }

    #[test]
    fn test_carbon_field_serialized_with_unit() {
        let r = Resource::new(CloudProvider::Gcp, ResourceType::GceDisk, "d", "eu", "d");
        let value = serde_json::to_value(&r).unwrap();
        assert!(value.get("carbon_footprint_kg").is_some());
        assert_eq!(value["status"], "active");
    }
}
