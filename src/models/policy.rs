use super::provider::{CloudProvider, ResourceType};
use super::resource::Tags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Remediation a policy may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    Notify,
    Tag,
    Stop,
    Delete,
}

impl PolicyAction {
    /// Remediation actions in the order a policy application runs them
    pub const REMEDIATIONS_BY_SEVERITY: [PolicyAction; 3] = [Self::Delete, Self::Stop, Self::Tag];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notify => "notify",
            Self::Tag => "tag",
            Self::Stop => "stop",
            Self::Delete => "delete",
        }
    }

    /// Whether this action is executed through a provider `Cleaner`
    pub fn is_remediation(&self) -> bool {
        !matches!(self, Self::Notify)
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PolicyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notify" => Ok(Self::Notify),
            "tag" => Ok(Self::Tag),
            "stop" => Ok(Self::Stop),
            "delete" => Ok(Self::Delete),
            _ => Err(format!("Invalid policy action: {s}")),
        }
    }
}

/// Declarative conditions; every absent field is satisfied
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConditions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unused_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_monthly_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_monthly_cost: Option<f64>,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub required_tags: Tags,
    #[serde(skip_serializing_if = "Tags::is_empty")]
    pub excluded_tags: Tags,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
    /// Glob over the display name (`*`, `?`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub provider: CloudProvider,
    /// Empty means every resource type of the provider
    pub resource_types: Vec<ResourceType>,
    pub conditions: PolicyConditions,
    pub actions: Vec<PolicyAction>,
    pub is_enabled: bool,
    /// Cron expression; evaluated by an external scheduler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    pub fn new(
        organization_id: Uuid,
        name: impl Into<String>,
        description: impl Into<String>,
        provider: CloudProvider,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.into(),
            description: description.into(),
            provider,
            resource_types: Vec::new(),
            conditions: PolicyConditions::default(),
            actions: Vec::new(),
            is_enabled: true,
            schedule: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_resource_types(mut self, resource_types: Vec<ResourceType>) -> Self {
        self.resource_types = resource_types;
        self
    }

    pub fn with_conditions(mut self, conditions: PolicyConditions) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn with_actions(mut self, actions: Vec<PolicyAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn enable(&mut self) {
        self.is_enabled = true;
        self.updated_at = Utc::now();
    }

    pub fn disable(&mut self) {
        self.is_enabled = false;
        self.updated_at = Utc::now();
    }

    pub fn has_action(&self, action: PolicyAction) -> bool {
        self.actions.contains(&action)
    }

    pub fn has_delete_action(&self) -> bool {
        self.has_action(PolicyAction::Delete)
    }

    /// Provider and resource-type scope check; conditions are evaluated by the policy engine
    pub fn applies_to(&self, provider: CloudProvider, resource_type: ResourceType) -> bool {
        self.provider == provider
            && (self.resource_types.is_empty() || self.resource_types.contains(&resource_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_policy_defaults() {
        let policy = Policy::new(Uuid::new_v4(), "idle", "idle volumes", CloudProvider::Aws);
        assert!(policy.is_enabled);
        assert!(policy.actions.is_empty());
        assert!(!policy.has_delete_action());
    }

    #[test]
    fn test_enable_disable() {
        let mut policy = Policy::new(Uuid::new_v4(), "p", "", CloudProvider::Gcp);
        policy.disable();
        assert!(!policy.is_enabled);
        policy.enable();
        assert!(policy.is_enabled);
    }

    #[test]
    fn test_applies_to_scope() {
        let policy = Policy::new(Uuid::new_v4(), "p", "", CloudProvider::Aws)
            .with_resource_types(vec![ResourceType::EbsVolume]);
        assert!(policy.applies_to(CloudProvider::Aws, ResourceType::EbsVolume));
        assert!(!policy.applies_to(CloudProvider::Aws, ResourceType::Ec2Instance));
        assert!(!policy.applies_to(CloudProvider::Azure, ResourceType::EbsVolume));

        let any_type = Policy::new(Uuid::new_v4(), "p", "", CloudProvider::Aws);
        assert!(any_type.applies_to(CloudProvider::Aws, ResourceType::S3Bucket));
    }

    #[test]
    fn test_conditions_deserialize_from_sparse_json() {
        let conditions: PolicyConditions =
            serde_json::from_str(r#"{"unused_days": 7, "excluded_tags": {"keep": "true"}}"#)
                .unwrap();
        assert_eq!(conditions.unused_days, Some(7));
        assert_eq!(conditions.excluded_tags.get("keep").map(String::as_str), Some("true"));
        assert!(conditions.name_pattern.is_none());
        assert!(conditions.regions.is_empty());
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("delete".parse::<PolicyAction>().unwrap(), PolicyAction::Delete);
        assert!("archive".parse::<PolicyAction>().is_err());
        assert!(!PolicyAction::Notify.is_remediation());
        assert!(PolicyAction::Tag.is_remediation());
    }
}
