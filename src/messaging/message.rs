//! # Task Messages
//!
//! Envelope and payload formats exchanged with the task transport. Payloads
//! are snake_case JSON; ids travel as UUID strings and are validated when the
//! payload is decoded.

use crate::constants::task_types;
use crate::error::{CloudSweepError, Result};
use crate::models::{CloudProvider, ResourceType};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A task as delivered by the transport (at least once)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub task_type: String,
    pub payload: Value,
    #[serde(default)]
    pub attempt: u32,
    #[serde(default = "Utc::now")]
    pub enqueued_at: DateTime<Utc>,
}

impl TaskEnvelope {
    pub fn new<P: Serialize>(task_type: impl Into<String>, payload: &P) -> Result<Self> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| CloudSweepError::validation(format!("unserializable payload: {e}")))?;
        Ok(Self {
            id: Uuid::new_v4(),
            task_type: task_type.into(),
            payload,
            attempt: 0,
            enqueued_at: Utc::now(),
        })
    }

    pub fn scan(payload: &ScanResourcesPayload) -> Result<Self> {
        Self::new(task_types::SCAN_RESOURCES, payload)
    }

    pub fn cleanup(payload: &CleanupResourcesPayload) -> Result<Self> {
        Self::new(task_types::CLEANUP_RESOURCES, payload)
    }

    pub fn apply_policy(payload: &ApplyPolicyPayload) -> Result<Self> {
        Self::new(task_types::APPLY_POLICY, payload)
    }

    pub fn notification(payload: &SendNotificationPayload) -> Result<Self> {
        Self::new(task_types::SEND_NOTIFICATION, payload)
    }

    /// Decode the payload; malformed JSON or ids become `Validation` errors
    pub fn decode<P: DeserializeOwned>(&self) -> Result<P> {
        serde_json::from_value(self.payload.clone()).map_err(|e| {
            CloudSweepError::validation(format!("invalid {} payload: {e}", self.task_type))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResourcesPayload {
    pub organization_id: Uuid,
    pub provider: CloudProvider,
    pub regions: Vec<String>,
    #[serde(default)]
    pub resource_types: Vec<ResourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupResourcesPayload {
    pub organization_id: Uuid,
    pub resource_ids: Vec<Uuid>,
    pub action: String,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyPolicyPayload {
    pub organization_id: Uuid,
    pub policy_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendNotificationPayload {
    /// Template or channel kind, e.g. `policy_matched`
    pub kind: String,
    pub to: String,
    pub subject: String,
    #[serde(default)]
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scan_payload_decodes_string_ids() {
        let org = Uuid::new_v4();
        let envelope = TaskEnvelope {
            id: Uuid::new_v4(),
            task_type: task_types::SCAN_RESOURCES.into(),
            payload: json!({
                "organization_id": org.to_string(),
                "provider": "aws",
                "regions": ["us-east-1"],
                "resource_types": ["ec2_instance"]
            }),
            attempt: 0,
            enqueued_at: Utc::now(),
        };
        let payload: ScanResourcesPayload = envelope.decode().unwrap();
        assert_eq!(payload.organization_id, org);
        assert_eq!(payload.resource_types, vec![ResourceType::Ec2Instance]);
        assert!(payload.scan_id.is_none());
    }

    #[test]
    fn test_malformed_uuid_is_validation_error() {
        let envelope = TaskEnvelope {
            id: Uuid::new_v4(),
            task_type: task_types::CLEANUP_RESOURCES.into(),
            payload: json!({
                "organization_id": "not-a-uuid",
                "resource_ids": [],
                "action": "delete"
            }),
            attempt: 0,
            enqueued_at: Utc::now(),
        };
        let err = envelope.decode::<CleanupResourcesPayload>().unwrap_err();
        assert!(matches!(err, CloudSweepError::Validation(_)));
        assert!(err.to_string().contains("cleanup:resources"));
    }

    #[test]
    fn test_envelope_defaults_when_fields_missing() {
        let envelope: TaskEnvelope = serde_json::from_value(json!({
            "task_type": "notification:send",
            "payload": {"kind": "k", "to": "t", "subject": "s"}
        }))
        .unwrap();
        assert_eq!(envelope.attempt, 0);
        let payload: SendNotificationPayload = envelope.decode().unwrap();
        assert_eq!(payload.data, Value::Null);
    }
}
