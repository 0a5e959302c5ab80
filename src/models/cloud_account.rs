use super::provider::CloudProvider;
use crate::providers::Credentials;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A provider account connected by an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudAccount {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub provider: CloudProvider,
    /// Provider-native account, subscription or project id
    pub account_id: String,
    pub name: String,
    #[serde(skip)]
    pub credentials: Credentials,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CloudAccount {
    pub fn new(
        organization_id: Uuid,
        provider: CloudProvider,
        account_id: impl Into<String>,
        name: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            provider,
            account_id: account_id.into(),
            name: name.into(),
            credentials,
            is_active: true,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.last_sync_at = Some(at);
        self.updated_at = at;
    }
}
