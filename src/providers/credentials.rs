//! Opaque provider credentials and the resolver that supplies them to task handlers.

use crate::models::{CloudAccount, CloudProvider};
use crate::providers::errors::{ProviderError, ProviderResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Encrypted credential blob. Only provider connectors interpret the bytes.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials(Vec<u8>);

impl Credentials {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials([REDACTED; {} bytes])", self.0.len())
    }
}

impl From<Vec<u8>> for Credentials {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Looks up the credentials an organization connected for a provider.
/// Task payloads carry no secrets; the dispatcher resolves them here.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn credentials(
        &self,
        organization_id: Uuid,
        provider: CloudProvider,
    ) -> ProviderResult<Credentials>;
}

/// Resolver over registered `CloudAccount`s; the most recently added active account wins
#[derive(Debug, Default)]
pub struct InMemoryCredentialResolver {
    accounts: RwLock<HashMap<(Uuid, CloudProvider), CloudAccount>>,
}

impl InMemoryCredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, account: CloudAccount) {
        if !account.is_active {
            return;
        }
        self.accounts
            .write()
            .insert((account.organization_id, account.provider), account);
    }
}

#[async_trait]
impl CredentialResolver for InMemoryCredentialResolver {
    async fn credentials(
        &self,
        organization_id: Uuid,
        provider: CloudProvider,
    ) -> ProviderResult<Credentials> {
        self.accounts
            .read()
            .get(&(organization_id, provider))
            .map(|account| account.credentials.clone())
            .ok_or_else(|| {
                ProviderError::credentials_invalid(
                    provider,
                    format!("no connected account for organization {organization_id}"),
                )
            })
    }
}
