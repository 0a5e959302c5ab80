//! # Provider Registry
//!
//! Maps each [`CloudProvider`] to the connector that builds its Scanner and
//! Cleaner. Built once at startup through [`ProviderRegistryBuilder`] and shared
//! read-only afterwards, so lookups take no locks.

use super::credentials::Credentials;
use super::errors::{ProviderError, ProviderResult};
use super::traits::{Cleaner, ProviderConnector, Scanner};
use crate::models::CloudProvider;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ProviderRegistry {
    connectors: HashMap<CloudProvider, Arc<dyn ProviderConnector>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// A registry with no providers; every lookup fails with `Unsupported`
    pub fn empty() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    pub fn supports(&self, provider: CloudProvider) -> bool {
        self.connectors.contains_key(&provider)
    }

    pub fn providers(&self) -> Vec<CloudProvider> {
        let mut providers: Vec<_> = self.connectors.keys().copied().collect();
        providers.sort();
        providers
    }

    fn connector(&self, provider: CloudProvider) -> ProviderResult<&Arc<dyn ProviderConnector>> {
        self.connectors
            .get(&provider)
            .ok_or(ProviderError::Unsupported { provider })
    }

    pub async fn scanner(
        &self,
        provider: CloudProvider,
        credentials: &Credentials,
    ) -> ProviderResult<Arc<dyn Scanner>> {
        debug!(provider = %provider, "Resolving scanner");
        self.connector(provider)?.scanner(credentials).await
    }

    pub async fn cleaner(
        &self,
        provider: CloudProvider,
        credentials: &Credentials,
    ) -> ProviderResult<Arc<dyn Cleaner>> {
        debug!(provider = %provider, "Resolving cleaner");
        self.connector(provider)?.cleaner(credentials).await
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[derive(Default)]
pub struct ProviderRegistryBuilder {
    connectors: HashMap<CloudProvider, Arc<dyn ProviderConnector>>,
}

impl ProviderRegistryBuilder {
    /// Register a connector under its own provider, replacing any earlier one
    pub fn register(mut self, connector: Arc<dyn ProviderConnector>) -> Self {
        let provider = connector.provider();
        if self.connectors.insert(provider, connector).is_some() {
            debug!(provider = %provider, "Replacing previously registered connector");
        }
        self
    }

    pub fn build(self) -> ProviderRegistry {
        let registry = ProviderRegistry {
            connectors: self.connectors,
        };
        info!(providers = ?registry.providers(), "Provider registry built");
        registry
    }
}
