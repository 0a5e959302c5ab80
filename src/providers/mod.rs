//! # Cloud Providers
//!
//! Contracts every cloud integration implements, the registry that resolves
//! them by provider, and credential plumbing. Concrete AWS/Azure/GCP clients
//! live in embedding crates.

pub mod credentials;
pub mod errors;
pub mod registry;
pub mod traits;

pub use credentials::{CredentialResolver, Credentials, InMemoryCredentialResolver};
pub use errors::{ProviderError, ProviderResult};
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
pub use traits::{Cleaner, ProviderConnector, Scanner};
