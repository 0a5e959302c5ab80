pub mod cloud_account;
pub mod organization;
pub mod policy;
pub mod provider;
pub mod resource;
pub mod scan;

// Re-export core models for easy access
pub use cloud_account::CloudAccount;
pub use organization::Organization;
pub use policy::{Policy, PolicyAction, PolicyConditions};
pub use provider::{CloudProvider, ResourceType};
pub use resource::{Resource, ResourceKey, ResourceStatus, Tags};
pub use scan::Scan;
