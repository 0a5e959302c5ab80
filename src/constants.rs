//! # System Constants
//!
//! Task type names, lifecycle event names, and the fixed strings that appear in
//! cleanup reports.

/// Task types consumed from the queue transport
pub mod task_types {
    pub const SCAN_RESOURCES: &str = "scan:resources";
    pub const CLEANUP_RESOURCES: &str = "cleanup:resources";
    pub const APPLY_POLICY: &str = "policy:apply";
    pub const SEND_NOTIFICATION: &str = "notification:send";
}

/// Lifecycle events published through the injected `EventPublisher`
pub mod events {
    pub const SCAN_STARTED: &str = "scan.started";
    pub const SCAN_COMPLETED: &str = "scan.completed";
    pub const SCAN_FAILED: &str = "scan.failed";
    pub const SCAN_CANCELLED: &str = "scan.cancelled";

    pub const CLEANUP_COMPLETED: &str = "cleanup.completed";
    /// Remediation succeeded on the provider but the `deleted` status could not be stored
    pub const RESOURCE_STATUS_PERSIST_FAILED: &str = "resource.status_persist_failed";

    pub const POLICY_APPLIED: &str = "policy.applied";
    pub const NOTIFICATION_REQUESTED: &str = "notification.requested";
}

/// Messages surfaced in `CleanupResult::error_message`
pub mod messages {
    pub const RESOURCE_NOT_FOUND: &str = "resource not found";
    pub const UNSUPPORTED_ACTION: &str = "unsupported action";
    pub const CLEANUP_IN_PROGRESS: &str = "cleanup already in progress";
}

/// Tag applied by the `tag` cleanup action
pub const MARKED_FOR_DELETION_TAG_KEY: &str = "cloudsweep:marked-for-deletion";
pub const MARKED_FOR_DELETION_TAG_VALUE: &str = "true";

pub const DEFAULT_CLEANUP_CONCURRENCY: usize = 8;
pub const DEFAULT_ESTIMATE_CONCURRENCY: usize = 16;
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Number of resource types kept in the by-type savings breakdown
pub const TOP_RESOURCE_TYPES: usize = 10;
