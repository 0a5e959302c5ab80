//! # Messaging
//!
//! Task envelope and payload formats, the dispatcher that routes them to the
//! orchestrators, and the notification seam.

pub mod dispatcher;
pub mod message;
pub mod notifier;

pub use dispatcher::{TaskDispatcher, TaskOutcome};
pub use message::{
    ApplyPolicyPayload, CleanupResourcesPayload, ScanResourcesPayload, SendNotificationPayload,
    TaskEnvelope,
};
pub use notifier::{LoggingNotifier, Notifier};
