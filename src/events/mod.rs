//! Lifecycle event publishing over a tokio broadcast channel.

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};
