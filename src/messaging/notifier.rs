use super::message::SendNotificationPayload;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Delivery seam for notifications; email/Slack/webhook transports live outside the core
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &SendNotificationPayload) -> Result<()>;
}

/// Records notifications in the structured log only
#[derive(Debug, Default, Clone)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, notification: &SendNotificationPayload) -> Result<()> {
        info!(
            kind = %notification.kind,
            to = %notification.to,
            subject = %notification.subject,
            "Notification requested"
        );
        Ok(())
    }
}
