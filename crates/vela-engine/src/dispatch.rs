//! # Notification Dispatcher
//!
//! Persists notifications and fans them out to external channels.
//!
//! ## Delivery Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  dispatch(notification)                                                 │
//! │       │                                                                 │
//! │       ├── 1. INSERT into notifications  ← synchronous, errors surface   │
//! │       │                                                                 │
//! │       └── 2. try_send onto bounded queue ← never blocks the sale        │
//! │               │                                                         │
//! │               │   queue full → drop + warn (no back-pressure:           │
//! │               │   a slow mail relay must not slow checkout)             │
//! │               ▼                                                         │
//! │          delivery worker (spawned task)                                 │
//! │               ├── email task, 10s timeout                               │
//! │               └── SMS task, 5s timeout, body capped at 160 chars        │
//! │                                                                         │
//! │  Channel failures are logged and swallowed. The persisted record in     │
//! │  step 1 is the source of truth; external channels are best-effort.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{EmailConfig, SmsConfig};
use crate::error::EngineResult;
use vela_core::{Notification, SMS_BODY_MAX_CHARS};
use vela_db::NotificationRepository;

// =============================================================================
// Transport Seams
// =============================================================================

/// Errors from an outbound delivery channel. Logged, never propagated
/// to the sale that triggered the notification.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Gateway returned status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

/// Outbound email channel.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), TransportError>;
}

/// Outbound SMS channel. `body` is already capped at 160 characters.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    async fn send(&self, body: &str) -> Result<(), TransportError>;
}

// =============================================================================
// HTTP Transport Implementations
// =============================================================================

/// Email delivery through an HTTP mail relay.
pub struct HttpEmailTransport {
    client: reqwest::Client,
    config: EmailConfig,
}

impl HttpEmailTransport {
    pub fn new(config: EmailConfig) -> Self {
        HttpEmailTransport {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send(&self, subject: &str, body: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "to": self.config.recipient,
                "subject": subject,
                "body": body,
            }))
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}

/// SMS delivery through an HTTP gateway.
pub struct HttpSmsTransport {
    client: reqwest::Client,
    config: SmsConfig,
}

impl HttpSmsTransport {
    pub fn new(config: SmsConfig) -> Self {
        HttpSmsTransport {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl SmsTransport for HttpSmsTransport {
    async fn send(&self, body: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "to": self.config.recipient,
                "message": body,
            }))
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}

// =============================================================================
// SMS Body Cap
// =============================================================================

/// Caps an SMS body at [`SMS_BODY_MAX_CHARS`] characters, cutting on a
/// character boundary (never mid-codepoint).
pub fn truncate_sms(body: &str) -> String {
    if body.chars().count() <= SMS_BODY_MAX_CHARS {
        return body.to_string();
    }
    body.chars().take(SMS_BODY_MAX_CHARS).collect()
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Persists notifications and queues them for best-effort fan-out.
///
/// Cloning is cheap; every clone feeds the same delivery worker.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: NotificationRepository,
    queue: mpsc::Sender<Notification>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher and spawns its delivery worker.
    pub fn new(
        notifications: NotificationRepository,
        email: Option<Arc<dyn EmailTransport>>,
        sms: Option<Arc<dyn SmsTransport>>,
        queue_capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);

        let worker = DeliveryWorker { email, sms };
        tokio::spawn(worker.run(rx));

        NotificationDispatcher {
            notifications,
            queue: tx,
        }
    }

    /// Dispatches a notification.
    ///
    /// The database insert is synchronous: when this returns `Ok`, the
    /// record exists. Fan-out is queued; a full queue drops delivery
    /// (with a warning) rather than delaying or failing the caller.
    pub async fn dispatch(&self, notification: Notification) -> EngineResult<()> {
        self.notifications.insert(&notification).await?;

        match self.queue.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(n)) => {
                warn!(id = %n.id, "Notification queue full; skipping external delivery");
            }
            Err(mpsc::error::TrySendError::Closed(n)) => {
                warn!(id = %n.id, "Delivery worker gone; skipping external delivery");
            }
        }

        Ok(())
    }
}

/// Background task draining the delivery queue.
struct DeliveryWorker {
    email: Option<Arc<dyn EmailTransport>>,
    sms: Option<Arc<dyn SmsTransport>>,
}

impl DeliveryWorker {
    async fn run(self, mut rx: mpsc::Receiver<Notification>) {
        info!(
            email = self.email.is_some(),
            sms = self.sms.is_some(),
            "Notification delivery worker started"
        );

        while let Some(notification) = rx.recv().await {
            // Channels run in parallel: a stalled mail relay must not
            // delay the SMS, and vice versa.
            if let Some(email) = self.email.clone() {
                let n = notification.clone();
                tokio::spawn(async move {
                    match email.send(&n.title, &n.message).await {
                        Ok(()) => debug!(id = %n.id, "Email delivered"),
                        Err(err) => warn!(id = %n.id, error = %err, "Email delivery failed"),
                    }
                });
            } else {
                debug!(id = %notification.id, "Email transport not configured; skipping");
            }

            if let Some(sms) = self.sms.clone() {
                let n = notification.clone();
                tokio::spawn(async move {
                    let body = truncate_sms(&format!("{}: {}", n.title, n.message));
                    match sms.send(&body).await {
                        Ok(()) => debug!(id = %n.id, "SMS delivered"),
                        Err(err) => warn!(id = %n.id, error = %err, "SMS delivery failed"),
                    }
                });
            } else {
                debug!(id = %notification.id, "SMS transport not configured; skipping");
            }
        }

        info!("Notification delivery worker stopped");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use uuid::Uuid;
    use vela_core::NotificationKind;
    use vela_db::{Database, DbConfig};

    /// Test double that forwards every delivery to an inspection channel.
    struct RecordingEmail {
        sent: mpsc::UnboundedSender<(String, String)>,
    }

    #[async_trait]
    impl EmailTransport for RecordingEmail {
        async fn send(&self, subject: &str, body: &str) -> Result<(), TransportError> {
            let _ = self.sent.send((subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct RecordingSms {
        sent: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl SmsTransport for RecordingSms {
        async fn send(&self, body: &str) -> Result<(), TransportError> {
            let _ = self.sent.send(body.to_string());
            Ok(())
        }
    }

    fn sample(message: &str) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            kind: NotificationKind::Warning,
            title: "Low stock".to_string(),
            message: message.to_string(),
            product_id: Some("p1".to_string()),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    async fn recv_with_timeout<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("delivery timed out")
            .expect("channel closed")
    }

    #[test]
    fn test_truncate_sms() {
        assert_eq!(truncate_sms("short"), "short");

        let long = "x".repeat(200);
        let capped = truncate_sms(&long);
        assert_eq!(capped.chars().count(), SMS_BODY_MAX_CHARS);

        // Multi-byte characters are cut on a boundary, never split.
        let emoji = "📦".repeat(200);
        let capped = truncate_sms(&emoji);
        assert_eq!(capped.chars().count(), SMS_BODY_MAX_CHARS);
        assert!(capped.chars().all(|c| c == '📦'));
    }

    #[tokio::test]
    async fn test_dispatch_persists_then_delivers_to_both_channels() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (email_tx, mut email_rx) = mpsc::unbounded_channel();
        let (sms_tx, mut sms_rx) = mpsc::unbounded_channel();

        let dispatcher = NotificationDispatcher::new(
            db.notifications(),
            Some(Arc::new(RecordingEmail { sent: email_tx })),
            Some(Arc::new(RecordingSms { sent: sms_tx })),
            8,
        );

        dispatcher.dispatch(sample("3 left in stock")).await.unwrap();

        // Persisted synchronously.
        let stored = db.notifications().list(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].message, "3 left in stock");

        // Delivered asynchronously.
        let (subject, body) = recv_with_timeout(&mut email_rx).await;
        assert_eq!(subject, "Low stock");
        assert_eq!(body, "3 left in stock");

        let sms_body = recv_with_timeout(&mut sms_rx).await;
        assert_eq!(sms_body, "Low stock: 3 left in stock");
    }

    #[tokio::test]
    async fn test_sms_body_is_capped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (sms_tx, mut sms_rx) = mpsc::unbounded_channel();

        let dispatcher = NotificationDispatcher::new(
            db.notifications(),
            None,
            Some(Arc::new(RecordingSms { sent: sms_tx })),
            8,
        );

        dispatcher.dispatch(sample(&"y".repeat(300))).await.unwrap();

        let body = recv_with_timeout(&mut sms_rx).await;
        assert_eq!(body.chars().count(), SMS_BODY_MAX_CHARS);
    }

    #[tokio::test]
    async fn test_unconfigured_transports_still_persist() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dispatcher = NotificationDispatcher::new(db.notifications(), None, None, 8);

        dispatcher.dispatch(sample("quiet")).await.unwrap();

        assert_eq!(db.notifications().list(10).await.unwrap().len(), 1);
    }

    /// A stalled channel and a tiny queue never fail or block dispatch.
    #[tokio::test]
    async fn test_full_queue_drops_delivery_not_the_dispatch() {
        struct StalledEmail;

        #[async_trait]
        impl EmailTransport for StalledEmail {
            async fn send(&self, _: &str, _: &str) -> Result<(), TransportError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dispatcher =
            NotificationDispatcher::new(db.notifications(), Some(Arc::new(StalledEmail)), None, 1);

        for i in 0..20 {
            dispatcher.dispatch(sample(&format!("n{i}"))).await.unwrap();
        }

        // Every record persisted regardless of delivery backlog.
        assert_eq!(db.notifications().list(50).await.unwrap().len(), 20);
    }
}
