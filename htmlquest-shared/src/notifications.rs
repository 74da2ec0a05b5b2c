/// Admin realtime channel
///
/// An in-process publish/subscribe hub over a bounded `tokio::sync::broadcast`
/// channel. Delivery is best-effort: publishing with no subscribers is not an
/// error, and a subscriber that falls more than the buffer behind skips the
/// messages it missed. Nothing is replayed; consoles fetch the persisted feed
/// first and then follow the stream.
///
/// # Example
///
/// ```
/// use htmlquest_shared::notifications::{NotificationEvent, NotificationHub};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let hub = NotificationHub::new(16);
/// let mut rx = hub.subscribe();
///
/// hub.publish(NotificationEvent::system("user_registered", "New user", "ada@example.com"));
///
/// let event = rx.recv().await.unwrap();
/// assert_eq!(event.kind, "user_registered");
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::notification::AdminNotification;

pub const DEFAULT_BUFFER: usize = 256;

pub const KIND_BROADCAST: &str = "broadcast";
pub const KIND_USER_REGISTERED: &str = "user_registered";
pub const KIND_PROJECT_CREATED: &str = "project_created";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Feed row id, when the event was persisted
    pub id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn system(kind: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

impl From<&AdminNotification> for NotificationEvent {
    fn from(n: &AdminNotification) -> Self {
        Self {
            id: Some(n.id),
            kind: n.kind.clone(),
            title: n.title.clone(),
            body: n.body.clone(),
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<NotificationEvent>,
}

impl NotificationHub {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self { sender }
    }

    /// Publishes to current subscribers. Returns how many received it.
    pub fn publish(&self, event: NotificationEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Persists a system event to the feed and publishes it.
    ///
    /// Failures are logged; callers are never blocked by the admin channel.
    pub async fn record(&self, pool: &PgPool, kind: &str, title: &str, body: &str) {
        match AdminNotification::create(pool, kind, title, body).await {
            Ok(row) => {
                self.publish(NotificationEvent::from(&row));
            }
            Err(e) => {
                tracing::error!(kind, error = %e, "Failed to persist admin notification");
                self.publish(NotificationEvent::system(kind, title, body));
            }
        }
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    #[test]
    fn test_publish_without_subscribers() {
        let hub = NotificationHub::new(4);
        assert_eq!(hub.publish(NotificationEvent::system(KIND_BROADCAST, "t", "b")), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let hub = NotificationHub::new(4);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        let delivered = hub.publish(NotificationEvent::system(KIND_PROJECT_CREATED, "New project", "Portfolio"));
        assert_eq!(delivered, 2);

        assert_eq!(a.recv().await.unwrap().title, "New project");
        assert_eq!(b.recv().await.unwrap().kind, KIND_PROJECT_CREATED);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_missed_events() {
        let hub = NotificationHub::new(2);
        let mut rx = hub.subscribe();

        for i in 0..5 {
            hub.publish(NotificationEvent::system(KIND_BROADCAST, format!("n{}", i), ""));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(rx.recv().await.unwrap().title, "n3");
        assert_eq!(rx.recv().await.unwrap().title, "n4");
    }

    #[test]
    fn test_event_from_feed_row() {
        let row = AdminNotification {
            id: Uuid::new_v4(),
            kind: KIND_BROADCAST.to_string(),
            title: "Maintenance".to_string(),
            body: "Tonight".to_string(),
            read: false,
            created_at: Utc::now(),
        };

        let event = NotificationEvent::from(&row);
        assert_eq!(event.id, Some(row.id));
        assert_eq!(event.title, "Maintenance");
    }
}
