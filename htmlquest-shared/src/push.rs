/// Push notification delivery
///
/// Handlers never wait on delivery: [`spawn_to_user`] and [`spawn_to_all`]
/// look up tokens and send from a detached task. Tokens are sent one by one;
/// a failure for one token is logged and the loop moves on. There is no
/// batching, backoff or retry.
///
/// The HTTP gateway posts one message per token:
///
/// ```text
/// POST {PUSH_GATEWAY_URL}
/// { "to": "<device token>", "title": "...", "body": "..." }
/// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use crate::models::device_token::DeviceToken;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Push request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push gateway returned HTTP {0}")]
    Status(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError>;
}

#[derive(Debug, Serialize)]
struct GatewayPayload<'a> {
    to: &'a str,
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpPushGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPushGateway {
    /// `timeout` bounds each request so one stuck token cannot stall a fan-out.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

/// Shortens a device token for logs.
pub fn redact_token(token: &str) -> String {
    const VISIBLE: usize = 8;

    if token.chars().count() <= VISIBLE {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(VISIBLE).collect();
    format!("{}...", prefix)
}

#[async_trait]
impl PushGateway for HttpPushGateway {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GatewayPayload {
                to: token,
                title: &message.title,
                body: &message.body,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }

        Ok(())
    }
}

/// Gateway used when push is switched off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPushGateway;

#[async_trait]
impl PushGateway for DisabledPushGateway {
    async fn send(&self, token: &str, _message: &PushMessage) -> Result<(), PushError> {
        tracing::trace!(token = %redact_token(token), "Push disabled, dropping message");
        Ok(())
    }
}

/// Sends `message` to each token in order. Returns how many succeeded.
pub async fn dispatch(gateway: &dyn PushGateway, tokens: &[String], message: &PushMessage) -> usize {
    let mut delivered = 0;

    for token in tokens {
        match gateway.send(token, message).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!(token = %redact_token(token), error = %e, "Push delivery failed");
            }
        }
    }

    delivered
}

/// Pushes to every device of `user_id` without blocking the caller.
pub fn spawn_to_user(
    pool: PgPool,
    gateway: Arc<dyn PushGateway>,
    user_id: Uuid,
    message: PushMessage,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        match DeviceToken::tokens_for_user(&pool, user_id).await {
            Ok(tokens) => dispatch(gateway.as_ref(), &tokens, &message).await,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to load device tokens");
                0
            }
        }
    })
}

/// Pushes to every registered device without blocking the caller.
pub fn spawn_to_all(
    pool: PgPool,
    gateway: Arc<dyn PushGateway>,
    message: PushMessage,
) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        match DeviceToken::all_tokens(&pool).await {
            Ok(tokens) => dispatch(gateway.as_ref(), &tokens, &message).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load device tokens");
                0
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl PushGateway for RecordingGateway {
        async fn send(&self, token: &str, _message: &PushMessage) -> Result<(), PushError> {
            self.sent.lock().unwrap().push(token.to_string());
            if self.fail_on == Some(token) {
                return Err(PushError::Status(500));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_is_sequential_and_skips_failures() {
        let gateway = RecordingGateway {
            fail_on: Some("b"),
            ..Default::default()
        };
        let tokens = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let delivered = dispatch(&gateway, &tokens, &PushMessage::new("Hi", "There")).await;

        assert_eq!(delivered, 2);
        assert_eq!(*gateway.sent.lock().unwrap(), tokens);
    }

    #[test]
    fn test_redact_token() {
        assert_eq!(
            redact_token("ExponentPushToken[xxxxxxxxxxxxxxxxxxxxxx]"),
            "Exponent..."
        );
        assert_eq!(redact_token("short"), "***");
        assert_eq!(redact_token("12345678"), "***");
    }

    #[test]
    fn test_http_gateway_builds_with_timeout() {
        let gateway =
            HttpPushGateway::new("http://127.0.0.1:9/push", Duration::from_secs(5)).unwrap();
        assert_eq!(gateway.endpoint, "http://127.0.0.1:9/push");
    }

    #[tokio::test]
    async fn test_unreachable_gateway_fails_within_timeout() {
        let gateway =
            HttpPushGateway::new("http://127.0.0.1:9/push", Duration::from_millis(500)).unwrap();

        let started = std::time::Instant::now();
        let result = gateway.send("token", &PushMessage::new("t", "b")).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_disabled_gateway_is_noop() {
        let tokens = vec!["a".to_string()];
        let delivered = dispatch(&DisabledPushGateway, &tokens, &PushMessage::new("t", "b")).await;
        assert_eq!(delivered, 1);
    }

    #[test]
    fn test_gateway_payload_shape() {
        let json = serde_json::to_value(GatewayPayload {
            to: "tok",
            title: "New like",
            body: "Ada liked your project",
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "to": "tok", "title": "New like", "body": "Ada liked your project" })
        );
    }
}
