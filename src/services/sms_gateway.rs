//! Outbound SMS delivery.
//!
//! The service layer only sees [`SmsGateway`]; which implementation runs is
//! decided once at startup from `sms_gateway` in the configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Sends one message and returns the provider's message id.
    async fn send(&self, to: &str, body: &str) -> Result<String, ServiceError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogSmsGateway;

#[async_trait]
impl SmsGateway for LogSmsGateway {
    async fn send(&self, to: &str, body: &str) -> Result<String, ServiceError> {
        let id = format!("log-{}", Uuid::new_v4());
        info!(to, chars = body.chars().count(), provider_message_id = %id, "SMS (log gateway)");
        Ok(id)
    }
}

#[derive(Debug, Serialize)]
struct OutboundMessage<'a> {
    to: &'a str,
    from: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProviderReply {
    #[serde(alias = "message_id")]
    id: Option<String>,
}

/// Posts `{to, from, body}` JSON to a provider endpoint with a bearer token.
#[derive(Debug, Clone)]
pub struct HttpSmsGateway {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    sender_id: String,
}

impl HttpSmsGateway {
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        sender_id: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            token,
            sender_id: sender_id.into(),
        })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    #[instrument(skip(self, body))]
    async fn send(&self, to: &str, body: &str) -> Result<String, ServiceError> {
        let mut request = self.client.post(&self.url).json(&OutboundMessage {
            to,
            from: &self.sender_id,
            body,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "SMS gateway unreachable");
            ServiceError::ExternalServiceError(format!("SMS gateway request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = %status, detail = %detail, "SMS gateway rejected message");
            return Err(ServiceError::ExternalServiceError(format!(
                "SMS gateway returned {}",
                status
            )));
        }

        // Providers that do not return an id still count as delivered.
        let reply = response
            .json::<ProviderReply>()
            .await
            .ok()
            .and_then(|r| r.id);
        Ok(reply.unwrap_or_else(|| format!("http-{}", Uuid::new_v4())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn log_gateway_returns_an_id() {
        let id = LogSmsGateway.send("+15550100", "hello").await.unwrap();
        assert!(id.starts_with("log-"));
    }

    #[tokio::test]
    async fn http_gateway_posts_json_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_json(serde_json::json!({
                "to": "+15550100",
                "from": "RepairDesk",
                "body": "Your phone is ready"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg-42"})))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = HttpSmsGateway::new(
            format!("{}/messages", server.uri()),
            Some("secret-token".into()),
            "RepairDesk",
        )
        .unwrap();
        let id = gateway.send("+15550100", "Your phone is ready").await.unwrap();
        assert_eq!(id, "msg-42");
    }

    #[tokio::test]
    async fn http_gateway_maps_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let gateway = HttpSmsGateway::new(server.uri(), None, "RepairDesk").unwrap();
        assert_matches!(
            gateway.send("+15550100", "hi").await,
            Err(ServiceError::ExternalServiceError(_))
        );
    }

    #[tokio::test]
    async fn http_gateway_tolerates_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let gateway = HttpSmsGateway::new(server.uri(), None, "RepairDesk").unwrap();
        let id = gateway.send("+15550100", "hi").await.unwrap();
        assert!(id.starts_with("http-"));
    }
}
