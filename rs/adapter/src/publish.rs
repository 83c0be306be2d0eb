use crate::error_types::PublishError;
use crate::message::MetricsMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// The capability the poll lanes publish through. Tests exercise the
/// pipeline with in-memory implementations instead of a live gateway.
#[async_trait]
pub trait MetricsPublisher: Send + Sync {
    /// Publishes one envelope to a named channel.
    async fn publish(&self, channel: &str, message: &MetricsMessage) -> Result<(), PublishError>;

    /// Answers whether the configured publish identity may publish to the
    /// channel. Used during startup validation only.
    async fn has_publish_permission(&self, channel: &str) -> Result<bool, PublishError>;
}

/// Publishes through the pub/sub network's HTTP gateway, authenticating with
/// the publish-identity credential. The gateway's wire format and delivery
/// guarantees are not this adapter's concern.
pub struct GatewayPublisher {
    client: Client,
    base_url: Url,
    private_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionResponse {
    can_publish: bool,
}

impl GatewayPublisher {
    /// The client is built without a request timeout: publish calls rely on
    /// the gateway's own timeout behavior.
    pub fn new(base_url: Url, private_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            private_key,
        }
    }

    fn endpoint(&self, channel: &str, suffix: &str) -> String {
        format!(
            "{}/streams/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            channel,
            suffix
        )
    }

    /// Grants publish permission on a channel to another identity. This backs
    /// the one-shot `grant-permissions` tool and is not part of the
    /// [`MetricsPublisher`] capability the poll lanes see.
    pub async fn grant_publish_permission(
        &self,
        address: &str,
        channel: &str,
    ) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.endpoint(channel, "permissions"))
            .bearer_auth(&self.private_key)
            .json(&serde_json::json!({
                "user": address,
                "permissions": ["publish"],
            }))
            .send()
            .await
            .map_err(|source| PublishError::Request {
                channel: channel.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                channel: channel.to_string(),
                status,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsPublisher for GatewayPublisher {
    async fn publish(&self, channel: &str, message: &MetricsMessage) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.endpoint(channel, "data"))
            .bearer_auth(&self.private_key)
            .json(message)
            .send()
            .await
            .map_err(|source| PublishError::Request {
                channel: channel.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                channel: channel.to_string(),
                status,
            });
        }
        Ok(())
    }

    async fn has_publish_permission(&self, channel: &str) -> Result<bool, PublishError> {
        let response = self
            .client
            .get(self.endpoint(channel, "permissions/publish"))
            .bearer_auth(&self.private_key)
            .send()
            .await
            .map_err(|source| PublishError::Request {
                channel: channel.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected {
                channel: channel.to_string(),
                status,
            });
        }

        let permission: PermissionResponse =
            response
                .json()
                .await
                .map_err(|err| PublishError::InvalidResponse {
                    channel: channel.to_string(),
                    reason: err.to_string(),
                })?;
        Ok(permission.can_publish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MESSAGE_VERSION;
    use std::collections::BTreeMap;

    fn message() -> MetricsMessage {
        MetricsMessage {
            version: MESSAGE_VERSION,
            validator: "alice".to_string(),
            metrics: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn publish_posts_the_envelope_with_credential() {
        let mut server = mockito::Server::new_async().await;
        let endpoint = server
            .mock("POST", "/streams/polygon-validators.eth/validator/bor/data")
            .match_header("authorization", "Bearer 0xsecret")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"version":1,"validator":"alice"}"#.to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let publisher = GatewayPublisher::new(
            Url::parse(&server.url()).unwrap(),
            "0xsecret".to_string(),
        );
        publisher
            .publish("polygon-validators.eth/validator/bor", &message())
            .await
            .unwrap();
        endpoint.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_publish_surfaces_the_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/streams/ch/data")
            .with_status(403)
            .create_async()
            .await;

        let publisher =
            GatewayPublisher::new(Url::parse(&server.url()).unwrap(), "k".to_string());
        match publisher.publish("ch", &message()).await {
            Err(PublishError::Rejected { status, .. }) => assert_eq!(status.as_u16(), 403),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn permission_probe_reads_the_gateway_answer() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/streams/ch/permissions/publish")
            .with_status(200)
            .with_body(r#"{"canPublish":false}"#)
            .create_async()
            .await;

        let publisher =
            GatewayPublisher::new(Url::parse(&server.url()).unwrap(), "k".to_string());
        assert!(!publisher.has_publish_permission("ch").await.unwrap());
    }
}
