use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

use crate::database::models::{Notification, PushKeys, PushSubscription};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PushError {
    /// The subscription expired or was revoked; the caller should prune it.
    #[error("Push subscription is gone")]
    Gone,

    #[error("Push gateway rejected the message with status {0}")]
    Rejected(u16),

    #[error("Push gateway unreachable: {0}")]
    Transport(String),

    #[error("Push delivery is not configured")]
    Disabled,
}

#[derive(Debug, Serialize)]
struct SubscriptionRef<'a> {
    endpoint: &'a str,
    keys: PushKeys,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PushMessage {
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    subscription: SubscriptionRef<'a>,
    payload: &'a PushMessage,
}

/// 404 and 410 mean the endpoint no longer exists.
pub fn classify_status(status: StatusCode) -> Result<(), PushError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Err(PushError::Gone)
    } else {
        Err(PushError::Rejected(status.as_u16()))
    }
}

/// Client for the push-delivery gateway. Without a gateway URL every send is `Disabled`.
#[derive(Clone, Debug)]
pub struct PushClient {
    http: Client,
    gateway_url: Option<String>,
    base_url: String,
}

impl PushClient {
    pub fn new(gateway_url: Option<String>, base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default push HTTP client: {}", e);
                Client::new()
            });

        Self {
            http,
            gateway_url,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.gateway_url.is_some()
    }

    /// Builds the push message for a stored notification, with an absolute link.
    pub fn message_for(&self, notification: &Notification) -> PushMessage {
        PushMessage {
            title: notification.title.clone(),
            body: notification.body.clone(),
            url: notification.link.as_ref().map(|link| {
                if link.starts_with("http://") || link.starts_with("https://") {
                    link.clone()
                } else {
                    format!("{}/{}", self.base_url, link.trim_start_matches('/'))
                }
            }),
            data: notification.data.clone(),
        }
    }

    pub async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), PushError> {
        let Some(gateway_url) = &self.gateway_url else {
            return Err(PushError::Disabled);
        };

        let request = GatewayRequest {
            subscription: SubscriptionRef {
                endpoint: &subscription.endpoint,
                keys: PushKeys {
                    p256dh: subscription.p256dh.clone(),
                    auth: subscription.auth.clone(),
                },
            },
            payload: message,
        };

        let response = self
            .http
            .post(gateway_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        classify_status(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NotificationType;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn classifies_gateway_statuses() {
        assert_eq!(classify_status(StatusCode::CREATED), Ok(()));
        assert_eq!(classify_status(StatusCode::GONE), Err(PushError::Gone));
        assert_eq!(classify_status(StatusCode::NOT_FOUND), Err(PushError::Gone));
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Err(PushError::Rejected(429))
        );
    }

    #[test]
    fn message_links_are_absolute() {
        let client = PushClient::new(None, "https://band.example.com/");
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            notification_type: NotificationType::EventCreated,
            title: "New show".to_string(),
            body: None,
            link: Some("/events/42".to_string()),
            data: None,
            read_at: None,
            created_at: Utc::now(),
        };

        let message = client.message_for(&notification);
        assert_eq!(
            message.url.as_deref(),
            Some("https://band.example.com/events/42")
        );
    }

    #[actix_web::test]
    async fn sending_without_a_gateway_is_disabled() {
        let client = PushClient::new(None, "http://localhost:3000");
        assert!(!client.is_enabled());

        let subscription = PushSubscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            endpoint: "https://push.example.com/abc".to_string(),
            p256dh: "key".to_string(),
            auth: "secret".to_string(),
            created_at: Utc::now(),
        };
        let message = PushMessage {
            title: "t".to_string(),
            body: None,
            url: None,
            data: None,
        };

        assert_eq!(
            client.send(&subscription, &message).await,
            Err(PushError::Disabled)
        );
    }
}
