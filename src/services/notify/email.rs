use std::time::Duration;

use async_trait::async_trait;

use super::{Delivery, Notification, NotificationDispatcher};

/// Hands each notification to an HTTP mail API, one call per recipient.
/// Rendering the message is the mail service's job; we ship the event
/// kind, subject, and structured payload.
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            api_url,
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn deliver(&self, recipient: &str, notification: &Notification) -> Delivery {
        let body = serde_json::json!({
            "to": recipient,
            "kind": notification.kind.as_str(),
            "subject": notification.subject,
            "payload": notification.payload,
        });

        let result = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|res| res.error_for_status());

        match result {
            Ok(_) => Delivery {
                recipient: recipient.to_string(),
                ok: true,
                error: None,
            },
            Err(e) => Delivery {
                recipient: recipient.to_string(),
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[async_trait]
impl NotificationDispatcher for HttpMailer {
    async fn dispatch(&self, notification: &Notification) -> Vec<Delivery> {
        // No mail API configured (dev mode): log the event and move on.
        if self.api_url.is_empty() {
            tracing::info!(
                kind = notification.kind.as_str(),
                subject = %notification.subject,
                "mail delivery skipped, MAIL_API_URL not set"
            );
            return notification
                .recipients
                .iter()
                .map(|r| Delivery {
                    recipient: r.clone(),
                    ok: true,
                    error: None,
                })
                .collect();
        }

        let mut deliveries = Vec::with_capacity(notification.recipients.len());
        for recipient in &notification.recipients {
            let delivery = self.deliver(recipient, notification).await;
            if !delivery.ok {
                tracing::warn!(
                    recipient = %delivery.recipient,
                    kind = notification.kind.as_str(),
                    error = delivery.error.as_deref().unwrap_or(""),
                    "notification delivery failed"
                );
            }
            deliveries.push(delivery);
        }
        deliveries
    }
}
