use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub reference: String,
    pub status: String,
    pub amount: Decimal,
}

/// Authorizes funds for a booking. The engine only reads the returned
/// reference, status, and amount; settlement is the provider's problem.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn authorize(
        &self,
        booking_id: &str,
        amount: Decimal,
    ) -> anyhow::Result<PaymentAuthorization>;
}

pub struct HttpPaymentProvider {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpPaymentProvider {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            api_url,
            api_key,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn authorize(
        &self,
        booking_id: &str,
        amount: Decimal,
    ) -> anyhow::Result<PaymentAuthorization> {
        // No provider configured (dev mode): issue a local reference so
        // the confirm flow can be exercised end to end.
        if self.api_url.is_empty() {
            let reference = format!("dev-{}", uuid::Uuid::new_v4());
            tracing::info!(booking_id, %amount, reference, "payment provider not configured, issuing dev authorization");
            return Ok(PaymentAuthorization {
                reference,
                status: "authorized".to_string(),
                amount,
            });
        }

        let body = serde_json::json!({
            "booking_id": booking_id,
            "amount": amount,
        });

        let auth: PaymentAuthorization = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach payment provider")?
            .error_for_status()
            .context("payment provider returned error")?
            .json()
            .await
            .context("failed to decode payment authorization")?;

        Ok(auth)
    }
}
