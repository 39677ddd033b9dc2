//! PayPal Orders v2 REST client.
//!
//! All methods degrade to None/false on failure instead of erroring. The
//! gateway outcome is logged here; callers decide how to surface it. No
//! retries: a failed call leaves the order for the caller to fail out.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::PayPalConfig;
use crate::util::cents_to_decimal;

const SANDBOX_API: &str = "https://api-m.sandbox.paypal.com";
const LIVE_API: &str = "https://api-m.paypal.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct PayPalClient {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
}

/// What a capture attempt produced. `completed` is true only when PayPal
/// reported COMPLETED; `capture_id` is the gateway transaction id when
/// one was issued.
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    pub completed: bool,
    pub capture_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: Option<String>,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    payments: Option<Payments>,
}

#[derive(Debug, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
}

impl PayPalClient {
    pub fn new(config: &PayPalConfig) -> Self {
        let api_base = if config.mode == "live" {
            LIVE_API
        } else {
            SANDBOX_API
        };
        Self {
            // The builder only fails on a broken TLS backend
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_base: api_base.to_string(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Fetch an OAuth access token via client credentials.
    pub async fn get_access_token(&self) -> Option<String> {
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("PayPal token request failed: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::error!("PayPal token request returned {}", response.status());
            return None;
        }
        match response.json::<TokenResponse>().await {
            Ok(t) => Some(t.access_token),
            Err(e) => {
                tracing::error!("PayPal token response unparseable: {}", e);
                None
            }
        }
    }

    /// Create a gateway order for a one-off USD charge. Returns the
    /// gateway order id on HTTP 201, None otherwise.
    pub async fn create_order(&self, description: &str, amount_cents: i64) -> Option<String> {
        let access_token = self.get_access_token().await?;

        let body = serde_json::json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "description": description,
                "amount": {
                    "currency_code": "USD",
                    "value": cents_to_decimal(amount_cents),
                }
            }]
        });

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.api_base))
            .bearer_auth(&access_token)
            .header("PayPal-Request-Id", uuid::Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("PayPal create order failed: {}", e);
                return None;
            }
        };
        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("PayPal create order returned {}: {}", status, detail);
            return None;
        }
        match response.json::<CreateOrderResponse>().await {
            Ok(r) => {
                if r.id.is_none() {
                    tracing::error!("PayPal create order response missing id");
                }
                r.id
            }
            Err(e) => {
                tracing::error!("PayPal create order response unparseable: {}", e);
                None
            }
        }
    }

    /// Capture a previously created and buyer-approved order.
    pub async fn capture_order(&self, paypal_order_id: &str) -> CaptureOutcome {
        let Some(access_token) = self.get_access_token().await else {
            return CaptureOutcome::default();
        };

        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.api_base, paypal_order_id
            ))
            .bearer_auth(&access_token)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("PayPal capture failed: {}", e);
                return CaptureOutcome::default();
            }
        };
        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("PayPal capture returned {}: {}", status, detail);
            return CaptureOutcome::default();
        }

        let parsed = match response.json::<CaptureResponse>().await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("PayPal capture response unparseable: {}", e);
                return CaptureOutcome::default();
            }
        };

        let completed = parsed.status.as_deref() == Some("COMPLETED");
        if !completed {
            tracing::warn!(
                "PayPal capture for {} not completed: {:?}",
                paypal_order_id,
                parsed.status
            );
        }
        let capture_id = parsed
            .purchase_units
            .into_iter()
            .next()
            .and_then(|u| u.payments)
            .and_then(|p| p.captures.into_iter().next())
            .map(|c| c.id);

        CaptureOutcome {
            completed,
            capture_id,
        }
    }
}
