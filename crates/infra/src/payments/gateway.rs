//! HTTP payment gateway adapter.
//!
//! Declines come back as structured outcomes so the booking service can
//! abort cleanly; only transport-level problems become errors.

use std::time::Duration;

use async_trait::async_trait;
use mentorbook_core::{ChargeOutcome, PaymentGateway, RefundOutcome};
use mentorbook_domain::{PaymentConfig, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::http::HttpClient;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Serialize)]
struct ChargeRequest<'a> {
    amount_cents: i64,
    currency: &'a str,
    payment_method: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    status: String,
    #[serde(default)]
    payment_id: Option<String>,
    #[serde(default)]
    decline_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefundRequest<'a> {
    payment_id: &'a str,
    amount_cents: i64,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    status: String,
    #[serde(default)]
    refund_id: Option<String>,
    #[serde(default)]
    decline_reason: Option<String>,
}

pub struct HttpPaymentGateway {
    http: HttpClient,
    base_url: String,
    api_key: String,
    currency: String,
}

impl HttpPaymentGateway {
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        // Charges must not be retried blindly; a timeout after a successful
        // capture would double-charge. Single attempt, generous timeout.
        let http = HttpClient::with_attempts(GATEWAY_TIMEOUT, 1)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            currency: config.currency.clone(),
        })
    }

    /// Settlement currency from configuration, handed to the booking
    /// service at wiring time.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[cfg(test)]
    fn for_tests(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::with_attempts(Duration::from_secs(5), 1).unwrap(),
            base_url: base_url.into(),
            api_key: "test-key".to_string(),
            currency: "usd".to_string(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(
        &self,
        amount_cents: i64,
        currency: &str,
        payment_method: &str,
    ) -> Result<ChargeOutcome> {
        let response = self
            .http
            .send(self.request(Method::POST, "/charges").json(&ChargeRequest {
                amount_cents,
                currency,
                payment_method,
            }))
            .await?;

        // 402 is the gateway's decline signal and still carries a body.
        let body: ChargeResponse = response.json().await.map_err(crate::errors::InfraError::from)?;
        if body.status == "succeeded" {
            info!(amount_cents, payment_id = ?body.payment_id, "charge captured");
            Ok(ChargeOutcome { success: true, payment_id: body.payment_id, error: None })
        } else {
            warn!(amount_cents, reason = ?body.decline_reason, "charge declined");
            Ok(ChargeOutcome {
                success: false,
                payment_id: None,
                error: body.decline_reason.or(Some("charge declined".to_string())),
            })
        }
    }

    async fn refund(&self, payment_id: &str, amount_cents: i64) -> Result<RefundOutcome> {
        let response = self
            .http
            .send(
                self.request(Method::POST, "/refunds")
                    .json(&RefundRequest { payment_id, amount_cents }),
            )
            .await?;

        let body: RefundResponse = response.json().await.map_err(crate::errors::InfraError::from)?;
        if body.status == "succeeded" {
            info!(payment_id, amount_cents, refund_id = ?body.refund_id, "refund issued");
            Ok(RefundOutcome { success: true, refund_id: body.refund_id, error: None })
        } else {
            warn!(payment_id, reason = ?body.decline_reason, "refund rejected");
            Ok(RefundOutcome {
                success: false,
                refund_id: None,
                error: body.decline_reason.or(Some("refund rejected".to_string())),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn successful_charge_yields_payment_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/charges"))
            .and(body_partial_json(json!({ "amount_cents": 1000, "currency": "usd" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "succeeded",
                "payment_id": "pay_123"
            })))
            .mount(&server)
            .await;

        let gateway = HttpPaymentGateway::for_tests(server.uri());
        let outcome = gateway.charge(1000, "usd", "pm_card").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.payment_id.as_deref(), Some("pay_123"));
    }

    #[tokio::test]
    async fn decline_is_a_structured_outcome_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/charges"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "status": "declined",
                "decline_reason": "insufficient funds"
            })))
            .mount(&server)
            .await;

        let gateway = HttpPaymentGateway::for_tests(server.uri());
        let outcome = gateway.charge(1000, "usd", "pm_card").await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.payment_id.is_none());
        assert_eq!(outcome.error.as_deref(), Some("insufficient funds"));
    }

    #[tokio::test]
    async fn refund_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refunds"))
            .and(body_partial_json(json!({ "payment_id": "pay_123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "succeeded",
                "refund_id": "re_456"
            })))
            .mount(&server)
            .await;

        let gateway = HttpPaymentGateway::for_tests(server.uri());
        let outcome = gateway.refund("pay_123", 1000).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.refund_id.as_deref(), Some("re_456"));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gateway = HttpPaymentGateway::for_tests(format!("http://{addr}"));
        assert!(gateway.charge(1000, "usd", "pm_card").await.is_err());
    }
}
