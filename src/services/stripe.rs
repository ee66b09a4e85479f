use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::services::subscription::{self, SubscriptionUpdate};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

// ─────────────────────────────────────────────────────────────────────────────
// Webhook signature
// ─────────────────────────────────────────────────────────────────────────────

/// Signatures older or newer than this many seconds are rejected, which
/// bounds how long a captured delivery can be replayed.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// The header carries `t=<timestamp>,v1=<hex hmac>[,v1=...]`; the signed
/// payload is `"{t}.{body}"`. The timestamp must be within
/// [`SIGNATURE_TOLERANCE_SECS`] of the current time. Comparison is
/// constant-time. Any parse failure means the signature does not verify.
#[must_use]
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &str) -> bool {
    verify_signature_at(payload, signature_header, secret, Utc::now().timestamp())
}

fn verify_signature_at(payload: &[u8], signature_header: &str, secret: &str, now: i64) -> bool {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let (Some(timestamp), false) = (timestamp, candidates.is_empty()) else {
        return false;
    };

    let Ok(signed_at) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        return false;
    }

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = mac.finalize().into_bytes();

    candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|given| given.ct_eq(expected.as_slice()).into())
            .unwrap_or(false)
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Event payloads
// ─────────────────────────────────────────────────────────────────────────────

/// A Stripe webhook event, parsed just far enough to dispatch on.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The subset of a Stripe subscription object the reconciler needs.
#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: Option<String>,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub items: Option<SubscriptionItems>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionItem {
    pub price: Option<Price>,
}

#[derive(Debug, Deserialize)]
pub struct Price {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub mode: Option<String>,
    pub subscription: Option<String>,
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Invoice {
    subscription: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Stripe REST client
// ─────────────────────────────────────────────────────────────────────────────

/// Thin client for the two Stripe REST calls the service makes.
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    #[must_use]
    pub fn new(secret_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.to_string(),
        }
    }

    /// Fetch a subscription object by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or Stripe rejects it.
    pub async fn fetch_subscription(&self, id: &str) -> anyhow::Result<StripeSubscription> {
        let resp = self
            .http
            .get(format!("https://api.stripe.com/v1/subscriptions/{id}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch Stripe subscription: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Stripe subscription fetch failed ({status}): {body}"
            ));
        }

        resp.json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse Stripe subscription: {e}"))
    }

    /// Create a subscription-mode Checkout session for the given user.
    ///
    /// The user ID rides along as `client_reference_id` and
    /// `subscription_data[metadata][userId]` so the webhook can attribute the
    /// resulting subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails or Stripe rejects it.
    pub async fn create_checkout_session(
        &self,
        user_id: Uuid,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> anyhow::Result<CheckoutSession> {
        let user_id = user_id.to_string();
        let params = [
            ("mode", "subscription"),
            ("line_items[0][price]", price_id),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("client_reference_id", user_id.as_str()),
            ("subscription_data[metadata][userId]", user_id.as_str()),
        ];

        let resp = self
            .http
            .post("https://api.stripe.com/v1/checkout/sessions")
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create checkout session: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Stripe checkout session failed ({status}): {body}"
            ));
        }

        resp.json()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to parse checkout session: {e}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconciliation
// ─────────────────────────────────────────────────────────────────────────────

/// Apply a verified webhook event to local state.
///
/// Unknown event types and events missing a user attribution are logged and
/// acknowledged; Stripe delivers at least once and retries on non-2xx, so only
/// genuine processing failures should bubble up.
///
/// # Errors
///
/// Returns an error on a database or Stripe API failure.
pub async fn reconcile_event(state: &AppState, event: &WebhookEvent) -> anyhow::Result<()> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSession = serde_json::from_value(event.data.object.clone())?;
            if session.mode.as_deref() == Some("subscription")
                && let Some(sub_id) = &session.subscription
            {
                let client = StripeClient::new(&state.config.stripe_secret_key);
                let mut sub = client.fetch_subscription(sub_id).await?;
                // Checkout carries the user reference when subscription metadata lags
                if !sub.metadata.contains_key("userId")
                    && let Some(reference) = session
                        .metadata
                        .get("userId")
                        .cloned()
                        .or(session.client_reference_id)
                {
                    sub.metadata.insert("userId".to_string(), reference);
                }
                apply_subscription(state, &sub).await?;
            } else {
                tracing::info!(session = %session.id, "Ignoring non-subscription checkout session");
            }
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            let sub: StripeSubscription = serde_json::from_value(event.data.object.clone())?;
            apply_subscription(state, &sub).await?;
        }
        "customer.subscription.deleted" => {
            let sub: StripeSubscription = serde_json::from_value(event.data.object.clone())?;
            subscription::mark_status_by_stripe_id(&state.db, &state.pro_cache, &sub.id, "canceled")
                .await?;
        }
        "invoice.payment_succeeded" => {
            let invoice: Invoice = serde_json::from_value(event.data.object.clone())?;
            if let Some(sub_id) = &invoice.subscription {
                let client = StripeClient::new(&state.config.stripe_secret_key);
                let sub = client.fetch_subscription(sub_id).await?;
                apply_subscription(state, &sub).await?;
            }
        }
        "invoice.payment_failed" => {
            let invoice: Invoice = serde_json::from_value(event.data.object.clone())?;
            if let Some(sub_id) = &invoice.subscription {
                subscription::mark_status_by_stripe_id(
                    &state.db,
                    &state.pro_cache,
                    sub_id,
                    "past_due",
                )
                .await?;
            }
        }
        other => {
            tracing::info!(event_type = other, "Ignoring unhandled Stripe event");
        }
    }

    Ok(())
}

/// Upsert the local subscription row from a Stripe subscription object.
async fn apply_subscription(state: &AppState, sub: &StripeSubscription) -> anyhow::Result<()> {
    let Some(user_id) = sub.metadata.get("userId").and_then(|v| v.parse().ok()) else {
        tracing::warn!(
            stripe_subscription_id = %sub.id,
            "Stripe subscription carries no userId metadata; dropping event"
        );
        return Ok(());
    };

    let plan = sub
        .items
        .as_ref()
        .and_then(|items| items.data.first())
        .and_then(|item| item.price.as_ref())
        .map_or_else(|| "pro".to_string(), |price| price.id.clone());

    let update = SubscriptionUpdate {
        stripe_subscription_id: Some(sub.id.clone()),
        stripe_customer_id: sub.customer.clone(),
        status: map_status(&sub.status).to_string(),
        plan,
        current_period_start: sub.current_period_start.and_then(timestamp_to_datetime),
        current_period_end: sub.current_period_end.and_then(timestamp_to_datetime),
        cancel_at_period_end: sub.cancel_at_period_end,
    };

    subscription::create_subscription(&state.db, &state.pro_cache, user_id, update).await?;
    Ok(())
}

/// Collapse Stripe's subscription statuses onto the local vocabulary.
fn map_status(stripe_status: &str) -> &'static str {
    match stripe_status {
        "active" | "trialing" => "active",
        "past_due" => "past_due",
        "canceled" | "unpaid" | "incomplete_expired" => "canceled",
        _ => "expired",
    }
}

fn timestamp_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], timestamp: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"customer.subscription.updated"}"#;
        let sig = sign(payload, "1700000000", "whsec_test");
        let header = format!("t=1700000000,v1={sig}");
        assert!(verify_signature_at(payload, &header, "whsec_test", 1_700_000_000));
    }

    #[test]
    fn accepts_any_matching_v1() {
        let payload = b"{}";
        let sig = sign(payload, "1700000000", "secret");
        let header = format!("t=1700000000,v1=deadbeef,v1={sig}");
        assert!(verify_signature_at(payload, &header, "secret", 1_700_000_000));
    }

    #[test]
    fn accepts_signature_within_tolerance() {
        let payload = b"{}";
        let sig = sign(payload, "1700000000", "whsec_test");
        let header = format!("t=1700000000,v1={sig}");
        assert!(verify_signature_at(payload, &header, "whsec_test", 1_700_000_000 + 299));
        assert!(verify_signature_at(payload, &header, "whsec_test", 1_700_000_000 - 299));
    }

    #[test]
    fn rejects_stale_signature() {
        // A correctly signed header from an old delivery must not verify again
        let payload = br#"{"type":"customer.subscription.updated"}"#;
        let sig = sign(payload, "1000000000", "whsec_test");
        let header = format!("t=1000000000,v1={sig}");
        assert!(!verify_signature_at(payload, &header, "whsec_test", 1_700_000_000));
        assert!(!verify_signature(payload, &header, "whsec_test"));
    }

    #[test]
    fn rejects_future_dated_signature() {
        let payload = b"{}";
        let sig = sign(payload, "1700001000", "whsec_test");
        let header = format!("t=1700001000,v1={sig}");
        assert!(!verify_signature_at(payload, &header, "whsec_test", 1_700_000_000));
    }

    #[test]
    fn rejects_tampered_payload() {
        let payload = br#"{"amount":100}"#;
        let sig = sign(payload, "1700000000", "whsec_test");
        let header = format!("t=1700000000,v1={sig}");
        assert!(!verify_signature_at(
            br#"{"amount":999}"#,
            &header,
            "whsec_test",
            1_700_000_000
        ));
    }

    #[test]
    fn rejects_wrong_secret_and_garbage_headers() {
        let payload = b"{}";
        let sig = sign(payload, "1700000000", "right");
        let now = 1_700_000_000;
        assert!(!verify_signature_at(payload, &format!("t=1700000000,v1={sig}"), "wrong", now));
        assert!(!verify_signature_at(payload, "", "right", now));
        assert!(!verify_signature_at(payload, "t=1700000000", "right", now));
        assert!(!verify_signature_at(payload, "v1=abcdef", "right", now));
        assert!(!verify_signature_at(payload, "t=1700000000,v1=not-hex", "right", now));
        assert!(!verify_signature_at(payload, "t=not-a-number,v1=abcdef", "right", now));
    }

    #[test]
    fn parses_webhook_event() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{
                "type": "customer.subscription.updated",
                "data": {
                    "object": {
                        "id": "sub_123",
                        "customer": "cus_123",
                        "status": "active",
                        "cancel_at_period_end": false,
                        "metadata": {"userId": "6e4d8a88-0000-0000-0000-000000000000"}
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "customer.subscription.updated");

        let sub: StripeSubscription = serde_json::from_value(event.data.object).unwrap();
        assert_eq!(sub.id, "sub_123");
        assert_eq!(sub.metadata.get("userId").map(String::as_str).unwrap_or(""),
            "6e4d8a88-0000-0000-0000-000000000000");
    }

    #[test]
    fn maps_stripe_statuses() {
        assert_eq!(map_status("active"), "active");
        assert_eq!(map_status("trialing"), "active");
        assert_eq!(map_status("past_due"), "past_due");
        assert_eq!(map_status("canceled"), "canceled");
        assert_eq!(map_status("incomplete"), "expired");
    }
}
