/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Webhook Delivery Engine (component H).
//!
//! Subscribes to core events via the Hook Orchestrator's action channel and,
//! for every active webhook whose `events` list matches, signs and POSTs the
//! event body, retrying with exponential backoff on transient failure. Each
//! attempt is recorded as its own append-only `webhook_deliveries` row.

use crate::dal::DAL;
use crate::error::CmsError;
use crate::hooks::{ErrorStrategy, HookOrchestrator};
use formwork_models::models::webhooks::{
    CompleteWebhookDelivery, FormworkEvent, NewWebhookDelivery, Webhook, EVENT_WEBHOOK_AFTER_SEND,
};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

type HmacSha256 = Hmac<Sha256>;

/// How a failed attempt should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureClass {
    /// Worth retrying: connection refused, DNS hiccup, 5xx, timeout.
    Temporary,
    /// Not worth retrying: TLS/certificate failure, 4xx client error.
    Permanent,
}

/// Retry/backoff policy for delivery attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt as i32 - 1);
        let ms = (self.initial_delay_ms as f64 * exp) as u64;
        Duration::from_millis(ms.min(self.max_delay_ms))
    }
}

/// Drives webhook matching and HTTP delivery for fired events.
pub struct WebhookDeliveryEngine {
    dal: DAL,
    client: reqwest::Client,
    policy: RetryPolicy,
    hooks: Arc<HookOrchestrator>,
}

impl WebhookDeliveryEngine {
    pub fn new(dal: DAL, hooks: Arc<HookOrchestrator>, policy: RetryPolicy) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self { dal, client, policy, hooks })
    }

    /// Looks up every active webhook subscribed to `event` and delivers to
    /// each independently — one webhook's exhausted retries never affect
    /// another's delivery.
    pub async fn dispatch(&self, event: &str, data: serde_json::Value) {
        let webhooks = match self.dal.webhooks().list_active() {
            Ok(w) => w,
            Err(e) => {
                tracing::error!("failed to list active webhooks for event {}: {:?}", event, e);
                return;
            }
        };

        let payload = FormworkEvent::new(event, data);

        for webhook in webhooks.into_iter().filter(|w| w.subscribes_to(event)) {
            self.deliver_with_retry(&webhook, &payload).await;
        }
    }

    /// Runs the full attempt loop for a single webhook: each attempt opens
    /// its own delivery row, and a temporary failure sleeps for the backoff
    /// delay before the next attempt. Stops at the first success, the first
    /// permanent failure, or once `max_retries` attempts are exhausted.
    async fn deliver_with_retry(&self, webhook: &Webhook, payload: &FormworkEvent) {
        let body = match serde_json::to_vec(payload) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("failed to serialize webhook payload for {}: {}", webhook.id, e);
                return;
            }
        };

        for attempt in 1..=self.policy.max_retries {
            let new_delivery = match NewWebhookDelivery::new(webhook.id, &payload.event, attempt as i32) {
                Ok(d) => d,
                Err(e) => {
                    tracing::error!("invalid delivery attempt for webhook {}: {}", webhook.id, e);
                    return;
                }
            };
            let delivery = match self.dal.webhook_deliveries().create(&new_delivery) {
                Ok(d) => d,
                Err(e) => {
                    tracing::error!("failed to record delivery attempt for webhook {}: {:?}", webhook.id, e);
                    return;
                }
            };

            let outcome = self.send_once(webhook, &payload.event, &delivery.id, &body).await;

            let (success, status_code, response, error, class, elapsed_ms) = match &outcome {
                Ok((status, resp, elapsed)) => (true, Some(*status as i32), Some(resp.clone()), None, None, *elapsed),
                Err((class, message, elapsed)) => (false, None, None, Some(message.clone()), Some(*class), *elapsed),
            };

            let changes = CompleteWebhookDelivery {
                status_code,
                success: Some(success),
                response: Some(response),
                duration: Some(elapsed_ms as i32),
                error: Some(error.clone()),
                completed_at: Some(chrono::Utc::now()),
            };
            if let Err(e) = self.dal.webhook_deliveries().complete(&delivery.id, &changes) {
                tracing::error!("failed to complete delivery row {}: {:?}", delivery.id, e);
            }

            if success {
                tracing::info!("webhook {} delivered event {} on attempt {}", webhook.id, payload.event, attempt);
                self.emit_after_send(webhook, &payload.event, true, attempt, None).await;
                return;
            }

            if class == Some(FailureClass::Permanent) {
                tracing::warn!("webhook {} permanently failed event {}, not retrying", webhook.id, payload.event);
                self.emit_after_send(webhook, &payload.event, false, attempt, error).await;
                return;
            }

            if attempt < self.policy.max_retries {
                tokio::time::sleep(self.policy.delay_for_attempt(attempt)).await;
            }
        }

        let terminal = CmsError::WebhookTerminal {
            webhook_id: webhook.id.to_string(),
            event: payload.event.clone(),
        };
        tracing::warn!(
            "webhook {} exhausted {} attempts for event {}: {}",
            webhook.id,
            self.policy.max_retries,
            payload.event,
            terminal
        );
        self.emit_after_send(webhook, &payload.event, false, self.policy.max_retries, Some(terminal.to_string()))
            .await;
    }

    /// Fires `webhook:afterSend` once a delivery chain reaches a terminal
    /// state: delivered, permanently failed, or retries exhausted.
    async fn emit_after_send(&self, webhook: &Webhook, event: &str, success: bool, attempt: u32, error: Option<String>) {
        self.hooks
            .emit(
                EVENT_WEBHOOK_AFTER_SEND,
                json!({
                    "webhookId": webhook.id,
                    "event": event,
                    "success": success,
                    "attempt": attempt,
                    "error": error,
                }),
                ErrorStrategy::Continue,
            )
            .await;
    }

    async fn send_once(
        &self,
        webhook: &Webhook,
        event: &str,
        delivery_id: &str,
        body: &[u8],
    ) -> Result<(u16, String, i64), (FailureClass, String, i64)> {
        let mut request = self
            .client
            .post(&webhook.url)
            .header("Content-Type", "application/json")
            .header("X-Formwork-Event", event)
            .header("X-Formwork-Delivery", delivery_id);

        for (key, value) in webhook.header_map() {
            request = request.header(key, value);
        }

        if let Some(secret) = &webhook.secret {
            let signature = sign_payload(secret, body);
            request = request.header("X-Formwork-Signature", format!("sha256={}", signature));
        }

        let start = Instant::now();
        let response = match request.body(body.to_vec()).send().await {
            Ok(r) => r,
            Err(e) => {
                let elapsed_ms = start.elapsed().as_millis() as i64;
                let (class, message) = classify_transport_error(&e);
                return Err((class, message, elapsed_ms));
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let elapsed_ms = start.elapsed().as_millis() as i64;
        let status_code = status.as_u16();

        if status.is_success() {
            Ok((status_code, text.chars().take(2000).collect(), elapsed_ms))
        } else if status_code == 408 || status_code == 429 {
            // Request Timeout / Too Many Requests: worth another attempt
            // despite being a 4xx.
            Err((FailureClass::Temporary, format!("retryable status {}: {}", status, text), elapsed_ms))
        } else if status.is_client_error() {
            Err((FailureClass::Permanent, format!("client error {}: {}", status, text), elapsed_ms))
        } else {
            Err((FailureClass::Temporary, format!("server error {}: {}", status, text), elapsed_ms))
        }
    }
}

fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn classify_transport_error(err: &reqwest::Error) -> (FailureClass, String) {
    let message = err.to_string();
    if err.is_timeout() {
        (FailureClass::Temporary, format!("timeout: {}", message))
    } else if err.is_connect() {
        (FailureClass::Permanent, format!("connection error: {}", message))
    } else if message.contains("certificate") || message.contains("tls") {
        (FailureClass::Permanent, format!("tls error: {}", message))
    } else {
        (FailureClass::Temporary, format!("request error: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay_ms, 1000);
    }

    #[test]
    fn test_delay_for_attempt_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_for_attempt_respects_cap() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 5000,
        };
        assert_eq!(policy.delay_for_attempt(10), Duration::from_millis(5000));
    }

    #[test]
    fn test_sign_payload_is_deterministic() {
        let a = sign_payload("secret", b"hello");
        let b = sign_payload("secret", b"hello");
        assert_eq!(a, b);
        assert_ne!(a, sign_payload("other-secret", b"hello"));
    }
}
