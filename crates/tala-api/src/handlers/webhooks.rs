// ============================================================================
// Tala API - Webhook Handlers
// File: crates/tala-api/src/handlers/webhooks.rs
// ============================================================================
//! Payment provider webhook intake. Signatures are checked against the
//! raw body before any parsing; processing happens in the worker.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use tala_core::domain::PaymentProvider;
use tala_security::webhook::{verify_paypal_transmission, verify_stripe_signature};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// POST /webhooks/stripe
pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let signature = header_str(&headers, "stripe-signature")
        .ok_or_else(|| ApiError::InvalidSignature("missing stripe-signature header".to_string()))?;
    verify_stripe_signature(
        &state.config.billing.stripe_webhook_secret,
        signature,
        &body,
        state.config.billing.signature_tolerance,
        Utc::now().timestamp(),
    )?;

    let payload: Value = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {e}")))?;
    let event_id = payload["id"].as_str().unwrap_or_default().to_string();
    let event_type = payload["type"].as_str().unwrap_or_default().to_string();
    if event_id.is_empty() || event_type.is_empty() {
        return Err(ApiError::BadRequest(
            "webhook payload missing id or type".to_string(),
        ));
    }

    let event = state
        .billing
        .ingest_webhook(PaymentProvider::Stripe, &event_type, &event_id, payload)
        .await?;
    info!("Stripe webhook {} accepted as event {}", event_id, event.id);
    Ok(Json(ApiResponse::success(json!({"status": "received"}))))
}

/// POST /webhooks/paypal
pub async fn paypal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    verify_paypal_transmission(
        &state.config.billing.paypal_webhook_id,
        header_str(&headers, "paypal-transmission-id"),
        header_str(&headers, "paypal-transmission-sig"),
        header_str(&headers, "paypal-webhook-id"),
    )?;

    let payload: Value = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {e}")))?;
    let event_id = payload["id"].as_str().unwrap_or_default().to_string();
    let event_type = payload["event_type"].as_str().unwrap_or_default().to_string();
    if event_id.is_empty() || event_type.is_empty() {
        return Err(ApiError::BadRequest(
            "webhook payload missing id or event_type".to_string(),
        ));
    }

    let event = state
        .billing
        .ingest_webhook(PaymentProvider::Paypal, &event_type, &event_id, payload)
        .await?;
    info!("PayPal webhook {} accepted as event {}", event_id, event.id);
    Ok(Json(ApiResponse::success(json!({"status": "received"}))))
}
