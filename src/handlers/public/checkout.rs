//! PayPal checkout: create a gateway order for a paid script, then
//! capture it once the buyer approves. Capture is the only place a
//! download token is minted.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, OptionExt, Result};
use crate::extractors::Json;
use crate::models::CreateOrder;
use crate::payments::PayPalClient;
use crate::util::{generate_download_token, is_valid_email};

/// Download links are valid for exactly seven days from capture.
const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub script_id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    /// Gateway order id, fed to the PayPal JS SDK for buyer approval
    pub order_id: String,
}

fn paypal_client(state: &AppState) -> Result<&PayPalClient> {
    state
        .paypal
        .as_ref()
        .ok_or_else(|| AppError::Config(msg::PAYPAL_NOT_CONFIGURED.into()))
}

pub async fn create_checkout_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>> {
    let email = request.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest(msg::VALID_EMAIL_REQUIRED.into()));
    }

    let script = {
        let conn = state.db.get()?;
        queries::get_published_script(&conn, request.script_id)?
            .or_not_found(msg::SCRIPT_NOT_FOUND)?
    };
    if !script.is_paid() {
        return Err(AppError::BadRequest(msg::SCRIPT_IS_FREE.into()));
    }
    let paypal = paypal_client(&state)?;

    let description = format!("Adoscript - {}", script.name);
    let payment_id = paypal
        .create_order(&description, script.price_cents)
        .await
        .ok_or_else(|| AppError::Payment(msg::PAYPAL_ORDER_FAILED.into()))?;

    let conn = state.db.get()?;
    let order_code = queries::fresh_order_code(&conn)?;
    let order = queries::create_pending_order(
        &conn,
        &CreateOrder {
            order_id: order_code,
            script_id: script.id,
            customer_email: email,
            amount_cents: script.price_cents,
            payment_id: payment_id.clone(),
        },
    )?;
    tracing::info!(
        order = %order.order_id,
        script = %script.slug,
        "Checkout order created"
    );

    Ok(Json(CreateOrderResponse {
        order_id: payment_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CaptureOrderRequest {
    /// Gateway order id returned from create-order
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct CaptureOrderResponse {
    pub status: &'static str,
    pub download_token: String,
    pub script_name: String,
    pub script_slug: String,
    pub email: String,
    /// Whether a confirmation email was dispatched (delivery is async)
    pub email_sent: bool,
}

pub async fn capture_checkout_order(
    State(state): State<AppState>,
    Json(request): Json<CaptureOrderRequest>,
) -> Result<Json<CaptureOrderResponse>> {
    let order_id = request.order_id.trim();
    if order_id.is_empty() {
        return Err(AppError::BadRequest(msg::ORDER_ID_REQUIRED.into()));
    }
    let paypal = paypal_client(&state)?;

    // Only a pending order matches; a replayed capture finds nothing.
    let (order, script) = {
        let conn = state.db.get()?;
        let order = queries::get_pending_order_by_payment_id(&conn, order_id)?
            .or_not_found(msg::ORDER_NOT_FOUND)?;
        let script =
            queries::get_script_by_id(&conn, order.script_id)?.or_not_found(msg::SCRIPT_NOT_FOUND)?;
        (order, script)
    };

    let outcome = paypal.capture_order(order_id).await;
    if !outcome.completed {
        let conn = state.db.get()?;
        queries::fail_order(&conn, order.id)?;
        tracing::warn!(order = %order.order_id, "Payment capture failed, order marked failed");
        return Err(AppError::Payment(msg::PAYMENT_CAPTURE_FAILED.into()));
    }

    let token = generate_download_token();
    let expires_at = chrono::Utc::now().timestamp() + TOKEN_TTL_SECS;

    let completed = {
        let conn = state.db.get()?;
        queries::complete_order(
            &conn,
            order.id,
            outcome.capture_id.as_deref(),
            &token,
            expires_at,
        )?
    };
    if !completed {
        // Lost a race with a concurrent capture of the same order
        return Err(AppError::NotFound(msg::ORDER_NOT_FOUND.into()));
    }
    tracing::info!(
        order = %order.order_id,
        script = %script.slug,
        "Order completed"
    );

    // Email is best effort and must never fail the capture.
    let email_sent = state.mailer.is_enabled();
    {
        let mailer = state.mailer.clone();
        let download_url = format!("{}/download?token={}", state.base_url, token);
        let mut completed_order = order.clone();
        completed_order.status = crate::models::OrderStatus::Completed;
        completed_order.download_token = Some(token.clone());
        completed_order.token_expires_at = Some(expires_at);
        let script_name = script.name.clone();
        tokio::spawn(async move {
            mailer
                .send_order_confirmation(&completed_order, &script_name, &download_url)
                .await;
        });
    }

    Ok(Json(CaptureOrderResponse {
        status: "completed",
        download_token: token,
        script_name: script.name,
        script_slug: script.slug,
        email: order.customer_email,
        email_sent,
    }))
}

#[derive(Debug, Serialize)]
pub struct ClientIdResponse {
    pub client_id: String,
}

/// Expose the PayPal client id for the storefront's JS SDK.
pub async fn client_id(State(state): State<AppState>) -> Result<Json<ClientIdResponse>> {
    let paypal = paypal_client(&state)?;
    Ok(Json(ClientIdResponse {
        client_id: paypal.client_id().to_string(),
    }))
}
