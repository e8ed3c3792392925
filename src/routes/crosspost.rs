// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cross-post invocation endpoint.
//!
//! Called by the dispatcher once per (post, tenant). The auth middleware
//! is applied in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::models::{
    CrosspostCommand, InvocationEnvelope, InvocationResponse, PublishRequest, TenantConnection,
};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/crosspost/tiktok", post(invoke))
}

/// Run one publish or test invocation.
async fn invoke(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<InvocationEnvelope>, JsonRejection>,
) -> Result<(StatusCode, Json<InvocationResponse>)> {
    let Json(envelope) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected malformed invocation");
        AppError::BadRequest("Missing required fields".to_string())
    })?;

    let command = CrosspostCommand::try_from(envelope)?;

    let response = match command {
        CrosspostCommand::Publish {
            tenant_id,
            post,
            settings,
        } => {
            tracing::info!(tenant_id = %tenant_id, "TikTok crosspost received");
            let conn = load_connection(&state, &tenant_id, settings).await?;
            let request =
                PublishRequest::assemble(post, &conn.preferences, &state.config.media_base_url);
            let outcome = state.publisher.publish(&tenant_id, request, conn).await?;
            InvocationResponse::from_outcome(outcome)
        }
        CrosspostCommand::Test {
            tenant_id,
            settings,
        } => {
            tracing::info!(tenant_id = %tenant_id, "TikTok connection test received");
            let conn = load_connection(&state, &tenant_id, settings).await?;
            let report = state.publisher.test_connection(&tenant_id, conn).await?;
            InvocationResponse::from_report(report)
        }
    };

    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::OK);
    Ok((status, Json(response)))
}

/// Use the connection sent with the invocation, or the stored one.
async fn load_connection(
    state: &AppState,
    tenant_id: &str,
    supplied: Option<TenantConnection>,
) -> Result<TenantConnection> {
    let mut conn = match supplied {
        Some(conn) => conn,
        None => state
            .store
            .get_connection(tenant_id)
            .await?
            .ok_or(AppError::NotConnected)?,
    };

    if !conn.is_connected() {
        return Err(AppError::NotConnected);
    }

    conn.tenant_id = tenant_id.to_string();
    Ok(conn)
}
