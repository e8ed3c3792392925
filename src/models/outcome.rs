// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Publish outcomes, idempotency receipts and the invocation response body.

use crate::error::AppError;
use crate::models::connection::CreatorInfo;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of TikTok post that was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum MediaType {
    Video,
    Photo,
}

/// Result of a publish that reached TikTok.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub publish_id: String,
    pub media_type: MediaType,
    pub resolved_privacy_level: String,
    pub posts_today: u32,
    pub posts_remaining: u32,
    pub message: String,
    /// Set when an earlier invocation with the same idempotency key
    /// already published this post.
    pub duplicate: bool,
}

/// What a publish invocation ended with (errors travel as `AppError`).
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published(PublishResult),
    /// Media requirements unmet; reported as success so sibling
    /// cross-posts carry on.
    Skipped { reason: String },
}

/// Record of a successful upload-init, keyed by tenant and idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    #[serde(rename = "tenant_id")]
    pub tenant_id: String,
    pub idempotency_key: String,
    pub publish_id: String,
    pub media_type: MediaType,
    pub privacy_level: String,
    pub created_at: String,
}

/// Result of the `test` action.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionReport {
    pub display_name: String,
    pub follower_count: u64,
    pub posting_status: String,
    pub is_business_account: bool,
    pub account_warning: Option<String>,
    pub creator_info: Option<CreatorInfo>,
}

/// JSON body returned to the dispatcher for every invocation.
///
/// `status_code` mirrors the HTTP status so callers that only look at the
/// body (queue consumers) see the same outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InvocationResponse {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_privacy_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_today: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_reached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,

    // `test` action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_business_account: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_info: Option<CreatorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub follower_count: Option<u64>,
}

impl InvocationResponse {
    pub fn from_error(err: &AppError) -> Self {
        let mut body = Self {
            status_code: err.status_code().as_u16(),
            success: Some(false),
            error: Some(err.to_string()),
            retryable: Some(err.is_retryable()),
            ..Default::default()
        };
        if let AppError::RateLimited { posts_today, limit } = err {
            body.posts_today = Some(*posts_today);
            body.posts_remaining = Some(limit.saturating_sub(*posts_today));
            body.limit_reached = Some(true);
        }
        body
    }

    pub fn from_outcome(outcome: PublishOutcome) -> Self {
        match outcome {
            PublishOutcome::Published(result) => Self {
                status_code: 200,
                success: Some(true),
                publish_id: Some(result.publish_id),
                media_type: Some(result.media_type),
                resolved_privacy_level: Some(result.resolved_privacy_level),
                posts_today: Some(result.posts_today),
                posts_remaining: Some(result.posts_remaining),
                message: Some(result.message),
                duplicate: result.duplicate.then_some(true),
                ..Default::default()
            },
            PublishOutcome::Skipped { reason } => Self {
                status_code: 200,
                success: Some(true),
                skipped: Some(true),
                reason: Some(reason),
                ..Default::default()
            },
        }
    }

    pub fn from_report(report: ConnectionReport) -> Self {
        Self {
            status_code: 200,
            success: Some(true),
            message: Some(format!("Connected as {}", report.display_name)),
            posting_status: Some(report.posting_status),
            is_business_account: Some(report.is_business_account),
            account_warning: report.account_warning,
            privacy_options: Some(
                report
                    .creator_info
                    .as_ref()
                    .map(|c| c.privacy_level_options.clone())
                    .unwrap_or_default(),
            ),
            creator_info: report.creator_info,
            follower_count: Some(report.follower_count),
            ..Default::default()
        }
    }
}
