// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Invocation envelope sent by the dispatcher and the command it decodes to.

use crate::error::AppError;
use crate::models::connection::TenantConnection;
use crate::models::post::PostPayload;
use serde::Deserialize;
use validator::Validate;

/// What the dispatcher asks the connector to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Publish,
    /// Verify identity and posting capabilities without publishing.
    Test,
}

/// Raw invocation body: `{tenantId, post?, settings?, action?}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEnvelope {
    #[validate(length(min = 1, max = 128))]
    pub tenant_id: String,
    #[serde(default)]
    pub post: Option<PostPayload>,
    /// Connection record; loaded from the settings store when absent.
    #[serde(default)]
    pub settings: Option<TenantConnection>,
    #[serde(default)]
    pub action: Option<Action>,
}

/// Decoded invocation.
#[derive(Debug)]
pub enum CrosspostCommand {
    Publish {
        tenant_id: String,
        post: PostPayload,
        settings: Option<TenantConnection>,
    },
    Test {
        tenant_id: String,
        settings: Option<TenantConnection>,
    },
}

impl CrosspostCommand {
    pub fn tenant_id(&self) -> &str {
        match self {
            CrosspostCommand::Publish { tenant_id, .. } | CrosspostCommand::Test { tenant_id, .. } => {
                tenant_id
            }
        }
    }
}

impl TryFrom<InvocationEnvelope> for CrosspostCommand {
    type Error = AppError;

    fn try_from(envelope: InvocationEnvelope) -> Result<Self, Self::Error> {
        envelope
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        // postId stands in for a missing idempotencyKey, so both are capped
        if let Some(post) = &envelope.post {
            if post
                .idempotency_key
                .as_deref()
                .or(post.post_id.as_deref())
                .is_some_and(|k| k.trim().chars().count() > MAX_IDEMPOTENCY_KEY_LEN)
            {
                return Err(AppError::BadRequest(format!(
                    "idempotencyKey exceeds {} characters",
                    MAX_IDEMPOTENCY_KEY_LEN
                )));
            }
        }

        let tenant_id = envelope.tenant_id;
        match envelope.action.unwrap_or_default() {
            Action::Test => Ok(CrosspostCommand::Test {
                tenant_id,
                settings: envelope.settings,
            }),
            Action::Publish => {
                let post = envelope
                    .post
                    .ok_or_else(|| AppError::BadRequest("Missing required fields".to_string()))?;
                Ok(CrosspostCommand::Publish {
                    tenant_id,
                    post,
                    settings: envelope.settings,
                })
            }
        }
    }
}

const MAX_IDEMPOTENCY_KEY_LEN: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: serde_json::Value) -> Result<CrosspostCommand, AppError> {
        let envelope: InvocationEnvelope = serde_json::from_value(json).unwrap();
        CrosspostCommand::try_from(envelope)
    }

    #[test]
    fn test_missing_action_means_publish() {
        let cmd = decode(serde_json::json!({
            "tenantId": "t1",
            "post": { "title": "hi" }
        }))
        .unwrap();
        assert!(matches!(cmd, CrosspostCommand::Publish { .. }));
        assert_eq!(cmd.tenant_id(), "t1");
    }

    #[test]
    fn test_action_test_needs_no_post() {
        let cmd = decode(serde_json::json!({ "tenantId": "t1", "action": "test" })).unwrap();
        assert!(matches!(cmd, CrosspostCommand::Test { .. }));
    }

    #[test]
    fn test_publish_without_post_rejected() {
        let err = decode(serde_json::json!({ "tenantId": "t1" })).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_empty_tenant_rejected() {
        let err = decode(serde_json::json!({ "tenantId": "", "post": {} })).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_overlong_post_id_rejected_as_key() {
        let long = "p".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
        let err = decode(serde_json::json!({
            "tenantId": "t1",
            "post": { "postId": long }
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let ok = decode(serde_json::json!({
            "tenantId": "t1",
            "post": { "postId": "p".repeat(MAX_IDEMPOTENCY_KEY_LEN) }
        }));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_unknown_action_fails_to_parse() {
        let parsed = serde_json::from_value::<InvocationEnvelope>(serde_json::json!({
            "tenantId": "t1",
            "action": "delete"
        }));
        assert!(parsed.is_err());
    }
}
