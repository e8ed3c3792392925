// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Publish orchestration.
//!
//! Drives one invocation from media resolution through token, capability
//! and quota checks to the TikTok upload-init call, and the `test` action
//! that reports what a connected account is allowed to do.

use crate::config::Config;
use crate::db::SettingsStore;
use crate::error::AppError;
use crate::models::{
    ConnectionReport, CreatorInfo, MediaType, PublishOutcome, PublishReceipt, PublishRequest,
    PublishResult, TenantConnection, PRIVACY_PUBLIC, PRIVACY_SELF_ONLY,
};
use crate::services::capability::CapabilityProbe;
use crate::services::media::{self, ResolvedMedia};
use crate::services::post_text::{
    build_post_text, truncate_chars, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS,
};
use crate::services::rate_limit::RateLimiter;
use crate::services::tiktok::{CommercialContent, PhotoPostInfo, TikTokClient, VideoPostInfo};
use crate::services::token::TokenManager;
use crate::time_utils::{format_utc_rfc3339, utc_date};
use chrono::Utc;
use std::sync::Arc;

/// Cross-posts to TikTok on behalf of tenants.
#[derive(Clone)]
pub struct PublishService {
    client: TikTokClient,
    store: Arc<dyn SettingsStore>,
    tokens: TokenManager,
    capabilities: CapabilityProbe,
    rate_limiter: RateLimiter,
}

impl PublishService {
    pub fn new(config: &Config, store: Arc<dyn SettingsStore>) -> Self {
        let client = TikTokClient::new(
            &config.tiktok_api_url,
            config.tiktok_client_key.clone(),
            config.tiktok_client_secret.clone(),
        );

        Self {
            tokens: TokenManager::new(client.clone(), store.clone()),
            capabilities: CapabilityProbe::new(client.clone(), store.clone()),
            rate_limiter: RateLimiter::new(store.clone(), config.daily_post_limit),
            client,
            store,
        }
    }

    /// Publish one post for `tenant_id`.
    ///
    /// Unpublishable media ends in [`PublishOutcome::Skipped`] before any
    /// credential, quota or upstream work. A request whose idempotency key
    /// already has a receipt returns the earlier result.
    pub async fn publish(
        &self,
        tenant_id: &str,
        request: PublishRequest,
        mut conn: TenantConnection,
    ) -> Result<PublishOutcome, AppError> {
        if !conn.is_connected() {
            return Err(AppError::NotConnected);
        }

        let media = match media::resolve(&request) {
            ResolvedMedia::Skip { reason } => {
                tracing::info!(tenant_id, reason = %reason, "Skipping TikTok post");
                return Ok(PublishOutcome::Skipped { reason });
            }
            resolved => resolved,
        };

        let today = utc_date(Utc::now());

        if let Some(key) = &request.idempotency_key {
            if let Some(receipt) = self.store.find_receipt(tenant_id, key).await? {
                tracing::info!(
                    tenant_id,
                    publish_id = %receipt.publish_id,
                    "Duplicate invocation, returning earlier result"
                );
                return Ok(PublishOutcome::Published(
                    self.duplicate_result(receipt, &conn, &today),
                ));
            }
        }

        let access_token = self
            .tokens
            .get_valid_access_token(tenant_id, &mut conn)
            .await?;

        let creator = self
            .capabilities
            .fetch_capabilities(tenant_id, &access_token, &mut conn)
            .await?;

        let privacy_level = resolve_privacy_level(
            &request.requested_privacy_level,
            request.branded_content,
            &creator.privacy_level_options,
        )?;
        if privacy_level != request.requested_privacy_level {
            tracing::info!(
                tenant_id,
                requested = %request.requested_privacy_level,
                resolved = %privacy_level,
                "Privacy level adjusted"
            );
        }

        let counter = self
            .rate_limiter
            .check_and_increment(tenant_id, &mut conn, &today)
            .await?;

        let title = build_post_text(
            &request.title,
            &request.description,
            &request.tags,
            TITLE_MAX_CHARS,
        );

        let (init, media_type, message) = match media {
            ResolvedMedia::Video { video_url } if request.post_as_draft => {
                let init = self
                    .client
                    .init_inbox_upload(&access_token, &video_url)
                    .await?;
                (
                    init,
                    MediaType::Video,
                    "Video sent to TikTok inbox; finish posting in the TikTok app".to_string(),
                )
            }
            ResolvedMedia::Video { video_url } => {
                let post_info = video_post_info(title, &privacy_level, &request, &creator);
                let init = self
                    .client
                    .init_video_publish(&access_token, &post_info, &video_url)
                    .await?;
                (
                    init,
                    MediaType::Video,
                    format!("Video upload initiated ({})", privacy_level),
                )
            }
            ResolvedMedia::Photo {
                images,
                truncated_from,
            } => {
                if let Some(original) = truncated_from {
                    tracing::info!(
                        tenant_id,
                        original,
                        kept = images.len(),
                        "Too many images, truncating carousel"
                    );
                }
                let post_info = PhotoPostInfo {
                    title,
                    description: truncate_chars(request.description.trim(), DESCRIPTION_MAX_CHARS),
                    privacy_level: privacy_level.clone(),
                    disable_comment: !request.allow_comment
                        || creator.comment_disabled_by_creator,
                    auto_add_music: true,
                };
                let init = self
                    .client
                    .init_photo_publish(&access_token, &post_info, &images)
                    .await?;
                (
                    init,
                    MediaType::Photo,
                    format!(
                        "Photo carousel with {} images submitted ({})",
                        images.len(),
                        privacy_level
                    ),
                )
            }
            ResolvedMedia::Skip { reason } => return Ok(PublishOutcome::Skipped { reason }),
        };

        tracing::info!(
            tenant_id,
            publish_id = %init.publish_id,
            media_type = ?media_type,
            privacy_level = %privacy_level,
            "TikTok publish initiated"
        );

        match self
            .client
            .fetch_publish_status(&access_token, &init.publish_id)
            .await
        {
            Ok(status) => tracing::info!(
                tenant_id,
                publish_id = %init.publish_id,
                status = ?status.status,
                fail_reason = ?status.fail_reason,
                "Initial publish status"
            ),
            Err(e) => tracing::warn!(
                tenant_id,
                publish_id = %init.publish_id,
                error = %e,
                "Publish status check failed"
            ),
        }

        if let Some(key) = request.idempotency_key {
            let receipt = PublishReceipt {
                tenant_id: tenant_id.to_string(),
                idempotency_key: key,
                publish_id: init.publish_id.clone(),
                media_type,
                privacy_level: privacy_level.clone(),
                created_at: format_utc_rfc3339(Utc::now()),
            };
            if let Err(e) = self.store.save_receipt(&receipt).await {
                tracing::warn!(tenant_id, error = %e, "Failed to save publish receipt");
            }
        }

        let limit = self.rate_limiter.daily_limit();
        Ok(PublishOutcome::Published(PublishResult {
            publish_id: init.publish_id,
            media_type,
            resolved_privacy_level: privacy_level,
            posts_today: counter.posts_today,
            posts_remaining: limit.saturating_sub(counter.posts_today),
            message,
            duplicate: false,
        }))
    }

    /// Verify the connection and report the account's posting abilities.
    ///
    /// Only the identity lookup must succeed; a failed creator-info query
    /// becomes a warning in the report.
    pub async fn test_connection(
        &self,
        tenant_id: &str,
        mut conn: TenantConnection,
    ) -> Result<ConnectionReport, AppError> {
        if !conn.is_connected() {
            return Err(AppError::NotConnected);
        }

        let access_token = self
            .tokens
            .get_valid_access_token(tenant_id, &mut conn)
            .await?;

        let user = self.client.get_user_info(&access_token).await?;
        let display_name = user
            .display_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "TikTok User".to_string());

        let report = match self
            .capabilities
            .fetch_creator_info(tenant_id, &access_token, &mut conn)
            .await
        {
            Ok(info) => {
                let (posting_status, account_warning) = describe_capabilities(&info);
                ConnectionReport {
                    display_name,
                    follower_count: user.follower_count,
                    posting_status,
                    is_business_account: info.can_post(),
                    account_warning,
                    creator_info: Some(info),
                }
            }
            Err(e) => {
                tracing::warn!(tenant_id, error = %e, "Creator info check failed");
                ConnectionReport {
                    display_name,
                    follower_count: user.follower_count,
                    posting_status: "Posting permissions unavailable".to_string(),
                    is_business_account: false,
                    account_warning: Some(
                        "Could not verify posting permissions; the account may not be a \
                         Business account."
                            .to_string(),
                    ),
                    creator_info: None,
                }
            }
        };

        tracing::info!(
            tenant_id,
            business = report.is_business_account,
            "TikTok connection verified"
        );
        Ok(report)
    }

    fn duplicate_result(
        &self,
        receipt: PublishReceipt,
        conn: &TenantConnection,
        today: &str,
    ) -> PublishResult {
        let posts_today = if conn.posts_last_reset == today {
            conn.posts_today
        } else {
            0
        };
        PublishResult {
            message: format!("Already published as {}", receipt.publish_id),
            publish_id: receipt.publish_id,
            media_type: receipt.media_type,
            resolved_privacy_level: receipt.privacy_level,
            posts_today,
            posts_remaining: self.rate_limiter.daily_limit().saturating_sub(posts_today),
            duplicate: true,
        }
    }
}

/// Pick the privacy level to send upstream.
///
/// Branded content may not be private, so `SELF_ONLY` becomes the most
/// public tier. A level the creator does not offer falls back to the first
/// offered one (the first non-private one for branded content).
pub fn resolve_privacy_level(
    requested: &str,
    branded_content: bool,
    options: &[String],
) -> Result<String, AppError> {
    let level = if branded_content && requested == PRIVACY_SELF_ONLY {
        PRIVACY_PUBLIC
    } else {
        requested
    };

    if options.is_empty() || options.iter().any(|o| o == level) {
        return Ok(level.to_string());
    }

    let fallback = if branded_content {
        options.iter().find(|o| o.as_str() != PRIVACY_SELF_ONLY)
    } else {
        options.first()
    };

    fallback.cloned().ok_or_else(|| {
        AppError::Permission(
            "Branded content cannot be posted privately, and this account only allows \
             private posts."
                .to_string(),
        )
    })
}

fn video_post_info(
    title: String,
    privacy_level: &str,
    request: &PublishRequest,
    creator: &CreatorInfo,
) -> VideoPostInfo {
    VideoPostInfo {
        title,
        privacy_level: privacy_level.to_string(),
        disable_duet: !request.allow_duet || creator.duet_disabled_by_creator,
        disable_comment: !request.allow_comment || creator.comment_disabled_by_creator,
        disable_stitch: !request.allow_stitch || creator.stitch_disabled_by_creator,
        commercial: request.commercial_content_enabled.then_some(CommercialContent {
            brand_content_toggle: true,
            brand_organic_toggle: request.brand_organic,
            is_branded_content: request.branded_content,
        }),
    }
}

/// Human-readable posting status and optional warning for the test action.
fn describe_capabilities(info: &CreatorInfo) -> (String, Option<String>) {
    if !info.can_post() {
        return (
            "No posting permission (Business account required)".to_string(),
            Some(
                "Not a Business/Creator account. Switch to a Business account in the TikTok app."
                    .to_string(),
            ),
        );
    }

    if info.privacy_level_options.iter().any(|o| o == PRIVACY_PUBLIC) {
        ("Public posting available".to_string(), None)
    } else {
        (
            format!("Restricted: {}", info.privacy_level_options.join(", ")),
            None,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_requested_level_kept_when_offered() {
        let opts = options(&["PUBLIC_TO_EVERYONE", "SELF_ONLY"]);
        assert_eq!(
            resolve_privacy_level("SELF_ONLY", false, &opts).unwrap(),
            "SELF_ONLY"
        );
    }

    #[test]
    fn test_unavailable_level_falls_back_to_first_option() {
        let opts = options(&["FOLLOWER_OF_CREATOR"]);
        assert_eq!(
            resolve_privacy_level("PUBLIC_TO_EVERYONE", false, &opts).unwrap(),
            "FOLLOWER_OF_CREATOR"
        );
    }

    #[test]
    fn test_branded_content_never_private() {
        let opts = options(&["PUBLIC_TO_EVERYONE", "SELF_ONLY"]);
        assert_eq!(
            resolve_privacy_level("SELF_ONLY", true, &opts).unwrap(),
            "PUBLIC_TO_EVERYONE"
        );

        // Public tier not offered: first non-private option
        let opts = options(&["SELF_ONLY", "MUTUAL_FOLLOW_FRIENDS"]);
        assert_eq!(
            resolve_privacy_level("SELF_ONLY", true, &opts).unwrap(),
            "MUTUAL_FOLLOW_FRIENDS"
        );
    }

    #[test]
    fn test_branded_content_with_only_private_option_rejected() {
        let opts = options(&["SELF_ONLY"]);
        let err = resolve_privacy_level("SELF_ONLY", true, &opts).unwrap_err();
        assert!(matches!(err, AppError::Permission(_)));
    }

    #[test]
    fn test_creator_disabled_interactions_win() {
        let request = PublishRequest {
            allow_comment: true,
            allow_duet: true,
            allow_stitch: true,
            ..Default::default()
        };
        let creator = CreatorInfo {
            duet_disabled_by_creator: true,
            ..Default::default()
        };
        let info = video_post_info("t".into(), "PUBLIC_TO_EVERYONE", &request, &creator);
        assert!(!info.disable_comment);
        assert!(info.disable_duet);
        assert!(!info.disable_stitch);
        assert!(info.commercial.is_none());
    }

    #[test]
    fn test_describe_capabilities() {
        let (status, warning) = describe_capabilities(&CreatorInfo::default());
        assert!(status.contains("No posting permission"));
        assert!(warning.is_some());

        let info = CreatorInfo {
            privacy_level_options: options(&["FOLLOWER_OF_CREATOR", "SELF_ONLY"]),
            ..Default::default()
        };
        let (status, warning) = describe_capabilities(&info);
        assert_eq!(status, "Restricted: FOLLOWER_OF_CREATOR, SELF_ONLY");
        assert!(warning.is_none());
    }
}
