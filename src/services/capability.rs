// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Creator capability lookup and caching.

use crate::db::SettingsStore;
use crate::error::AppError;
use crate::models::{CreatorInfo, TenantConnection, DEFAULT_MAX_VIDEO_DURATION_SECS};
use crate::services::tiktok::{CreatorInfoData, TikTokClient};
use crate::time_utils::format_utc_rfc3339;
use chrono::Utc;
use std::sync::Arc;

/// Shown when TikTok offers no privacy levels at all.
pub const NO_POSTING_PERMISSION: &str = "No posting permission. TikTok requires a Business or \
     Creator account; switch the account type in the TikTok app.";

/// Queries what the creator may post and caches it on the connection.
#[derive(Clone)]
pub struct CapabilityProbe {
    client: TikTokClient,
    store: Arc<dyn SettingsStore>,
}

impl CapabilityProbe {
    pub fn new(client: TikTokClient, store: Arc<dyn SettingsStore>) -> Self {
        Self { client, store }
    }

    /// Query creator info and cache it, without judging the result.
    ///
    /// A failed cache write is logged and otherwise ignored.
    pub async fn fetch_creator_info(
        &self,
        tenant_id: &str,
        access_token: &str,
        conn: &mut TenantConnection,
    ) -> Result<CreatorInfo, AppError> {
        let data = self.client.query_creator_info(access_token).await?;
        let info = creator_info_from(data);

        tracing::debug!(
            tenant_id,
            privacy_options = ?info.privacy_level_options,
            max_video_duration = info.max_video_duration,
            "Fetched creator info"
        );

        if let Err(e) = self.store.update_creator_info(tenant_id, &info).await {
            tracing::warn!(tenant_id, error = %e, "Failed to cache creator info");
        }
        conn.creator_info = info.clone();

        Ok(info)
    }

    /// Fetch capabilities for a publish; an account that offers no privacy
    /// level cannot post at all.
    pub async fn fetch_capabilities(
        &self,
        tenant_id: &str,
        access_token: &str,
        conn: &mut TenantConnection,
    ) -> Result<CreatorInfo, AppError> {
        let info = self
            .fetch_creator_info(tenant_id, access_token, conn)
            .await?;

        if !info.can_post() {
            tracing::warn!(tenant_id, "No privacy options, account cannot post");
            return Err(AppError::Permission(NO_POSTING_PERMISSION.to_string()));
        }

        Ok(info)
    }
}

fn creator_info_from(data: CreatorInfoData) -> CreatorInfo {
    CreatorInfo {
        privacy_level_options: data.privacy_level_options,
        max_video_duration: data
            .max_video_post_duration_sec
            .filter(|d| *d > 0)
            .unwrap_or(DEFAULT_MAX_VIDEO_DURATION_SECS),
        comment_disabled_by_creator: data.comment_disabled,
        duet_disabled_by_creator: data.duet_disabled,
        stitch_disabled_by_creator: data.stitch_disabled,
        creator_info_updated_at: Some(format_utc_rfc3339(Utc::now())),
    }
}
