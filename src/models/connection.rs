// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-tenant TikTok connection record and its partial-update groups.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Most-public privacy tier offered by TikTok.
pub const PRIVACY_PUBLIC: &str = "PUBLIC_TO_EVERYONE";
/// Private ("only me") privacy tier.
pub const PRIVACY_SELF_ONLY: &str = "SELF_ONLY";

/// Fallback when the creator info omits `max_video_post_duration_sec`.
pub const DEFAULT_MAX_VIDEO_DURATION_SECS: u32 = 600;

/// TikTok connection state for one tenant, stored in the settings table.
///
/// Created when the tenant links the account and mutated by every
/// refresh/publish call through field-masked updates.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConnection {
    #[serde(rename = "tenant_id", default)]
    pub tenant_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token expiry (epoch milliseconds)
    #[serde(default)]
    pub expires_at: i64,

    #[serde(default)]
    pub posts_today: u32,
    /// UTC date (`YYYY-MM-DD`) the counter belongs to; empty if never set
    #[serde(default)]
    pub posts_last_reset: String,

    #[serde(flatten)]
    pub creator_info: CreatorInfo,

    #[serde(flatten)]
    pub preferences: PostingPreferences,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl TenantConnection {
    /// True when an access token is stored at all.
    pub fn is_connected(&self) -> bool {
        self.access_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

// Tokens are secrets; keep them out of logs.
impl std::fmt::Debug for TenantConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantConnection")
            .field("tenant_id", &self.tenant_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("posts_today", &self.posts_today)
            .field("posts_last_reset", &self.posts_last_reset)
            .field("creator_info", &self.creator_info)
            .field("preferences", &self.preferences)
            .finish()
    }
}

/// Creator capabilities reported by TikTok, cached on the connection for
/// the admin UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatorInfo {
    #[serde(default)]
    pub privacy_level_options: Vec<String>,
    #[serde(default = "default_max_video_duration")]
    pub max_video_duration: u32,
    #[serde(default)]
    pub comment_disabled_by_creator: bool,
    #[serde(default)]
    pub duet_disabled_by_creator: bool,
    #[serde(default)]
    pub stitch_disabled_by_creator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_info_updated_at: Option<String>,
}

fn default_max_video_duration() -> u32 {
    DEFAULT_MAX_VIDEO_DURATION_SECS
}

impl Default for CreatorInfo {
    fn default() -> Self {
        Self {
            privacy_level_options: Vec::new(),
            max_video_duration: DEFAULT_MAX_VIDEO_DURATION_SECS,
            comment_disabled_by_creator: false,
            duet_disabled_by_creator: false,
            stitch_disabled_by_creator: false,
            creator_info_updated_at: None,
        }
    }
}

impl CreatorInfo {
    /// An empty option list means the account cannot post (personal tier).
    pub fn can_post(&self) -> bool {
        !self.privacy_level_options.is_empty()
    }
}

/// Tenant defaults applied when a post does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingPreferences {
    #[serde(default = "default_privacy")]
    pub default_privacy: String,
    #[serde(default)]
    pub allow_comment: bool,
    #[serde(default)]
    pub allow_duet: bool,
    #[serde(default)]
    pub allow_stitch: bool,
    #[serde(default)]
    pub post_as_draft: bool,
    #[serde(default)]
    pub commercial_content_enabled: bool,
    #[serde(default)]
    pub brand_organic: bool,
    #[serde(default)]
    pub branded_content: bool,
}

fn default_privacy() -> String {
    PRIVACY_PUBLIC.to_string()
}

impl Default for PostingPreferences {
    fn default() -> Self {
        Self {
            default_privacy: default_privacy(),
            allow_comment: false,
            allow_duet: false,
            allow_stitch: false,
            post_as_draft: false,
            commercial_content_enabled: false,
            brand_organic: false,
            branded_content: false,
        }
    }
}

// ─── Partial update groups ───────────────────────────────────

/// Token fields written after a successful refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Epoch milliseconds
    pub expires_at: i64,
    pub updated_at: String,
}

impl TokenGrant {
    pub const FIELDS: [&'static str; 4] = ["accessToken", "refreshToken", "expiresAt", "updatedAt"];

    pub fn apply_to(&self, conn: &mut TenantConnection) {
        conn.access_token = Some(self.access_token.clone());
        conn.refresh_token = Some(self.refresh_token.clone());
        conn.expires_at = self.expires_at;
        conn.updated_at = Some(self.updated_at.clone());
    }
}

/// Daily post counter fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCounter {
    pub posts_today: u32,
    pub posts_last_reset: String,
    pub updated_at: String,
}

impl PostCounter {
    pub const FIELDS: [&'static str; 3] = ["postsToday", "postsLastReset", "updatedAt"];

    pub fn apply_to(&self, conn: &mut TenantConnection) {
        conn.posts_today = self.posts_today;
        conn.posts_last_reset = self.posts_last_reset.clone();
        conn.updated_at = Some(self.updated_at.clone());
    }
}

impl CreatorInfo {
    pub const FIELDS: [&'static str; 6] = [
        "privacyLevelOptions",
        "maxVideoDuration",
        "commentDisabledByCreator",
        "duetDisabledByCreator",
        "stitchDisabledByCreator",
        "creatorInfoUpdatedAt",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_settings_item() {
        let json = serde_json::json!({
            "tenant_id": "tenant-a",
            "accessToken": "act.123",
            "refreshToken": "rft.456",
            "expiresAt": 1_760_000_000_000i64,
            "postsToday": 3,
            "postsLastReset": "2026-10-18",
            "privacyLevelOptions": ["PUBLIC_TO_EVERYONE", "SELF_ONLY"],
            "postAsDraft": true,
            "enabled": true
        });

        let conn: TenantConnection = serde_json::from_value(json).unwrap();

        assert_eq!(conn.tenant_id, "tenant-a");
        assert!(conn.is_connected());
        assert_eq!(conn.posts_today, 3);
        assert_eq!(conn.creator_info.privacy_level_options.len(), 2);
        assert_eq!(conn.creator_info.max_video_duration, 600);
        assert!(conn.preferences.post_as_draft);
        assert_eq!(conn.preferences.default_privacy, PRIVACY_PUBLIC);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let conn = TenantConnection {
            access_token: Some("secret-access".into()),
            refresh_token: Some("secret-refresh".into()),
            ..Default::default()
        };
        let printed = format!("{:?}", conn);
        assert!(!printed.contains("secret-access"));
        assert!(!printed.contains("secret-refresh"));
    }

    #[test]
    fn test_blank_token_not_connected() {
        let conn = TenantConnection {
            access_token: Some("  ".into()),
            ..Default::default()
        };
        assert!(!conn.is_connected());
    }
}
