// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TikTok Content Posting API client.
//!
//! Handles:
//! - Refresh-token grant
//! - Creator info (posting capabilities) and user info
//! - Video (direct and inbox) and photo-carousel upload-init via PULL_FROM_URL
//! - Publish status fetch
//!
//! Every JSON endpoint answers with `{data, error: {code, message}}`;
//! anything but `code == "ok"` is surfaced as an [`AppError`].

use crate::error::AppError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// TikTok API client.
#[derive(Clone)]
pub struct TikTokClient {
    http: reqwest::Client,
    base_url: String,
    client_key: String,
    client_secret: String,
}

impl TikTokClient {
    /// Create a new TikTok client with OAuth credentials.
    pub fn new(base_url: &str, client_key: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_key,
            client_secret,
        }
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The token endpoint is not enveloped: failures come back as
    /// `{error, error_description}` next to a missing `access_token`.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRefreshResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/oauth/token/", self.base_url))
            .form(&[
                ("client_key", self.client_key.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // An unparseable body is an upstream outage, not a rejected grant
        let parsed: TokenRefreshResponse =
            serde_json::from_str(&body).map_err(|e| AppError::Platform {
                code: format!("http_{}", status.as_u16()),
                message: if status.is_success() {
                    format!("Token refresh JSON parse error: {}", e)
                } else {
                    format!("Token refresh HTTP {}: {}", status, body)
                },
            })?;

        if parsed.access_token.is_none() || parsed.error.as_deref().is_some_and(|e| !e.is_empty())
        {
            tracing::warn!(
                status = %status,
                error = ?parsed.error,
                "TikTok token refresh rejected"
            );
        }

        Ok(parsed)
    }

    /// Query the creator's posting capabilities.
    pub async fn query_creator_info(&self, access_token: &str) -> Result<CreatorInfoData, AppError> {
        self.post_enveloped(
            "post/publish/creator_info/query/",
            access_token,
            &serde_json::json!({}),
        )
        .await
    }

    /// Fetch the authenticated user's profile.
    pub async fn get_user_info(&self, access_token: &str) -> Result<TikTokUser, AppError> {
        let response = self
            .http
            .get(format!("{}/user/info/", self.base_url))
            .bearer_auth(access_token)
            .query(&[(
                "fields",
                "open_id,display_name,avatar_url,is_verified,follower_count",
            )])
            .send()
            .await
            .map_err(transport_error)?;

        let data: UserInfoData = self.check_envelope(response).await?;
        Ok(data.user)
    }

    /// Start a direct video publish.
    pub async fn init_video_publish(
        &self,
        access_token: &str,
        post_info: &VideoPostInfo,
        video_url: &str,
    ) -> Result<PublishInitData, AppError> {
        let body = serde_json::json!({
            "post_info": post_info,
            "source_info": SourceInfo::video(video_url),
        });
        self.post_enveloped("post/publish/video/init/", access_token, &body)
            .await
    }

    /// Send a video to the creator's inbox as a draft.
    pub async fn init_inbox_upload(
        &self,
        access_token: &str,
        video_url: &str,
    ) -> Result<PublishInitData, AppError> {
        let body = serde_json::json!({
            "source_info": SourceInfo::video(video_url),
        });
        self.post_enveloped("post/publish/inbox/video/init/", access_token, &body)
            .await
    }

    /// Start a photo-carousel publish. `image_urls` must already be capped.
    pub async fn init_photo_publish(
        &self,
        access_token: &str,
        post_info: &PhotoPostInfo,
        image_urls: &[String],
    ) -> Result<PublishInitData, AppError> {
        let body = serde_json::json!({
            "post_info": post_info,
            "source_info": SourceInfo::photos(image_urls),
            "post_mode": "DIRECT_POST",
            "media_type": "PHOTO",
        });
        self.post_enveloped("post/publish/content/init/", access_token, &body)
            .await
    }

    /// Fetch the processing status of a publish.
    pub async fn fetch_publish_status(
        &self,
        access_token: &str,
        publish_id: &str,
    ) -> Result<PublishStatusData, AppError> {
        self.post_enveloped(
            "post/publish/status/fetch/",
            access_token,
            &serde_json::json!({ "publish_id": publish_id }),
        )
        .await
    }

    /// Bearer-authenticated JSON POST with an enveloped response.
    async fn post_enveloped<T, B>(&self, path: &str, access_token: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(
                serde_json::to_vec(body)
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("Encode {}: {}", path, e)))?,
            )
            .send()
            .await
            .map_err(transport_error)?;

        self.check_envelope(response).await
    }

    /// Check the `{data, error}` envelope and return `data`.
    async fn check_envelope<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Error responses carry `"data": {}`, so the error object is read
        // before `data` is decoded into `T`.
        let envelope: ApiEnvelope<serde_json::Value> = match serde_json::from_str(&body) {
            Ok(e) => e,
            Err(e) => {
                if status.as_u16() == 429 {
                    tracing::warn!("TikTok rate limit hit (429)");
                }
                return Err(AppError::Platform {
                    code: format!("http_{}", status.as_u16()),
                    message: if status.is_success() {
                        format!("JSON parse error: {}", e)
                    } else {
                        format!("HTTP {}: {}", status, body)
                    },
                });
            }
        };

        if envelope.error.code != "ok" {
            tracing::warn!(
                status = %status,
                code = %envelope.error.code,
                log_id = ?envelope.error.log_id,
                "TikTok API returned error envelope"
            );
            return Err(AppError::from_platform(
                &envelope.error.code,
                &envelope.error.message,
            ));
        }

        let data = envelope.data.ok_or_else(|| AppError::Platform {
            code: "missing_data".to_string(),
            message: "TikTok response carried no data".to_string(),
        })?;

        serde_json::from_value(data).map_err(|e| AppError::Platform {
            code: "invalid_data".to_string(),
            message: format!("Unexpected TikTok response data: {}", e),
        })
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Platform {
        code: "transport".to_string(),
        message: e.to_string(),
    }
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: Option<T>,
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    log_id: Option<String>,
}

/// Token refresh response from TikTok.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: Option<i64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `data` of the creator info query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatorInfoData {
    #[serde(default)]
    pub privacy_level_options: Vec<String>,
    pub max_video_post_duration_sec: Option<u32>,
    #[serde(default)]
    pub comment_disabled: bool,
    #[serde(default)]
    pub duet_disabled: bool,
    #[serde(default)]
    pub stitch_disabled: bool,
    pub creator_nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfoData {
    user: TikTokUser,
}

/// Authenticated TikTok user profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TikTokUser {
    pub open_id: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub follower_count: u64,
}

/// `data` of every upload-init call.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishInitData {
    pub publish_id: String,
}

/// `data` of the publish status fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishStatusData {
    pub status: Option<String>,
    pub fail_reason: Option<String>,
}

/// `post_info` for a direct video publish.
#[derive(Debug, Clone, Serialize)]
pub struct VideoPostInfo {
    pub title: String,
    pub privacy_level: String,
    pub disable_duet: bool,
    pub disable_comment: bool,
    pub disable_stitch: bool,
    #[serde(flatten)]
    pub commercial: Option<CommercialContent>,
}

/// Commercial content disclosure toggles.
#[derive(Debug, Clone, Serialize)]
pub struct CommercialContent {
    pub brand_content_toggle: bool,
    pub brand_organic_toggle: bool,
    pub is_branded_content: bool,
}

/// `post_info` for a photo carousel.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoPostInfo {
    pub title: String,
    pub description: String,
    pub privacy_level: String,
    pub disable_comment: bool,
    pub auto_add_music: bool,
}

#[derive(Debug, Serialize)]
struct SourceInfo<'a> {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_cover_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_images: Option<&'a [String]>,
}

impl<'a> SourceInfo<'a> {
    const PULL_FROM_URL: &'static str = "PULL_FROM_URL";

    fn video(video_url: &'a str) -> Self {
        Self {
            source: Self::PULL_FROM_URL,
            video_url: Some(video_url),
            photo_cover_index: None,
            photo_images: None,
        }
    }

    /// First image is the cover.
    fn photos(image_urls: &'a [String]) -> Self {
        Self {
            source: Self::PULL_FROM_URL,
            video_url: None,
            photo_cover_index: Some(0),
            photo_images: Some(image_urls),
        }
    }
}
