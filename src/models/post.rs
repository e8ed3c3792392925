// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outgoing post as sent by the dispatcher, and the normalized publish
//! request the connector works with.

use crate::models::connection::PostingPreferences;
use serde::Deserialize;

/// Post payload as queued by the cross-post dispatcher.
///
/// Media may arrive as absolute URLs or as storage keys in several shapes;
/// [`PublishRequest::assemble`] folds them into one ordered URL list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPayload {
    #[serde(default)]
    pub post_id: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_key: Option<String>,
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    #[serde(default)]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default)]
    pub image_key: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,

    // Per-post overrides of the tenant's posting preferences
    #[serde(default)]
    pub privacy_level: Option<String>,
    #[serde(default)]
    pub allow_comment: Option<bool>,
    #[serde(default)]
    pub allow_duet: Option<bool>,
    #[serde(default)]
    pub allow_stitch: Option<bool>,
    #[serde(default)]
    pub post_as_draft: Option<bool>,
    #[serde(default)]
    pub commercial_content_enabled: Option<bool>,
    #[serde(default)]
    pub brand_organic: Option<bool>,
    #[serde(default)]
    pub branded_content: Option<bool>,
}

/// An entry of the `images` array: a bare reference or an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Plain(String),
    Object {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        key: Option<String>,
    },
}

impl ImageRef {
    fn reference(&self) -> Option<&str> {
        match self {
            ImageRef::Plain(s) => Some(s.as_str()),
            ImageRef::Object { url, key } => url.as_deref().or(key.as_deref()),
        }
    }
}

/// Normalized request for one publish attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishRequest {
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    /// Ordered; the first image becomes the carousel cover.
    pub image_urls: Vec<String>,
    pub tags: Vec<String>,
    pub requested_privacy_level: String,
    pub allow_comment: bool,
    pub allow_duet: bool,
    pub allow_stitch: bool,
    pub post_as_draft: bool,
    pub commercial_content_enabled: bool,
    pub brand_organic: bool,
    pub branded_content: bool,
    pub idempotency_key: Option<String>,
}

impl PublishRequest {
    /// Build a request from the wire post, filling unset flags from the
    /// tenant's preferences and resolving storage keys against
    /// `media_base_url`.
    pub fn assemble(post: PostPayload, prefs: &PostingPreferences, media_base_url: &str) -> Self {
        let video_url = post
            .video_url
            .as_deref()
            .or(post.video_key.as_deref())
            .and_then(|r| absolute_media_url(r, media_base_url));

        let image_urls: Vec<String> = if let Some(urls) = &post.image_urls {
            urls.iter()
                .filter_map(|r| absolute_media_url(r, media_base_url))
                .collect()
        } else if let Some(images) = &post.images {
            images
                .iter()
                .filter_map(ImageRef::reference)
                .filter_map(|r| absolute_media_url(r, media_base_url))
                .collect()
        } else {
            post.image_key
                .as_deref()
                .or(post.image_url.as_deref())
                .and_then(|r| absolute_media_url(r, media_base_url))
                .into_iter()
                .collect()
        };

        let idempotency_key = post
            .idempotency_key
            .or(post.post_id)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            title: post.title.unwrap_or_default(),
            description: post.description.unwrap_or_default(),
            video_url,
            image_urls,
            tags: post.tags,
            requested_privacy_level: post
                .privacy_level
                .unwrap_or_else(|| prefs.default_privacy.clone()),
            allow_comment: post.allow_comment.unwrap_or(prefs.allow_comment),
            allow_duet: post.allow_duet.unwrap_or(prefs.allow_duet),
            allow_stitch: post.allow_stitch.unwrap_or(prefs.allow_stitch),
            post_as_draft: post.post_as_draft.unwrap_or(prefs.post_as_draft),
            commercial_content_enabled: post
                .commercial_content_enabled
                .unwrap_or(prefs.commercial_content_enabled),
            brand_organic: post.brand_organic.unwrap_or(prefs.brand_organic),
            branded_content: post.branded_content.unwrap_or(prefs.branded_content),
            idempotency_key,
        }
    }
}

/// Turn a storage key into a public URL; absolute URLs pass through.
fn absolute_media_url(reference: &str, media_base_url: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("http") {
        return Some(reference.to_string());
    }
    Some(format!(
        "{}/{}",
        media_base_url.trim_end_matches('/'),
        reference.trim_start_matches('/')
    ))
}
