// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decide what kind of TikTok post a request becomes.

use crate::models::{MediaType, PublishRequest};

/// A photo carousel needs at least this many images.
pub const MIN_PHOTOS: usize = 2;
/// TikTok accepts at most this many images per carousel.
pub const MAX_PHOTOS: usize = 35;

/// Outcome of media resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMedia {
    Video {
        video_url: String,
    },
    Photo {
        /// 2..=35 URLs in request order; the first is the cover.
        images: Vec<String>,
        /// Original image count when the list had to be cut down.
        truncated_from: Option<usize>,
    },
    /// Nothing TikTok can publish; not an error.
    Skip {
        reason: String,
    },
}

impl ResolvedMedia {
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            ResolvedMedia::Video { .. } => Some(MediaType::Video),
            ResolvedMedia::Photo { .. } => Some(MediaType::Photo),
            ResolvedMedia::Skip { .. } => None,
        }
    }
}

/// Classify a request. A video always wins over images.
pub fn resolve(request: &PublishRequest) -> ResolvedMedia {
    if let Some(video_url) = &request.video_url {
        return ResolvedMedia::Video {
            video_url: video_url.clone(),
        };
    }

    let count = request.image_urls.len();
    match count {
        0 => ResolvedMedia::Skip {
            reason: format!(
                "no publishable media: TikTok needs a video or at least {} images",
                MIN_PHOTOS
            ),
        },
        n if n < MIN_PHOTOS => ResolvedMedia::Skip {
            reason: format!(
                "TikTok needs at least {} images for a photo post (only {} provided)",
                MIN_PHOTOS, n
            ),
        },
        n => ResolvedMedia::Photo {
            images: request.image_urls.iter().take(MAX_PHOTOS).cloned().collect(),
            truncated_from: (n > MAX_PHOTOS).then_some(n),
        },
    }
}
