// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Caption text for TikTok posts.
//!
//! All lengths are in characters (Unicode scalar values), never bytes, so
//! truncation can't split a multi-byte character.

/// TikTok title limit.
pub const TITLE_MAX_CHARS: usize = 150;
/// TikTok photo description limit.
pub const DESCRIPTION_MAX_CHARS: usize = 2200;

/// Used when a post carries neither title nor description.
pub const FALLBACK_TEXT: &str = "New post";

const ELLIPSIS: &str = "...";

/// Combine title, description and tags into a caption of at most
/// `max_chars` characters.
///
/// Hashtags are appended only when they fit whole; otherwise the body is
/// cut to `max_chars - 3` characters and ends in `"..."`. Limits of three
/// or fewer characters get a plain cut.
pub fn build_post_text(title: &str, description: &str, tags: &[String], max_chars: usize) -> String {
    let title = title.trim();
    let description = description.trim();

    let mut text = if title.is_empty() && description.is_empty() {
        FALLBACK_TEXT.to_string()
    } else if description.is_empty() || title == description {
        if title.is_empty() { description } else { title }.to_string()
    } else if title.is_empty() {
        description.to_string()
    } else {
        format!("{} - {}", title, description)
    };

    let hashtags = format_hashtags(tags);
    if !hashtags.is_empty()
        && text.chars().count() + 1 + hashtags.chars().count() <= max_chars
    {
        text.push(' ');
        text.push_str(&hashtags);
    }

    if text.chars().count() > max_chars {
        // No room for the ellipsis: plain cut
        if max_chars <= ELLIPSIS.len() {
            return truncate_chars(&text, max_chars);
        }
        text = text.chars().take(max_chars - ELLIPSIS.len()).collect();
        text.push_str(ELLIPSIS);
    }

    text
}

/// `#tag` for each non-empty tag, space separated.
fn format_hashtags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
