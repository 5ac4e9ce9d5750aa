//! Normalizes user input into a bare video identifier.
//!
//! Two URL shapes are recognized by prefix: the address-bar form
//! (`https://www.youtube.com/watch?v=<id>&...ab_channel=...`) and the share-link
//! form (`https://www.youtube.com/live/<id>?...`). Anything else is taken to be a
//! bare identifier already.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::api::youtube::VideoId;

static ADDRESS_BAR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://www\.youtube\.com/watch\?v=").unwrap());
static SHARE_LINK_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://www\.youtube\.com/live/").unwrap());
static ADDRESS_BAR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v=(?P<id>[\w\W]+)&[\w\W]+ab_channel").unwrap());
static SHARE_LINK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"live/(?P<id>[\w\W]+)\?").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// A known URL prefix matched but the identifier could not be captured
    #[error("Malformed {shape} URL: {input}")]
    Malformed { shape: &'static str, input: String },
}

/// Strips all whitespace from `raw` and extracts the video identifier.
pub fn normalize(raw: &str) -> Result<VideoId, LocatorError> {
    let input: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let (shape, pattern) = if ADDRESS_BAR_PREFIX.is_match(&input) {
        ("address-bar", &*ADDRESS_BAR_ID)
    } else if SHARE_LINK_PREFIX.is_match(&input) {
        ("share-link", &*SHARE_LINK_ID)
    } else {
        return Ok(VideoId(input));
    };

    let id = pattern
        .captures(&input)
        .and_then(|cap| cap.name("id"))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LocatorError::Malformed {
            shape,
            input: input.clone(),
        })?;

    tracing::debug!(shape, video_id = %id, "🔗 Extracted video id from URL");
    Ok(VideoId(id))
}
