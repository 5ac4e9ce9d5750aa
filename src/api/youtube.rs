use regex::Regex;
use std::sync::LazyLock;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),
    #[error("HTTP request failed with status: {0}")]
    Status(reqwest::StatusCode),
    #[error("{0} not found in watch page")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, derive_more::Display)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, derive_more::Display)]
pub struct ClientVersion(String);

impl ClientVersion {
    pub fn new(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Continuation(pub String);

static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link rel="canonical" href="https:\/\/www\.youtube\.com\/watch\?v=(.+?)">"#)
        .unwrap()
});
static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]INNERTUBE_API_KEY['"]:\s*['"](.+?)['"]"#).unwrap());
static REPLAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]isReplay['"]:\s*true"#).unwrap());
static CLIENT_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"['"]INNERTUBE_CLIENT_VERSION['"]:\s*['"](.+?)['"]"#).unwrap()
});
static CHAT_CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"['"]liveChatRenderer['"]:\s*\{\s*['"]continuations['"]:\s*\[\s*\{\s*['"]reloadContinuationData['"]:\s*\{\s*['"]continuation['"]:\s*['"](.+?)['"]"#,
    )
    .unwrap()
});

pub fn extract_video_id(html: &str) -> Option<VideoId> {
    CANONICAL_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| VideoId(m.as_str().to_string()))
}

pub fn extract_api_key(html: &str) -> Option<ApiKey> {
    API_KEY_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| ApiKey::new(m.as_str().to_string()))
}

pub fn extract_replay(html: &str) -> bool {
    REPLAY_RE.is_match(html)
}

pub fn extract_client_version(html: &str) -> Option<ClientVersion> {
    CLIENT_VERSION_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| ClientVersion::new(m.as_str().to_string()))
}

/// Initial chat continuation embedded in the watch page's `liveChatRenderer`.
/// Absent when the video has no chat at all.
pub fn extract_chat_continuation(html: &str) -> Option<Continuation> {
    CHAT_CONTINUATION_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| Continuation(m.as_str().to_string()))
}
