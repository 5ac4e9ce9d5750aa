pub mod get_live_chat;

use async_trait::async_trait;

use crate::api::innertube::get_live_chat::{get_next_continuation, GetLiveChatResponse};
use crate::api::youtube::{ApiKey, ClientVersion, Continuation, FetchError, VideoId};
use crate::config::FetchConfig;
use crate::transport::{Batch, ChatSession, ChatTransport};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const LIVE_CHAT_URL: &str = "https://www.youtube.com/youtubei/v1/live_chat/get_live_chat";
const LIVE_CHAT_REPLAY_URL: &str =
    "https://www.youtube.com/youtubei/v1/live_chat/get_live_chat_replay";

/// An open InnerTube chat session for one video.
#[derive(Debug, Clone)]
pub struct InnerTube {
    pub video_id: VideoId,
    pub api_key: ApiKey,
    pub is_replay: bool,
    pub client_version: ClientVersion,
    pub gl: String,
    pub hl: String,
    pub user_agent: String,
    /// `None` once the log has been read to the end or the session terminated
    pub continuation: Option<Continuation>,
    pub http_client: reqwest::Client,
}

impl InnerTube {
    pub fn new(
        video_id: VideoId,
        api_key: ApiKey,
        client_version: ClientVersion,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            video_id,
            api_key,
            is_replay: false,
            client_version,
            gl: "US".to_string(),
            hl: "en".to_string(),
            user_agent: FetchConfig::default().user_agent,
            continuation: None,
            http_client,
        }
    }

    fn endpoint(&self) -> &'static str {
        if self.is_replay {
            LIVE_CHAT_REPLAY_URL
        } else {
            LIVE_CHAT_URL
        }
    }
}

/// Builds an [`InnerTube`] session from a watch page.
pub fn parse_watch_page(
    html: &str,
    requested: &VideoId,
    http_client: reqwest::Client,
) -> Result<InnerTube, FetchError> {
    use crate::api::youtube::{
        extract_api_key, extract_chat_continuation, extract_client_version, extract_replay,
        extract_video_id,
    };

    let video_id = extract_video_id(html).ok_or_else(|| {
        tracing::warn!(video_id = %requested, "❌ Canonical watch link not found");
        FetchError::InvalidVideoId(requested.to_string())
    })?;
    let api_key = extract_api_key(html).ok_or(FetchError::MissingField("api_key"))?;
    let client_version =
        extract_client_version(html).ok_or(FetchError::MissingField("client_version"))?;

    let mut inner_tube = InnerTube::new(video_id, api_key, client_version, http_client);
    inner_tube.is_replay = extract_replay(html);
    inner_tube.continuation = extract_chat_continuation(html);

    if inner_tube.continuation.is_none() {
        tracing::info!(video_id = %inner_tube.video_id, "💤 No chat continuation on watch page");
    }

    Ok(inner_tube)
}

pub async fn fetch_watch_page(
    video_id: &VideoId,
    config: &FetchConfig,
    http_client: &reqwest::Client,
) -> Result<InnerTube, FetchError> {
    let url = format!("{}{}", WATCH_URL, video_id);
    tracing::info!("🌐 Fetching watch page: {}", url);

    let response = http_client
        .get(&url)
        .header("User-Agent", config.user_agent.as_str())
        .header("Accept-Language", config.hl.as_str())
        .send()
        .await
        .map_err(|e| {
            tracing::error!("❌ Failed to fetch URL: {}", e);
            e
        })?;

    let status = response.status();
    tracing::debug!("📄 Received HTTP response with status: {}", status);
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FetchError::InvalidVideoId(video_id.to_string()));
    }
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let html = response.text().await?;
    tracing::debug!("📄 HTML response length: {} chars", html.len());

    let mut inner_tube = parse_watch_page(&html, video_id, http_client.clone())?;
    inner_tube.gl = config.gl.clone();
    inner_tube.hl = config.hl.clone();
    inner_tube.user_agent = config.user_agent.clone();

    tracing::info!(
        video_id = %inner_tube.video_id,
        is_replay = inner_tube.is_replay,
        "✅ Successfully initialized InnerTube client"
    );
    Ok(inner_tube)
}

pub async fn fetch_live_chat_messages(
    inner_tube: &InnerTube,
    continuation: &Continuation,
) -> Result<GetLiveChatResponse, FetchError> {
    let url = format!("{}?key={}", inner_tube.endpoint(), inner_tube.api_key);

    let payload = serde_json::json!({
        "context": {
            "client": {
                "clientName": "WEB",
                "clientVersion": inner_tube.client_version.to_string(),
                "gl": inner_tube.gl.as_str(),
                "hl": inner_tube.hl.as_str(),
            }
        },
        "continuation": continuation.0.as_str(),
        "currentPlayerState": {"playerOffsetMs": "0"},
    });

    let response = inner_tube
        .http_client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("User-Agent", inner_tube.user_agent.as_str())
        .json(&payload)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("❌ HTTP request failed: {}", e);
            e
        })?;

    let status = response.status();
    tracing::debug!("📡 API response status: {}", status);
    if !status.is_success() {
        tracing::error!("❌ HTTP request failed with status: {}", status);
        return Err(FetchError::Status(status));
    }

    let response_text = response.text().await?;
    let live_chat_response: GetLiveChatResponse =
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!("❌ Failed to parse JSON response: {}", e);
            tracing::debug!(
                "🔍 Response text preview: {}",
                response_text.chars().take(200).collect::<String>()
            );
            e
        })?;

    Ok(live_chat_response)
}

#[async_trait]
impl ChatSession for InnerTube {
    fn is_alive(&self) -> bool {
        self.continuation.is_some()
    }

    fn is_replay(&self) -> bool {
        self.is_replay
    }

    async fn get(&mut self) -> Result<Batch, FetchError> {
        let Some(continuation) = self.continuation.clone() else {
            return Ok(Batch::new());
        };

        let response = fetch_live_chat_messages(self, &continuation).await?;
        self.continuation = get_next_continuation(&response);

        let events = response.to_events();
        tracing::debug!(
            actions = response.actions().len(),
            events = events.len(),
            has_continuation = self.continuation.is_some(),
            "📬 Chat page received"
        );
        Ok(events)
    }

    fn terminate(&mut self) {
        tracing::debug!(video_id = %self.video_id, "🛑 Terminating chat session");
        self.continuation = None;
    }
}

/// [`ChatTransport`] backed by the YouTube InnerTube web API.
#[derive(Debug, Clone)]
pub struct InnerTubeTransport {
    config: FetchConfig,
    http_client: reqwest::Client,
}

impl InnerTubeTransport {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ChatTransport for InnerTubeTransport {
    type Session = InnerTube;

    async fn open(&self, video_id: &VideoId) -> Result<InnerTube, FetchError> {
        fetch_watch_page(video_id, &self.config, &self.http_client).await
    }
}
