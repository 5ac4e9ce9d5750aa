//! YouTube live chat response model.
//!
//! Data structures for the InnerTube `get_live_chat` and `get_live_chat_replay`
//! responses, and the mapping from chat renderers to [`ChatEvent`]s.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::api::youtube::Continuation;
use crate::transport::ChatEvent;

const CHANNEL_URL_PREFIX: &str = "http://www.youtube.com/channel/";

/// Response from the YouTube Live Chat API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetLiveChatResponse {
    /// Absent once a replay has been read to the end
    #[serde(rename = "continuationContents", default)]
    pub continuation_contents: Option<ContinuationContents>,
}

/// Container for the live chat continuation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationContents {
    #[serde(rename = "liveChatContinuation")]
    pub live_chat_continuation: LiveChatContinuation,
}

/// Live chat continuation containing actions and tokens for the next request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveChatContinuation {
    /// Array of actions like new messages, deletions, etc.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Array of continuation data for future requests
    #[serde(default)]
    pub continuations: Vec<serde_json::Value>,
}

/// Formatted text, either a sequence of runs or a single simple text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub runs: Vec<MessageRun>,
    #[serde(rename = "simpleText", default, skip_serializing_if = "Option::is_none")]
    pub simple_text: Option<String>,
}

impl Message {
    /// Flattens the message into plain text. Custom emojis become their
    /// first shortcut (`:name:`), standard emojis their character.
    pub fn plain_text(&self) -> String {
        if let Some(text) = &self.simple_text {
            return text.clone();
        }
        self.runs
            .iter()
            .map(|run| match (run.get_text(), run.get_emoji()) {
                (Some(text), _) => text.to_string(),
                (None, Some(emoji)) => emoji.display_text().to_string(),
                (None, None) => String::new(),
            })
            .collect()
    }
}

/// A fragment of a message, containing either text or an emoji.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRun {
    pub text: Option<String>,
    pub emoji: Option<Emoji>,
}

impl MessageRun {
    pub fn get_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn get_emoji(&self) -> Option<&Emoji> {
        self.emoji.as_ref()
    }
}

/// Emoji data structure for custom and standard emojis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(rename = "emojiId", default)]
    pub emoji_id: String,
    #[serde(default)]
    pub shortcuts: Vec<String>,
    #[serde(rename = "isCustomEmoji", default)]
    pub is_custom_emoji: bool,
}

impl Emoji {
    fn display_text(&self) -> &str {
        match self.shortcuts.first() {
            Some(shortcut) if self.is_custom_emoji => shortcut,
            _ => &self.emoji_id,
        }
    }
}

/// Simple text container with plain text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleText {
    #[serde(rename = "simpleText")]
    pub simple_text: String,
}

/// Fields every author-attributed renderer carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorFields {
    pub id: String,
    /// Missing for authors without a display name
    #[serde(rename = "authorName", default)]
    pub author_name: Option<SimpleText>,
    /// Timestamp in microseconds when the message was sent
    #[serde(rename = "timestampUsec")]
    pub timestamp_usec: String,
    #[serde(rename = "authorExternalChannelId")]
    pub author_external_channel_id: String,
    /// Player offset label, only present in replays
    #[serde(rename = "timestampText", default)]
    pub timestamp_text: Option<SimpleText>,
}

/// Renderer for a standard text message in live chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveChatTextMessageRenderer {
    #[serde(flatten)]
    pub author: AuthorFields,
    pub message: Message,
}

/// Renderer for a paid message (Super Chat) in live chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveChatPaidMessageRenderer {
    #[serde(flatten)]
    pub author: AuthorFields,
    /// Super Chats may be sent without text
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(rename = "purchaseAmountText")]
    pub purchase_amount_text: SimpleText,
}

/// Renderer for a paid sticker (Super Sticker) in live chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveChatPaidStickerRenderer {
    #[serde(flatten)]
    pub author: AuthorFields,
    #[serde(rename = "purchaseAmountText")]
    pub purchase_amount_text: SimpleText,
}

/// Renderer for a membership item in live chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveChatMembershipItemRenderer {
    #[serde(flatten)]
    pub author: AuthorFields,
    #[serde(rename = "headerSubtext", default)]
    pub header_subtext: Option<Message>,
    #[serde(default)]
    pub message: Option<Message>,
}

/// Wrapper carrying an `addChatItemAction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddChatItemActionWrapper {
    #[serde(rename = "addChatItemAction")]
    pub action: AddChatItemAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddChatItemAction {
    pub item: ChatItem,
}

/// Wrapper carrying a `replayChatItemAction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayChatItemActionWrapper {
    #[serde(rename = "replayChatItemAction")]
    pub action: ReplayChatItemAction,
}

/// Replay actions wrap the live actions together with their player offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayChatItemAction {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(rename = "videoOffsetTimeMsec", default)]
    pub video_offset_time_msec: Option<String>,
}

/// Enum representing different types of actions in the live chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Action {
    /// Replayed action (archived streams only)
    ReplayChatItem(ReplayChatItemActionWrapper),
    /// Action to add a new chat message
    AddChatItem(AddChatItemActionWrapper),
    /// Ticker items, deletions, moderation commands, etc.
    Unknown(serde_json::Value),
}

/// Enum representing different types of chat items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatItem {
    TextMessage {
        #[serde(rename = "liveChatTextMessageRenderer")]
        renderer: LiveChatTextMessageRenderer,
    },
    PaidMessage {
        #[serde(rename = "liveChatPaidMessageRenderer")]
        renderer: LiveChatPaidMessageRenderer,
    },
    PaidSticker {
        #[serde(rename = "liveChatPaidStickerRenderer")]
        renderer: LiveChatPaidStickerRenderer,
    },
    MembershipItem {
        #[serde(rename = "liveChatMembershipItemRenderer")]
        renderer: LiveChatMembershipItemRenderer,
    },
    /// Engagement messages, placeholders, gift announcements, etc.
    Unknown(serde_json::Value),
}

impl ChatItem {
    /// Event type label written to the `type` column
    pub fn get_type(&self) -> &'static str {
        match self {
            ChatItem::TextMessage { .. } => "textMessage",
            ChatItem::PaidMessage { .. } => "superChat",
            ChatItem::PaidSticker { .. } => "superSticker",
            ChatItem::MembershipItem { .. } => "newSponsor",
            ChatItem::Unknown(_) => "unknown",
        }
    }

    /// Maps the item to a [`ChatEvent`]. Items without an author are skipped.
    pub fn to_event(&self) -> Option<ChatEvent> {
        let (author, message, purchase) = match self {
            ChatItem::TextMessage { renderer } => {
                (&renderer.author, renderer.message.plain_text(), None)
            }
            ChatItem::PaidMessage { renderer } => (
                &renderer.author,
                renderer
                    .message
                    .as_ref()
                    .map(Message::plain_text)
                    .unwrap_or_default(),
                Some(&renderer.purchase_amount_text.simple_text),
            ),
            ChatItem::PaidSticker { renderer } => (
                &renderer.author,
                String::new(),
                Some(&renderer.purchase_amount_text.simple_text),
            ),
            ChatItem::MembershipItem { renderer } => (
                &renderer.author,
                renderer
                    .message
                    .as_ref()
                    .or(renderer.header_subtext.as_ref())
                    .map(Message::plain_text)
                    .unwrap_or_default(),
                None,
            ),
            ChatItem::Unknown(_) => return None,
        };

        let (currency, amount) = purchase
            .map(|text| parse_purchase_amount(text))
            .unwrap_or_default();

        Some(ChatEvent {
            datetime: format_timestamp_usec(&author.timestamp_usec),
            elapsed_time: author
                .timestamp_text
                .as_ref()
                .map(|t| t.simple_text.clone())
                .unwrap_or_default(),
            author_name: author
                .author_name
                .as_ref()
                .map(|n| n.simple_text.clone())
                .unwrap_or_default(),
            message,
            event_type: self.get_type().to_string(),
            currency,
            amount,
            author_channel_url: format!(
                "{}{}",
                CHANNEL_URL_PREFIX, author.author_external_channel_id
            ),
        })
    }
}

impl GetLiveChatResponse {
    pub fn actions(&self) -> &[Action] {
        self.continuation_contents
            .as_ref()
            .map(|c| c.live_chat_continuation.actions.as_slice())
            .unwrap_or_default()
    }

    /// Chat items in response order, with replay wrappers unpacked.
    pub fn chat_items(&self) -> Vec<&ChatItem> {
        let mut items = Vec::new();
        collect_chat_items(self.actions(), &mut items);
        items
    }

    /// Maps every supported chat item of the response to a [`ChatEvent`].
    pub fn to_events(&self) -> Vec<ChatEvent> {
        self.chat_items()
            .into_iter()
            .filter_map(ChatItem::to_event)
            .collect()
    }
}

fn collect_chat_items<'a>(actions: &'a [Action], items: &mut Vec<&'a ChatItem>) {
    for action in actions {
        match action {
            Action::ReplayChatItem(wrapper) => collect_chat_items(&wrapper.action.actions, items),
            Action::AddChatItem(wrapper) => items.push(&wrapper.action.item),
            Action::Unknown(_) => {}
        }
    }
}

/// Extract the continuation token for the next request from a response.
///
/// Returns `None` when the log has been read to the end. A replay's last page
/// only carries a `playerSeekContinuationData`, which is not followed.
pub fn get_next_continuation(response: &GetLiveChatResponse) -> Option<Continuation> {
    response
        .continuation_contents
        .as_ref()?
        .live_chat_continuation
        .continuations
        .first()
        .and_then(|v| {
            v.get("liveChatReplayContinuationData")
                .or_else(|| v.get("invalidationContinuationData"))
                .or_else(|| v.get("timedContinuationData"))
                .or_else(|| v.get("reloadContinuationData"))
        })
        .and_then(|v| v.get("continuation"))
        .and_then(|v| v.as_str())
        .map(|s| Continuation(s.to_string()))
}

/// Renders `timestampUsec` as local `%Y-%m-%d %H:%M:%S`. Unparseable values
/// are passed through unchanged.
pub fn format_timestamp_usec(timestamp_usec: &str) -> String {
    timestamp_usec
        .parse::<i64>()
        .ok()
        .and_then(|usec| Local.timestamp_micros(usec).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_usec.to_string())
}

/// Splits a purchase label such as `¥1,000` or `CA$5.00` into a currency code
/// and a numeric amount.
pub fn parse_purchase_amount(text: &str) -> (String, f64) {
    let text = text.trim();
    let split = text
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(text.len());
    let (symbol, number) = text.split_at(split);

    let amount = number
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect::<String>()
        .parse::<f64>()
        .unwrap_or(0.0);

    (currency_code(symbol.trim()).to_string(), amount)
}

fn currency_code(symbol: &str) -> &str {
    match symbol {
        "$" => "USD",
        "¥" | "￥" => "JPY",
        "€" => "EUR",
        "£" => "GBP",
        "₩" => "KRW",
        "₹" => "INR",
        "₱" => "PHP",
        "₫" => "VND",
        "₪" => "ILS",
        "CA$" => "CAD",
        "A$" => "AUD",
        "NZ$" => "NZD",
        "HK$" => "HKD",
        "NT$" => "TWD",
        "MX$" => "MXN",
        "R$" => "BRL",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replay_response() -> GetLiveChatResponse {
        serde_json::from_value(serde_json::json!({
            "continuationContents": {
                "liveChatContinuation": {
                    "continuations": [
                        {"liveChatReplayContinuationData": {"continuation": "next_token"}}
                    ],
                    "actions": [
                        {"replayChatItemAction": {
                            "actions": [{"addChatItemAction": {
                                "item": {"liveChatTextMessageRenderer": {
                                    "id": "m1",
                                    "message": {"runs": [
                                        {"text": "hello "},
                                        {"emoji": {"emojiId": "UC/abc", "shortcuts": [":wave:"], "isCustomEmoji": true}},
                                        {"emoji": {"emojiId": "😀", "shortcuts": [":grinning:"]}}
                                    ]},
                                    "authorName": {"simpleText": "Alice"},
                                    "timestampUsec": "1700000000000000",
                                    "authorExternalChannelId": "UCalice",
                                    "timestampText": {"simpleText": "0:05"}
                                }},
                                "clientId": "c1"
                            }}],
                            "videoOffsetTimeMsec": "5000"
                        }},
                        {"replayChatItemAction": {
                            "actions": [{"addChatItemAction": {
                                "item": {"liveChatPaidMessageRenderer": {
                                    "id": "m2",
                                    "authorName": {"simpleText": "Bob"},
                                    "timestampUsec": "1700000001000000",
                                    "authorExternalChannelId": "UCbob",
                                    "purchaseAmountText": {"simpleText": "¥1,000"},
                                    "timestampText": {"simpleText": "0:06"}
                                }}
                            }}],
                            "videoOffsetTimeMsec": "6000"
                        }},
                        {"replayChatItemAction": {
                            "actions": [{"addLiveChatTickerItemAction": {"item": {}}}]
                        }},
                        {"replayChatItemAction": {
                            "actions": [{"addChatItemAction": {
                                "item": {"liveChatViewerEngagementMessageRenderer": {"id": "sys"}}
                            }}]
                        }}
                    ]
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_get_next_continuation() {
        let response = replay_response();
        assert_eq!(
            get_next_continuation(&response),
            Some(Continuation("next_token".to_string()))
        );
    }

    #[test]
    fn test_get_next_continuation_ignores_player_seek() {
        let response: GetLiveChatResponse = serde_json::from_value(serde_json::json!({
            "continuationContents": {"liveChatContinuation": {
                "continuations": [{"playerSeekContinuationData": {"continuation": "seek"}}]
            }}
        }))
        .unwrap();
        assert_eq!(get_next_continuation(&response), None);
    }

    #[test]
    fn test_response_without_contents_is_end_of_log() {
        let response: GetLiveChatResponse =
            serde_json::from_value(serde_json::json!({"responseContext": {}})).unwrap();
        assert!(response.actions().is_empty());
        assert_eq!(get_next_continuation(&response), None);
    }

    #[test]
    fn test_chat_items_unpacks_replay_actions() {
        let response = replay_response();
        let types: Vec<_> = response.chat_items().iter().map(|i| i.get_type()).collect();
        assert_eq!(types, vec!["textMessage", "superChat", "unknown"]);
    }

    #[test]
    fn test_to_events_maps_fields() {
        let events = replay_response().to_events();
        assert_eq!(events.len(), 2);

        let text = &events[0];
        assert_eq!(text.author_name, "Alice");
        assert_eq!(text.message, "hello :wave:😀");
        assert_eq!(text.elapsed_time, "0:05");
        assert_eq!(text.event_type, "textMessage");
        assert_eq!(text.currency, "");
        assert_eq!(text.amount, 0.0);
        assert_eq!(text.author_channel_url, "http://www.youtube.com/channel/UCalice");
        assert_eq!(text.datetime, format_timestamp_usec("1700000000000000"));

        let paid = &events[1];
        assert_eq!(paid.event_type, "superChat");
        assert_eq!(paid.message, "");
        assert_eq!(paid.currency, "JPY");
        assert_eq!(paid.amount, 1000.0);
    }

    #[test]
    fn test_membership_falls_back_to_header_subtext() {
        let item: ChatItem = serde_json::from_value(serde_json::json!({
            "liveChatMembershipItemRenderer": {
                "id": "m3",
                "authorName": {"simpleText": "Carol"},
                "timestampUsec": "1700000002000000",
                "authorExternalChannelId": "UCcarol",
                "headerSubtext": {"simpleText": "Welcome to the club!"}
            }
        }))
        .unwrap();
        let event = item.to_event().unwrap();
        assert_eq!(event.event_type, "newSponsor");
        assert_eq!(event.message, "Welcome to the club!");
        assert_eq!(event.elapsed_time, "");
    }

    #[test]
    fn test_format_timestamp_usec_passthrough() {
        assert_eq!(format_timestamp_usec("not-a-number"), "not-a-number");
        assert_eq!(format_timestamp_usec("1700000000000000").len(), 19);
    }

    #[test]
    fn test_parse_purchase_amount() {
        assert_eq!(parse_purchase_amount("$5.00"), ("USD".to_string(), 5.0));
        assert_eq!(parse_purchase_amount("CA$10.50"), ("CAD".to_string(), 10.5));
        assert_eq!(parse_purchase_amount("￥12,000"), ("JPY".to_string(), 12000.0));
        assert_eq!(parse_purchase_amount("CHF 20.00"), ("CHF".to_string(), 20.0));
        assert_eq!(parse_purchase_amount(""), ("".to_string(), 0.0));
    }
}
