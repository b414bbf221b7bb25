use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{Messenger, UpdateSource};
use crate::domain::{
    ChatId, DomainError, InboundMessage, Keyboard, MessageRef, Reply, SessionKey, TextFormat,
};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
/// Seconds the server may hold a `getUpdates` call open.
const LONG_POLL_SECS: u64 = 30;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct Update {
    update_id: i64,
    message: Option<ApiMessage>,
}

#[derive(Deserialize)]
struct ApiMessage {
    message_id: i64,
    from: Option<ApiUser>,
    chat: ApiChat,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiUser {
    id: i64,
    first_name: String,
    username: Option<String>,
}

#[derive(Deserialize)]
struct ApiChat {
    id: i64,
}

#[derive(Serialize)]
struct GetUpdates<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ReplyKeyboardMarkup>,
}

#[derive(Serialize)]
struct EditMessageText<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

#[derive(Serialize)]
struct MessageTarget {
    chat_id: i64,
    message_id: i64,
}

#[derive(Serialize)]
struct SendChatAction {
    chat_id: i64,
    action: &'static str,
}

#[derive(Serialize)]
struct ReplyKeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
    one_time_keyboard: bool,
}

#[derive(Serialize)]
struct KeyboardButton {
    text: &'static str,
}

impl From<Keyboard> for ReplyKeyboardMarkup {
    fn from(keyboard: Keyboard) -> Self {
        Self {
            keyboard: keyboard
                .rows()
                .iter()
                .map(|row| row.iter().map(|&text| KeyboardButton { text }).collect())
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: keyboard.one_time(),
        }
    }
}

fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Markdown => Some("Markdown"),
    }
}

/// Map a failed Bot API call onto the domain error taxonomy.
fn classify_api_error(code: Option<i64>, description: &str) -> DomainError {
    let lowered = description.to_lowercase();
    if lowered.contains("message is not modified") {
        DomainError::MessageUnchanged
    } else if lowered.contains("message to edit not found")
        || lowered.contains("message to delete not found")
        || lowered.contains("message_id_invalid")
    {
        DomainError::message_not_found(description)
    } else {
        let code = code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string());
        DomainError::delivery(format!("Telegram API error {code}: {description}"))
    }
}

fn transport_error(method: &str, e: reqwest::Error) -> DomainError {
    // Request URLs embed the bot token.
    let e = e.without_url();
    if e.is_timeout() {
        DomainError::delivery_timeout(format!("{method}: {e}"))
    } else {
        DomainError::delivery(format!("{method}: {e}"))
    }
}

/// Telegram Bot API client: long-polls for inbound messages and performs
/// all outbound operations.
pub struct TelegramClient {
    client: reqwest::Client,
    /// `<api url>/bot<token>`
    base: String,
    /// Next `getUpdates` offset; acknowledges everything before it.
    offset: Mutex<i64>,
}

impl TelegramClient {
    pub fn new(token: &str, api_url: impl AsRef<str>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base: format!("{}/bot{}", api_url.as_ref().trim_end_matches('/'), token),
            offset: Mutex::new(0),
        }
    }

    /// Returns the bot's username; doubles as a token check.
    pub async fn get_me(&self) -> Result<String, DomainError> {
        let me: ApiUser = self.call("getMe", &serde_json::json!({})).await?;
        Ok(me.username.unwrap_or(me.first_name))
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, DomainError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(params)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;
        Self::unwrap_envelope(method, response).await
    }

    async fn unwrap_envelope<R: DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<R, DomainError> {
        let envelope: ApiEnvelope<R> = response
            .json()
            .await
            .map_err(|e| transport_error(method, e))?;

        if !envelope.ok {
            let description = envelope.description.unwrap_or_default();
            return Err(classify_api_error(envelope.error_code, &description));
        }

        envelope
            .result
            .ok_or_else(|| DomainError::delivery(format!("{method}: response has no result")))
    }

    fn to_inbound(update: Update) -> Option<InboundMessage> {
        let message = update.message?;
        let Some(from) = message.from else {
            debug!("Skipping update {} without sender", update.update_id);
            return None;
        };
        let Some(text) = message.text else {
            debug!("Skipping non-text message {} from {}", message.message_id, from.id);
            return None;
        };
        Some(
            InboundMessage::new(SessionKey(from.id), ChatId(message.chat.id), text)
                .with_user_name(from.first_name),
        )
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(&self, chat: ChatId, reply: &Reply) -> Result<MessageRef, DomainError> {
        let params = SendMessage {
            chat_id: chat.0,
            text: reply.body(),
            parse_mode: parse_mode(reply.format()),
            reply_markup: reply.keyboard().map(ReplyKeyboardMarkup::from),
        };
        let sent: ApiMessage = self.call("sendMessage", &params).await?;
        Ok(MessageRef::new(ChatId(sent.chat.id), sent.message_id))
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &[u8],
        caption: &str,
        format: TextFormat,
    ) -> Result<MessageRef, DomainError> {
        let part = reqwest::multipart::Part::bytes(photo.to_vec())
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| transport_error("sendPhoto", e))?;

        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat.0.to_string())
            .text("caption", caption.to_string())
            .part("photo", part);
        if let Some(mode) = parse_mode(format) {
            form = form.text("parse_mode", mode);
        }

        let response = self
            .client
            .post(format!("{}/sendPhoto", self.base))
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error("sendPhoto", e))?;
        let sent: ApiMessage = Self::unwrap_envelope("sendPhoto", response).await?;
        Ok(MessageRef::new(ChatId(sent.chat.id), sent.message_id))
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        format: TextFormat,
    ) -> Result<(), DomainError> {
        let params = EditMessageText {
            chat_id: message.chat.0,
            message_id: message.message_id,
            text,
            parse_mode: parse_mode(format),
        };
        // `result` is the edited message, or `true` for inline messages.
        let _: serde_json::Value = self.call("editMessageText", &params).await?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), DomainError> {
        let params = MessageTarget {
            chat_id: message.chat.0,
            message_id: message.message_id,
        };
        let _: bool = self.call("deleteMessage", &params).await?;
        Ok(())
    }

    async fn send_typing(&self, chat: ChatId) -> Result<(), DomainError> {
        let params = SendChatAction {
            chat_id: chat.0,
            action: "typing",
        };
        let _: bool = self.call("sendChatAction", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn next_batch(&self) -> Result<Vec<InboundMessage>, DomainError> {
        let mut offset = self.offset.lock().await;
        let params = GetUpdates {
            offset: *offset,
            timeout: LONG_POLL_SECS,
            allowed_updates: &["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &params).await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            *offset = last + 1;
        }
        if !updates.is_empty() {
            debug!("Received {} updates", updates.len());
        }

        Ok(updates.into_iter().filter_map(Self::to_inbound).collect())
    }
}
