use std::fmt;

use super::SessionKey;

/// A chat on the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a message already posted to a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: i64,
}

impl MessageRef {
    pub fn new(chat: ChatId, message_id: i64) -> Self {
        Self { chat, message_id }
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat, self.message_id)
    }
}

/// Reply keyboards the bot attaches to outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    Main,
    CancelOnly,
}

impl Keyboard {
    pub fn rows(&self) -> &'static [&'static [&'static str]] {
        match self {
            Keyboard::Main => &[
                &[super::IMAGE_BUTTON, super::CLEAR_BUTTON],
                &[super::HELP_BUTTON, super::MENU_BUTTON],
            ],
            Keyboard::CancelOnly => &[&[super::CANCEL_BUTTON]],
        }
    }

    /// Whether the client should hide the keyboard after one press.
    pub fn one_time(&self) -> bool {
        matches!(self, Keyboard::CancelOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Markdown,
}

/// An outbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    text: String,
    format: TextFormat,
    keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self::text(text).with_format(TextFormat::Markdown)
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn body(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> TextFormat {
        self.format
    }

    pub fn keyboard(&self) -> Option<Keyboard> {
        self.keyboard
    }
}

/// Escape the characters that Telegram's legacy Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render `text` bold in Telegram's legacy Markdown.
///
/// Backslash escapes are not honoured inside an entity, where only `*` ends
/// it, so each asterisk is emitted escaped between separate bold runs.
pub fn bold_markdown(text: &str) -> String {
    text.split('*')
        .map(|run| {
            if run.is_empty() {
                String::new()
            } else {
                format!("*{run}*")
            }
        })
        .collect::<Vec<_>>()
        .join("\\*")
}

/// A text message received from an end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub session: SessionKey,
    pub chat: ChatId,
    pub user_name: Option<String>,
    pub text: String,
}

impl InboundMessage {
    pub fn new(session: SessionKey, chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            session,
            chat,
            user_name: None,
            text: text.into(),
        }
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }
}
