//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use twai::{
    ChatId, DomainError, ImageGenerator, InboundMessage, Keyboard, MessageRef, Messenger, Reply,
    SessionKey, TextFormat, TextGenerator, TextReply, Turn, UpdateSource,
};

pub const USER: SessionKey = SessionKey(42);
pub const CHAT: ChatId = ChatId(4200);

pub fn inbound(text: &str) -> InboundMessage {
    InboundMessage::new(USER, CHAT, text).with_user_name("Ada")
}

/// Everything the bot did on the chat platform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text {
        message: MessageRef,
        body: String,
        format: TextFormat,
        keyboard: Option<Keyboard>,
    },
    Photo {
        message: MessageRef,
        bytes: Vec<u8>,
        caption: String,
    },
    Edit {
        message: MessageRef,
        text: String,
    },
    Delete {
        message: MessageRef,
    },
    Typing,
}

/// [`Messenger`] that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingMessenger {
    next_id: AtomicI64,
    log: Mutex<Vec<Sent>>,
    edit_failures: Mutex<VecDeque<DomainError>>,
    photo_failure: Mutex<Option<DomainError>>,
    rejected_prefix: Mutex<Option<String>>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next edits fail with these errors, one per call.
    pub fn fail_edits(&self, errors: impl IntoIterator<Item = DomainError>) {
        self.edit_failures.lock().unwrap().extend(errors);
    }

    /// Texts starting with `prefix` are refused like an oversized message.
    pub fn reject_texts_starting_with(&self, prefix: &str) {
        *self.rejected_prefix.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn fail_next_photo(&self, error: DomainError) {
        *self.photo_failure.lock().unwrap() = Some(error);
    }

    pub fn events(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<(String, Option<Keyboard>)> {
        self.events().into_iter().rev().find_map(|sent| match sent {
            Sent::Text { body, keyboard, .. } => Some((body, keyboard)),
            _ => None,
        })
    }

    pub fn edits(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn photos(&self) -> Vec<(Vec<u8>, String)> {
        self.events()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Photo { bytes, caption, .. } => Some((bytes, caption)),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.events()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Delete { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    fn allocate(&self, chat: ChatId) -> MessageRef {
        MessageRef::new(chat, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn record(&self, sent: Sent) {
        self.log.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat: ChatId, reply: &Reply) -> Result<MessageRef, DomainError> {
        let rejected = self
            .rejected_prefix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|prefix| reply.body().starts_with(prefix));
        if rejected {
            return Err(DomainError::delivery(
                "Telegram API error 400: Bad Request: message is too long",
            ));
        }
        let message = self.allocate(chat);
        self.record(Sent::Text {
            message,
            body: reply.body().to_string(),
            format: reply.format(),
            keyboard: reply.keyboard(),
        });
        Ok(message)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        photo: &[u8],
        caption: &str,
        _format: TextFormat,
    ) -> Result<MessageRef, DomainError> {
        if let Some(error) = self.photo_failure.lock().unwrap().take() {
            return Err(error);
        }
        let message = self.allocate(chat);
        self.record(Sent::Photo {
            message,
            bytes: photo.to_vec(),
            caption: caption.to_string(),
        });
        Ok(message)
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        _format: TextFormat,
    ) -> Result<(), DomainError> {
        if let Some(error) = self.edit_failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.record(Sent::Edit {
            message: *message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), DomainError> {
        self.record(Sent::Delete { message: *message });
        Ok(())
    }

    async fn send_typing(&self, _chat: ChatId) -> Result<(), DomainError> {
        self.record(Sent::Typing);
        Ok(())
    }
}

/// [`ImageGenerator`] that blocks until the test releases it.
pub struct GatedImageGenerator {
    gate: Notify,
    result: Mutex<Option<Vec<u8>>>,
    calls: AtomicUsize,
}

impl GatedImageGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            result: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    /// Let a pending (or the next) generation finish with `result`.
    pub fn release(&self, result: Option<Vec<u8>>) {
        *self.result.lock().unwrap() = result;
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for GatedImageGenerator {
    async fn generate_image(&self, _prompt: &str) -> Option<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.result.lock().unwrap().clone()
    }
}

/// [`TextGenerator`] that echoes, or fails on demand.
#[derive(Default)]
pub struct ScriptedTextGenerator {
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedTextGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedTextGenerator {
    async fn generate_text(
        &self,
        history: &[Turn],
        message: &str,
    ) -> Result<TextReply, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::upstream("provider unavailable"));
        }
        let text = format!("echo: {message}");
        let mut updated = history.to_vec();
        updated.push(Turn::user(message));
        updated.push(Turn::model(text.clone()));
        Ok(TextReply {
            text,
            history: updated,
        })
    }
}

/// [`UpdateSource`] that replays scripted batches, then waits forever.
#[derive(Default)]
pub struct ScriptedUpdates {
    batches: Mutex<VecDeque<Result<Vec<InboundMessage>, DomainError>>>,
    polls: AtomicUsize,
}

impl ScriptedUpdates {
    pub fn new(batches: Vec<Result<Vec<InboundMessage>, DomainError>>) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(batches.into()),
            polls: AtomicUsize::new(0),
        })
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateSource for ScriptedUpdates {
    async fn next_batch(&self) -> Result<Vec<InboundMessage>, DomainError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => std::future::pending().await,
        }
    }
}

/// Poll `condition` until it holds, failing the test after a few seconds.
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
