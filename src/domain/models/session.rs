use std::fmt;

use super::{TaskHandle, Turn};

/// Identifies one end user's conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey(pub i64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingImagePrompt,
    Generating,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Idle => "idle",
            DialogueState::AwaitingImagePrompt => "awaiting_image_prompt",
            DialogueState::Generating => "generating",
        }
    }
}

/// Per-user conversational state, held for the lifetime of the process.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    history: Vec<Turn>,
    active_task: Option<TaskHandle>,
    dialogue_state: DialogueState,
}

impl Session {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            history: Vec::new(),
            active_task: None,
            dialogue_state: DialogueState::Idle,
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn replace_history(&mut self, history: Vec<Turn>) {
        self.history = history;
    }

    /// Empties the history. Returns `false` when there was nothing to clear.
    pub fn clear_history(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        self.history.clear();
        true
    }

    pub fn dialogue_state(&self) -> DialogueState {
        self.dialogue_state
    }

    pub fn set_dialogue_state(&mut self, state: DialogueState) {
        self.dialogue_state = state;
    }

    pub fn active_task(&self) -> Option<&TaskHandle> {
        self.active_task.as_ref()
    }

    pub fn has_active_task(&self) -> bool {
        self.active_task.is_some()
    }

    pub(crate) fn set_active_task(&mut self, handle: TaskHandle) {
        self.active_task = Some(handle);
    }

    pub(crate) fn take_active_task(&mut self) -> Option<TaskHandle> {
        self.active_task.take()
    }
}
