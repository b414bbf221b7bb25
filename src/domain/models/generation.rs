use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identifies one image generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a generation task.
///
/// `Pending` moves to exactly one of the three terminal states and never
/// leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Succeeded(Vec<u8>),
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Succeeded(_) => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

/// What a bounded wait on a task observed.
///
/// `Completed(None)` is the soft-failure outcome: the provider finished
/// without an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    Pending,
    Completed(Option<Vec<u8>>),
    Cancelled,
}

/// Terminal result of a generation task as relayed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded(Vec<u8>),
    Failed,
    Cancelled,
}

impl Poll {
    /// `None` while the task is still pending.
    pub fn into_outcome(self) -> Option<TaskOutcome> {
        match self {
            Poll::Pending => None,
            Poll::Completed(Some(bytes)) => Some(TaskOutcome::Succeeded(bytes)),
            Poll::Completed(None) => Some(TaskOutcome::Failed),
            Poll::Cancelled => Some(TaskOutcome::Cancelled),
        }
    }
}

impl From<&TaskState> for Poll {
    fn from(state: &TaskState) -> Self {
        match state {
            TaskState::Pending => Poll::Pending,
            TaskState::Succeeded(bytes) => Poll::Completed(Some(bytes.clone())),
            TaskState::Failed => Poll::Completed(None),
            TaskState::Cancelled => Poll::Cancelled,
        }
    }
}

/// A session's reference to one in-flight generation task.
///
/// Clones share the same task: cancelling through any clone cancels it, and
/// every clone observes the same state.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    prompt: Arc<str>,
    cancel: CancellationToken,
    state: watch::Receiver<TaskState>,
}

impl TaskHandle {
    pub fn new(
        id: TaskId,
        prompt: impl Into<Arc<str>>,
        cancel: CancellationToken,
        state: watch::Receiver<TaskState>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            cancel,
            state,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Current state without waiting.
    pub fn state(&self) -> TaskState {
        self.state.borrow().clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.borrow().is_terminal()
    }

    pub fn cancellation_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.state.clone()
    }
}
