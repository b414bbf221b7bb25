use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::ImageGenerator;
use crate::domain::{DomainError, Poll, Session, TaskHandle, TaskId, TaskState};

/// Runs at most one background image generation per session.
///
/// The generation itself runs on its own tokio task and publishes its state
/// through a watch channel. Waiting on a [`TaskHandle`] only ever reads that
/// channel, so a wait that times out leaves the generation untouched.
pub struct TaskSupervisor {
    generator: Arc<dyn ImageGenerator>,
}

impl TaskSupervisor {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    /// Start generating an image for `prompt` and record the task as the
    /// session's active task.
    pub fn start(&self, session: &mut Session, prompt: &str) -> Result<TaskHandle, DomainError> {
        if let Some(active) = session.active_task() {
            warn!(
                "Session {} already has task {} in flight",
                session.key(),
                active.id()
            );
            return Err(DomainError::TaskAlreadyActive(session.key().to_string()));
        }

        let id = TaskId::new();
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(TaskState::Pending);

        let generator = Arc::clone(&self.generator);
        let token = cancel.clone();
        let task_prompt = prompt.to_string();
        tokio::spawn(async move {
            let state = tokio::select! {
                biased;
                _ = token.cancelled() => TaskState::Cancelled,
                image = generator.generate_image(&task_prompt) => match image {
                    // Cancellation that raced with completion still wins.
                    _ if token.is_cancelled() => TaskState::Cancelled,
                    Some(bytes) => TaskState::Succeeded(bytes),
                    None => TaskState::Failed,
                },
            };
            debug!("Generation task {} finished: {}", id, state.as_str());
            state_tx.send_replace(state);
        });

        let handle = TaskHandle::new(id, prompt, cancel, state_rx);
        session.set_active_task(handle.clone());
        debug!("Started generation task {} for session {}", id, session.key());
        Ok(handle)
    }

    /// Wait up to `timeout` for the task to reach a terminal state.
    pub async fn poll(&self, handle: &TaskHandle, timeout: Duration) -> Poll {
        match tokio::time::timeout(timeout, self.wait(handle)).await {
            Ok(poll) => poll,
            Err(_) => Poll::Pending,
        }
    }

    /// Wait without bound for the task to reach a terminal state.
    pub async fn wait(&self, handle: &TaskHandle) -> Poll {
        let mut state = handle.subscribe();
        let poll = match state.wait_for(TaskState::is_terminal).await {
            Ok(terminal) => Poll::from(&*terminal),
            Err(_) => {
                // The generation task went away without publishing a result.
                warn!("Generation task {} ended without a result", handle.id());
                Poll::Completed(None)
            }
        };
        poll
    }

    /// Ask the task to stop. Has no effect once the task is terminal, and
    /// repeated requests are harmless.
    pub fn cancel(&self, handle: &TaskHandle) {
        if handle.is_terminal() {
            debug!("Task {} already finished; ignoring cancel", handle.id());
            return;
        }
        handle.request_cancel();
    }

    /// Cancel whatever task the session has in flight. Returns `false` when
    /// there is none.
    pub fn cancel_active(&self, session: &Session) -> bool {
        match session.active_task() {
            Some(handle) => {
                self.cancel(handle);
                true
            }
            None => false,
        }
    }

    /// Clear the session's active-task slot if it still holds `handle`.
    ///
    /// Returns `true` only for the call that actually removed it.
    pub fn release(&self, session: &mut Session, handle: &TaskHandle) -> bool {
        let holds_handle = session
            .active_task()
            .is_some_and(|active| active.id() == handle.id());
        if holds_handle {
            session.take_active_task();
        }
        holds_handle
    }
}
