use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::application::{Messenger, TaskSupervisor};
use crate::domain::{ChatId, DomainError, MessageRef, Reply, TaskHandle, TaskOutcome, TextFormat};

pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(300);

const INITIAL_TEXT: &str = "`Initializing AI...`";
const CANCELLED_TEXT: &str = "`🚫 Generation cancelled.`";

/// The message used as the progress surface for one generation.
///
/// Finishing consumes it, so a deleted or finalized status message can never
/// be edited again.
#[derive(Debug)]
pub struct StatusMessage {
    message: MessageRef,
}

pub fn frame_text(frame: usize) -> String {
    format!("`Processing... {}`", SPINNER_FRAMES[frame % SPINNER_FRAMES.len()])
}

/// Animates a status message while a generation task is pending.
pub struct ProgressReporter {
    messenger: Arc<dyn Messenger>,
    supervisor: Arc<TaskSupervisor>,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(messenger: Arc<dyn Messenger>, supervisor: Arc<TaskSupervisor>) -> Self {
        Self {
            messenger,
            supervisor,
            interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn open(&self, chat: ChatId) -> Result<StatusMessage, DomainError> {
        let message = self
            .messenger
            .send_text(chat, &Reply::markdown(INITIAL_TEXT))
            .await?;
        Ok(StatusMessage { message })
    }

    /// Alternate bounded waits on the task with animation frames until the
    /// task is terminal.
    ///
    /// Edit failures other than the benign ones abort tracking; the task
    /// itself keeps running and is left to the caller.
    pub async fn track(
        &self,
        status: &StatusMessage,
        handle: &TaskHandle,
    ) -> Result<TaskOutcome, DomainError> {
        let mut frame = 0;
        loop {
            if let Some(outcome) = self.supervisor.poll(handle, self.interval).await.into_outcome() {
                return Ok(outcome);
            }
            self.show_frame(status, frame).await?;
            frame += 1;
        }
    }

    /// Remove the status message after a completed task, or turn it into the
    /// cancellation notice.
    pub async fn finish(
        &self,
        status: StatusMessage,
        outcome: &TaskOutcome,
    ) -> Result<(), DomainError> {
        match outcome {
            TaskOutcome::Cancelled => {
                self.messenger
                    .edit_text(&status.message, CANCELLED_TEXT, TextFormat::Markdown)
                    .await
            }
            TaskOutcome::Succeeded(_) | TaskOutcome::Failed => self.discard(status).await,
        }
    }

    /// Remove the status message without a final notice.
    pub async fn discard(&self, status: StatusMessage) -> Result<(), DomainError> {
        self.messenger.delete_message(&status.message).await
    }

    async fn show_frame(&self, status: &StatusMessage, frame: usize) -> Result<(), DomainError> {
        match self
            .messenger
            .edit_text(&status.message, &frame_text(frame), TextFormat::Markdown)
            .await
        {
            Err(e) if e.is_benign_edit_failure() => {
                debug!("Skipping progress frame on {}: {}", status.message, e);
                Ok(())
            }
            other => other,
        }
    }
}
