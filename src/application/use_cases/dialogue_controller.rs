use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::{
    ConverseUseCase, ImageGenerator, Messenger, ProgressReporter, SessionStore, SharedSession,
    StatusMessage, TaskSupervisor, TextGenerator,
};
use crate::domain::{
    bold_markdown, escape_markdown, ChatId, Command, DialogueState, DomainError, InboundMessage,
    Keyboard, Reply, Session, SessionKey, TaskHandle, TaskOutcome, TextFormat,
};

const MENU_TEXT: &str = "Here is the main menu:";
const HISTORY_CLEARED: &str = "Our text conversation history has been cleared.";
const NOTHING_TO_CLEAR: &str = "There's no conversation history to clear.";
const IMAGE_PROMPT_REQUEST: &str = "Please describe the image you want to create.";
const ACTION_CANCELLED: &str = "Action cancelled.";
const STILL_GENERATING: &str = "An image is still being generated. Press Cancel ❌ to stop it.";
const TEXT_FAILURE: &str = "Sorry, an error occurred with the text generation.";
const IMAGE_FAILURE: &str = "Sorry, image generation failed. The prompt may have been rejected or the service may be unavailable.";
const UPLOAD_TIMEOUT: &str = "The upload to Telegram timed out. Please try again.";
const UPLOAD_FAILURE: &str = "An error occurred while sending the photo.";
const START_FAILURE: &str = "Sorry, the image generation could not be started. Please try again.";
const PROGRESS_FAILURE: &str = "Sorry, something went wrong while tracking the image generation.";

fn welcome_text(user_name: Option<&str>) -> String {
    let name = escape_markdown(user_name.unwrap_or("there"));
    format!(
        "Hello, {name}! Welcome to your AI assistant.\n\n\
         *Here's what I can do:*\n\n\
         💬 *Chat:* Just type any message to talk to me.\n\
         ✨ *Image:* Create a unique image from a text prompt.\n\
         🧹 *Clear:* Start a fresh text conversation.\n\
         📋 *Menu:* Bring back this keyboard menu.\n\
         ❓ *Help:* Show this message again."
    )
}

pub fn photo_caption(prompt: &str) -> String {
    format!("Image generated for:\n{}", bold_markdown(&format!("'{prompt}'")))
}

/// Routes each inbound message according to the session's dialogue state.
///
/// `Idle` sends free text to the chat flow; `Image` moves to
/// `AwaitingImagePrompt`; the next free text starts a supervised generation
/// and moves to `Generating` until the background flow relays the outcome.
pub struct DialogueController {
    sessions: Arc<dyn SessionStore>,
    messenger: Arc<dyn Messenger>,
    converse: ConverseUseCase,
    supervisor: Arc<TaskSupervisor>,
    reporter: Arc<ProgressReporter>,
}

impl DialogueController {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        messenger: Arc<dyn Messenger>,
        text_generator: Arc<dyn TextGenerator>,
        image_generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        let supervisor = Arc::new(TaskSupervisor::new(image_generator));
        let reporter = Arc::new(ProgressReporter::new(
            Arc::clone(&messenger),
            Arc::clone(&supervisor),
        ));
        Self {
            sessions,
            messenger,
            converse: ConverseUseCase::new(text_generator),
            supervisor,
            reporter,
        }
    }

    /// Override the progress animation cadence.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.reporter = Arc::new(
            ProgressReporter::new(Arc::clone(&self.messenger), Arc::clone(&self.supervisor))
                .with_interval(interval),
        );
        self
    }

    pub async fn state_of(&self, key: SessionKey) -> DialogueState {
        self.sessions.session(key).await.lock().await.dialogue_state()
    }

    /// Handle one inbound message.
    ///
    /// When the message starts an image generation, the progress loop runs in
    /// the background and its join handle is returned.
    pub async fn handle(
        &self,
        message: InboundMessage,
    ) -> Result<Option<JoinHandle<()>>, DomainError> {
        let shared = self.sessions.session(message.session).await;
        let mut session = shared.lock().await;
        let command = Command::parse(&message.text);
        let state = session.dialogue_state();
        debug!(
            "Session {} in state {} received {:?}",
            message.session,
            state.as_str(),
            command
        );

        match (state, command) {
            (_, Command::Cancel) => {
                self.cancel(&mut session, message.chat).await?;
            }
            (DialogueState::Generating, _) => {
                self.send(message.chat, Reply::text(STILL_GENERATING)).await?;
            }
            (_, Command::Start | Command::Help) => {
                let welcome = Reply::markdown(welcome_text(message.user_name.as_deref()))
                    .with_keyboard(Keyboard::Main);
                self.send(message.chat, welcome).await?;
            }
            (_, Command::Menu) => self.send_menu(message.chat).await?,
            (_, Command::Clear) => {
                let text = if self.converse.clear(&mut session) {
                    HISTORY_CLEARED
                } else {
                    NOTHING_TO_CLEAR
                };
                self.send(message.chat, Reply::text(text)).await?;
            }
            (_, Command::Image) => {
                session.set_dialogue_state(DialogueState::AwaitingImagePrompt);
                let request = Reply::text(IMAGE_PROMPT_REQUEST).with_keyboard(Keyboard::CancelOnly);
                self.send(message.chat, request).await?;
            }
            (_, Command::Unknown(name)) => {
                debug!("Ignoring unknown command /{}", name);
            }
            (DialogueState::AwaitingImagePrompt, Command::Text(prompt)) => {
                return self
                    .start_generation(&mut session, &shared, message.chat, prompt)
                    .await;
            }
            (DialogueState::Idle, Command::Text(text)) => {
                self.chat(&mut session, message.chat, &text).await?;
            }
        }

        Ok(None)
    }

    async fn cancel(&self, session: &mut Session, chat: ChatId) -> Result<(), DomainError> {
        match session.dialogue_state() {
            // The running flow observes the cancellation and returns to idle.
            DialogueState::Generating => {
                if self.supervisor.cancel_active(session) {
                    info!("Image generation cancellation requested by user {}", session.key());
                }
            }
            DialogueState::AwaitingImagePrompt | DialogueState::Idle => {
                session.set_dialogue_state(DialogueState::Idle);
            }
        }
        self.send(chat, Reply::text(ACTION_CANCELLED).with_keyboard(Keyboard::Main))
            .await
    }

    async fn chat(&self, session: &mut Session, chat: ChatId, text: &str) -> Result<(), DomainError> {
        if let Err(e) = self.messenger.send_typing(chat).await {
            debug!("Could not show typing indicator in chat {}: {}", chat, e);
        }

        let failure = match self.converse.execute(session, text).await {
            Ok(reply) => match self.send(chat, Reply::text(reply)).await {
                Ok(()) => return Ok(()),
                Err(e) => format!("reply delivery failed: {e}"),
            },
            Err(e) => e.to_string(),
        };
        error!(
            "Text generation failed for user {} (message: {:?}): {}",
            session.key(),
            text,
            failure
        );
        self.send(chat, Reply::text(TEXT_FAILURE)).await
    }

    async fn start_generation(
        &self,
        session: &mut Session,
        shared: &SharedSession,
        chat: ChatId,
        prompt: String,
    ) -> Result<Option<JoinHandle<()>>, DomainError> {
        info!("Image request from user {} with prompt: {:?}", session.key(), prompt);

        let status = match self.reporter.open(chat).await {
            Ok(status) => status,
            Err(e) => {
                error!(
                    "Could not post status message for user {} (prompt: {:?}): {}",
                    session.key(),
                    prompt,
                    e
                );
                session.set_dialogue_state(DialogueState::Idle);
                self.send(chat, Reply::text(START_FAILURE).with_keyboard(Keyboard::Main))
                    .await?;
                return Ok(None);
            }
        };
        let handle = self.supervisor.start(session, &prompt)?;
        session.set_dialogue_state(DialogueState::Generating);

        let flow = GenerationFlow {
            session: Arc::clone(shared),
            messenger: Arc::clone(&self.messenger),
            supervisor: Arc::clone(&self.supervisor),
            reporter: Arc::clone(&self.reporter),
            chat,
            handle,
        };
        Ok(Some(tokio::spawn(flow.run(status))))
    }

    async fn send_menu(&self, chat: ChatId) -> Result<(), DomainError> {
        self.send(chat, Reply::text(MENU_TEXT).with_keyboard(Keyboard::Main))
            .await
    }

    async fn send(&self, chat: ChatId, reply: Reply) -> Result<(), DomainError> {
        self.messenger.send_text(chat, &reply).await.map(|_| ())
    }
}

/// Background half of the image flow: animate, then relay the outcome.
struct GenerationFlow {
    session: SharedSession,
    messenger: Arc<dyn Messenger>,
    supervisor: Arc<TaskSupervisor>,
    reporter: Arc<ProgressReporter>,
    chat: ChatId,
    handle: TaskHandle,
}

impl GenerationFlow {
    async fn run(self, status: StatusMessage) {
        let tracked = self.reporter.track(&status, &self.handle).await;
        if tracked.is_err() {
            self.supervisor.cancel(&self.handle);
        }
        let user = self.reset_session().await;

        let outcome = match tracked {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Progress updates failed for user {} (prompt: {:?}): {}",
                    user,
                    self.handle.prompt(),
                    e
                );
                if let Err(e) = self.reporter.discard(status).await {
                    debug!("Could not remove status message for user {}: {}", user, e);
                }
                self.relay_text(Reply::text(PROGRESS_FAILURE).with_keyboard(Keyboard::Main))
                    .await;
                return;
            }
        };

        if let Err(e) = self.reporter.finish(status, &outcome).await {
            warn!("Could not finalize status message for user {}: {}", user, e);
        }

        match outcome {
            TaskOutcome::Succeeded(bytes) => {
                let caption = photo_caption(self.handle.prompt());
                if let Err(e) = self
                    .messenger
                    .send_photo(self.chat, &bytes, &caption, TextFormat::Markdown)
                    .await
                {
                    error!(
                        "Sending photo failed for user {} (prompt: {:?}): {}",
                        user,
                        self.handle.prompt(),
                        e
                    );
                    let apology = if e.is_timeout() { UPLOAD_TIMEOUT } else { UPLOAD_FAILURE };
                    self.relay_text(Reply::text(apology)).await;
                }
            }
            TaskOutcome::Failed => {
                warn!(
                    "Image generation produced no image for user {} (prompt: {:?})",
                    user,
                    self.handle.prompt()
                );
                self.relay_text(Reply::text(IMAGE_FAILURE)).await;
            }
            TaskOutcome::Cancelled => {
                info!("Image generation cancelled by user {}", user);
            }
        }

        self.relay_text(Reply::text(MENU_TEXT).with_keyboard(Keyboard::Main))
            .await;
    }

    /// Release the task slot and return the session to idle.
    async fn reset_session(&self) -> SessionKey {
        let mut session = self.session.lock().await;
        if !self.supervisor.release(&mut session, &self.handle) {
            warn!(
                "Task {} was no longer the active task of session {}",
                self.handle.id(),
                session.key()
            );
        }
        session.set_dialogue_state(DialogueState::Idle);
        session.key()
    }

    async fn relay_text(&self, reply: Reply) {
        if let Err(e) = self.messenger.send_text(self.chat, &reply).await {
            error!("Could not deliver message to chat {}: {}", self.chat, e);
        }
    }
}
