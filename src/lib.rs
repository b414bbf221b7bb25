pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::Commands;

pub use application::{
    ConverseUseCase, DialogueController, ImageGenerator, Messenger, ProgressReporter,
    SessionStore, SharedSession, StatusMessage, TaskSupervisor, TextGenerator, UpdateSource,
};

pub use connector::{
    BotConfig, Container, ContainerConfig, GeminiClient, InMemorySessionStore,
    MockImageGenerator, MockTextGenerator, Router, StabilityClient, TelegramClient,
};

pub use domain::{
    ChatId, Command, DialogueState, DomainError, InboundMessage, Keyboard, MessageRef, Poll,
    Reply, Role, Session, SessionKey, TaskHandle, TaskId, TaskOutcome, TaskState, TextFormat,
    TextReply, Turn,
};
