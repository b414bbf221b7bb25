use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::{
    DialogueController, ImageGenerator, Messenger, SessionStore, TextGenerator, UpdateSource,
};
use crate::connector::adapter::{
    GeminiClient, InMemorySessionStore, MockImageGenerator, MockTextGenerator, StabilityClient,
    TelegramClient,
};

use super::config::BotConfig;

pub struct ContainerConfig {
    pub bot: BotConfig,
    /// Replace Gemini and Stability with offline providers. Telegram is
    /// still reached over the network.
    pub mock_providers: bool,
}

pub struct Container {
    telegram: Arc<TelegramClient>,
    sessions: Arc<dyn SessionStore>,
    controller: Arc<DialogueController>,
    config: ContainerConfig,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let bot = &config.bot;
        let telegram = Arc::new(TelegramClient::new(
            &bot.telegram_token,
            &bot.telegram_api_url,
        ));

        let (text_generator, image_generator): (Arc<dyn TextGenerator>, Arc<dyn ImageGenerator>) =
            if config.mock_providers {
                debug!("Using mock text and image providers");
                (
                    Arc::new(MockTextGenerator::new()),
                    Arc::new(MockImageGenerator::new()),
                )
            } else {
                debug!(
                    "Using Gemini model {} and Stability engine {}",
                    bot.gemini_model, bot.stability_engine
                );
                (
                    Arc::new(GeminiClient::new(
                        bot.gemini_api_key.clone(),
                        &bot.gemini_model,
                        &bot.gemini_base_url,
                    )),
                    Arc::new(StabilityClient::new(
                        bot.stability_api_key.clone(),
                        &bot.stability_engine,
                        &bot.stability_base_url,
                    )),
                )
            };

        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let messenger: Arc<dyn Messenger> = telegram.clone();
        let controller = Arc::new(DialogueController::new(
            Arc::clone(&sessions),
            messenger,
            text_generator,
            image_generator,
        ));

        Ok(Self {
            telegram,
            sessions,
            controller,
            config,
        })
    }

    /// Confirms the bot token with Telegram before polling starts.
    pub async fn verify(&self) -> Result<String> {
        let username = self
            .telegram
            .get_me()
            .await
            .context("Telegram rejected the bot token")?;
        info!("Authorized as @{}", username);
        Ok(username)
    }

    pub fn controller(&self) -> Arc<DialogueController> {
        Arc::clone(&self.controller)
    }

    pub fn update_source(&self) -> Arc<dyn UpdateSource> {
        self.telegram.clone()
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.sessions)
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }
}
