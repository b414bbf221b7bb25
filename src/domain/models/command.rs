pub const IMAGE_BUTTON: &str = "Image ✨";
pub const CLEAR_BUTTON: &str = "Clear 🧹";
pub const HELP_BUTTON: &str = "Help ❓";
pub const MENU_BUTTON: &str = "Menu 📋";
pub const CANCEL_BUTTON: &str = "Cancel ❌";

/// What an inbound text asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Menu,
    Clear,
    Image,
    Cancel,
    /// A slash command the bot does not know.
    Unknown(String),
    /// Free text: a chat message or an image prompt, depending on state.
    Text(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        match trimmed {
            IMAGE_BUTTON => return Command::Image,
            CLEAR_BUTTON => return Command::Clear,
            HELP_BUTTON => return Command::Help,
            MENU_BUTTON => return Command::Menu,
            CANCEL_BUTTON => return Command::Cancel,
            _ => {}
        }

        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Text(input.to_string());
        };

        // "/help@my_bot extra words" -> "help"
        let name = rest
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "menu" => Command::Menu,
            "clear" => Command::Clear,
            "image" => Command::Image,
            "cancel" => Command::Cancel,
            _ => Command::Unknown(name),
        }
    }
}
