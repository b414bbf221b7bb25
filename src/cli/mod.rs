use clap::Subcommand;

#[derive(Subcommand, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Start the bot and long-poll Telegram until Ctrl-C (default)
    #[default]
    Run,

    /// Validate configuration and the Telegram token, then exit
    CheckConfig,
}
