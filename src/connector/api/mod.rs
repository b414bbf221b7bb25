pub mod config;
pub mod container;
pub mod router;

pub use config::BotConfig;
pub use container::{Container, ContainerConfig};
pub use router::Router;
