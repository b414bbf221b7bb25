//! # Domain Layer
//!
//! Sessions, generation task states, chat message models and the error type.
//! This layer knows nothing about Telegram or any AI provider.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
