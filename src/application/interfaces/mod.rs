mod image_generator;
mod messenger;
mod session_store;
mod text_generator;

pub use image_generator::*;
pub use messenger::*;
pub use session_store::*;
pub use text_generator::*;
