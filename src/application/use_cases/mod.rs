mod converse;
mod dialogue_controller;
mod progress_reporter;
mod task_supervisor;

pub use converse::*;
pub use dialogue_controller::*;
pub use progress_reporter::*;
pub use task_supervisor::*;
