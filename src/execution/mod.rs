//! Pipeline execution: the run loop, events, tasks and the process controller

pub mod controller;
pub mod engine;
pub mod events;
pub mod tasks;

pub use controller::ProcessController;
pub use events::{EventHandler, ExecutionEvent};
pub use tasks::TaskRegistry;
