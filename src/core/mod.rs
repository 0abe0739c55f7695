//! Core domain models for jobflow
//!
//! This module defines the fundamental data structures that represent
//! jobs, pipelines, their shared context and their configuration.

pub mod config;
pub mod context;
pub mod job;
pub mod pipeline;
pub mod state;

pub use context::*;
pub use job::*;
pub use pipeline::*;
pub use state::*;
