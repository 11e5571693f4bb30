//! Correlation inference engine for recorded HTTP sessions
//!
//! - `core` - Configuration, CLI and terminal output
//! - `data` - Capture and spec files
//! - `domain` - The correlation engine
//! - `utils` - Shared helpers

mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
