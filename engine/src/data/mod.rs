//! Capture and spec persistence
//!
//! - `files` - Reading captures and writing correlation specs

pub mod files;
