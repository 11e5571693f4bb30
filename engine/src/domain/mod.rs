//! Domain logic
//!
//! - `correlation` - Correlation inference over recorded HTTP sessions

pub mod correlation;

pub use correlation::{CorrelationEngine, CorrelationSpec};
