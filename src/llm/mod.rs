//! Client for the upstream generative-text completion API.
pub mod core;
pub mod extract;

pub use self::core::*;
pub use extract::{ExtractReason, Extraction, extract_text};
