//! ragdb-generate
//!
//! Grounded answer generation over retrieved candidates.

pub mod chat;
pub mod engine;
pub mod prompt;

pub use chat::ChatCompletionsGenerator;
pub use engine::{InferenceEngine, SYSTEM_MESSAGE};
pub use prompt::render_prompt;
