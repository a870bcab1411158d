//! Retrieval and grounded answer synthesis.

mod prompt;
mod service;
mod types;

pub use prompt::{NO_MATCH_ANSWER, UNANSWERED_SENTINEL, build_context, build_prompt};
pub use service::{AnswerApi, AnswerService};
pub use types::{AnswerError, AnswerSettings};
