//! Text-Generation Collaborator
//!
//! Outbound side of the insight pipeline: an OpenAI-compatible chat
//! completions client, lenient extraction of the JSON object embedded in its
//! answer, and a scripted stand-in for tests.
//!
//! The collaborator is untrusted and may be unavailable. Every error type
//! here is absorbed by the insight arbiter and never reaches callers.

mod client;
mod mock;
mod parsing;

pub use client::{
    clamp_timeout_secs, ChatCompletionsClient, CollaboratorConfig, CollaboratorError,
    CompletionRequest, TextGenerator, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};
pub use mock::{ScriptedGenerator, ScriptedReply};
pub use parsing::{extract_json_object, parse_insights, CollaboratorInsights};
