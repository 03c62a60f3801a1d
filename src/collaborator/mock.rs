//! Scripted generator for testing
//!
//! Replays a fixed completion (or failure) without a network. Used by the
//! unit tests and by `moodline analyze --offline`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::client::{CollaboratorError, CompletionRequest, TextGenerator};

/// What a [`ScriptedGenerator`] answers with
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Unavailable,
    Status(u16),
}

/// Text generator that replays a scripted reply
#[derive(Debug)]
pub struct ScriptedGenerator {
    reply: ScriptedReply,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedGenerator {
    pub fn new(reply: ScriptedReply) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Answer every request with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(ScriptedReply::Text(text.into()))
    }

    /// Behave like an unreachable service
    pub fn unavailable() -> Self {
        Self::new(ScriptedReply::Unavailable)
    }

    /// Fail every request with an HTTP status
    pub fn failing_with_status(status: u16) -> Self {
        Self::new(ScriptedReply::Status(status))
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            ScriptedReply::Text(text) => Ok(text.clone()),
            ScriptedReply::Unavailable => Err(CollaboratorError::Unavailable),
            ScriptedReply::Status(status) => Err(CollaboratorError::ApiError {
                status: *status,
                message: "scripted failure".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
