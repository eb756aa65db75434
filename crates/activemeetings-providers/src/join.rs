//! Join service trait.

use std::sync::Mutex;

use activemeetings_protocol::JoinDecision;

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

/// Asks the server whether `meeting` can be joined right now.
///
/// No timeout is applied by callers; an implementation that never resolves
/// leaves the join pending.
pub trait JoinService: Send + Sync {
    /// Requests to join `meeting` as `display_name`.
    fn request_join<'a>(
        &'a self,
        meeting: &'a str,
        display_name: &'a str,
    ) -> BoxFuture<'a, ProviderResult<JoinDecision>>;
}

/// Join service that answers from memory, for tests and demos.
#[derive(Debug)]
pub struct StaticJoinService {
    answer: Result<JoinDecision, String>,
    requests: Mutex<Vec<(String, String)>>,
}

impl StaticJoinService {
    /// Always answers with `decision`.
    pub fn new(decision: JoinDecision) -> Self {
        Self {
            answer: Ok(decision),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with a network error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns the `(meeting, display_name)` pairs requested so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl JoinService for StaticJoinService {
    fn request_join<'a>(
        &'a self,
        meeting: &'a str,
        display_name: &'a str,
    ) -> BoxFuture<'a, ProviderResult<JoinDecision>> {
        Box::pin(async move {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((meeting.to_string(), display_name.to_string()));
            }
            self.answer.clone().map_err(ProviderError::network)
        })
    }
}
