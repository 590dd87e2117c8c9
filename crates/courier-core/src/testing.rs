//! Test doubles for the reply capability.
//!
//! Enabled for this crate's own tests and, through the `test-util` feature,
//! for the tests of downstream crates.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ReplyError, ReplyResult};
use crate::response::{InteractionResponse, Responder};

/// A [`Responder`] that records every response it is asked to deliver.
#[derive(Debug, Default)]
pub struct RecordingResponder {
    responses: Mutex<Vec<(String, InteractionResponse)>>,
    failing: bool,
}

impl RecordingResponder {
    /// Creates a responder that accepts every response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a responder that rejects every response, as if the
    /// interaction had already expired. Attempts are still recorded.
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// All recorded responses, in order.
    pub fn responses(&self) -> Vec<InteractionResponse> {
        self.responses
            .lock()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// The contents of all recorded messages, in order.
    pub fn messages(&self) -> Vec<String> {
        self.responses
            .lock()
            .iter()
            .filter_map(|(_, r)| r.message().map(|m| m.content.clone()))
            .collect()
    }

    /// Number of recorded responses.
    pub fn count(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn respond(
        &self,
        interaction_id: &str,
        response: InteractionResponse,
    ) -> ReplyResult<()> {
        self.responses
            .lock()
            .push((interaction_id.to_string(), response));
        if self.failing {
            return Err(ReplyError::Expired {
                id: interaction_id.to_string(),
            });
        }
        Ok(())
    }
}
