//! Scripted model client for tests

use std::cell::RefCell;
use std::collections::VecDeque;

use super::client::{ModelBackendError, ModelClient};
use super::models::ChatRequest;

/// Replays canned replies in order and records every request it receives.
/// `Err` entries surface as a 500 from the backend.
pub(crate) struct ScriptedClient {
    replies: RefCell<VecDeque<Result<String, String>>>,
    requests: RefCell<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            replies: RefCell::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.borrow().clone()
    }
}

impl ModelClient for ScriptedClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ModelBackendError> {
        self.requests.borrow_mut().push(request.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ModelBackendError::Server { status: 500, message }),
            None => Err(ModelBackendError::InvalidResponse("script exhausted".to_string())),
        }
    }
}
