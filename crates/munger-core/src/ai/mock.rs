//! Mock backend for testing
//!
//! Returns canned replies that look like real model output (prose around a
//! JSON object), or replays a script of replies and failures. Useful for unit
//! tests and for running the CLI without a reasoning service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::GenerationParams;
use super::{ensure_prompt, ReasoningBackend};

/// One scripted outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Raw text returned as the model's answer
    Text(String),
    /// The call fails as if the service were unreachable
    Unavailable(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn unavailable() -> Self {
        Self::Unavailable("connection refused".into())
    }
}

/// Mock reasoning backend for testing
///
/// Scripted replies are consumed in order; once the script runs out, a
/// healthy mock answers with canned JSON and an unhealthy one fails every
/// call. Clones share the script and the call log.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether calls past the script succeed
    pub healthy: bool,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Create a mock whose service is down
    pub fn unavailable() -> Self {
        Self {
            healthy: false,
            ..Self::default()
        }
    }

    /// Create a mock that replays `replies` before falling back to canned answers
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        let mock = Self::new();
        if let Ok(mut script) = mock.script.lock() {
            script.extend(replies);
        }
        mock
    }

    /// Append a reply to the script
    pub fn push_reply(&self, reply: MockReply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn next_scripted(&self) -> Option<MockReply> {
        self.script.lock().ok().and_then(|mut s| s.pop_front())
    }
}

/// Canned answer chosen by looking at what the prompt asks for
pub(crate) fn canned_reply(prompt: &str) -> String {
    if prompt.contains("D_explanation") {
        r#"Here is my assessment:
{
  "D": 1,
  "O": 1,
  "G": 0,
  "L": 1,
  "B": 0,
  "D_explanation": "The cost is a modest share of monthly leftover income.",
  "O_explanation": "No high-interest debt competes for this money.",
  "G_explanation": "The purchase neither helps nor hurts the main goal.",
  "L_explanation": "The item should last for several years.",
  "B_explanation": "The purchase is a mix of need and want."
}"#
        .to_string()
    } else if prompt.contains("purchase_urgency") {
        r#"Based on the item and price, a reasonable guess is:
{
  "leftover_income": 2500,
  "has_high_interest_debt": "No",
  "main_financial_goal": "Build an emergency fund",
  "purchase_urgency": "Mixed"
}"#
        .to_string()
    } else {
        "I'm not sure what you are asking.".to_string()
    }
}

#[async_trait]
impl ReasoningBackend for MockBackend {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        ensure_prompt(prompt)?;

        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        match self.next_scripted() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Unavailable(reason)) => Err(Error::Service(reason)),
            None if self.healthy => Ok(canned_reply(prompt)),
            None => Err(Error::Service("Mock reasoning service unavailable".into())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
