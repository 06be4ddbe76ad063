use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog;

/// Transcript role. Closed set so a typo'd role is a compile error rather
/// than a malformed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

/// One transcript entry. The transcript is append-only and replayed verbatim
/// to the chat completion API on every turn, so order is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A recorded question/answer pair under one topic area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePair {
    pub question: String,
    pub response: String,
}

pub type ResponseMap = BTreeMap<String, Vec<ResponsePair>>;

/// Per-user assessment state. Created when the user connects, owned by that
/// connection's task, destroyed when the session ends. Never shared across
/// sessions or threads, so mutation is plain single-threaded `&mut`.
#[derive(Debug)]
pub struct Session {
    pub messages: Vec<Message>,
    /// Active topic area id. Starts at the "introduction" sentinel and is
    /// only ever reassigned by the front end, never by the dialogue driver.
    pub current_area: String,
    responses: ResponseMap,
    complete: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            current_area: catalog::INTRODUCTION.to_string(),
            responses: ResponseMap::new(),
            complete: false,
        }
    }

    /// Appends one message to the transcript. Side-effect only, never fails.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Files a question/answer pair under `area_id`, creating the bucket on
    /// first use. Unknown ids are accepted and get an ad-hoc bucket; callers
    /// that care about catalog membership check it themselves.
    pub fn record_response(&mut self, area_id: &str, question: String, response: String) {
        self.responses
            .entry(area_id.to_string())
            .or_default()
            .push(ResponsePair { question, response });
    }

    pub fn responses(&self) -> &ResponseMap {
        &self.responses
    }

    pub fn responses_for(&self, area_id: &str) -> Option<&[ResponsePair]> {
        self.responses.get(area_id).map(Vec::as_slice)
    }

    pub fn set_current_area(&mut self, area_id: impl Into<String>) {
        self.current_area = area_id.into();
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Sets the completion flag that gates report generation. Only ever
    /// triggered by an explicit user action in the front end.
    pub fn mark_complete(&mut self) {
        self.complete = true;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
