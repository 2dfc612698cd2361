#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde::Deserialize;
use serde::Serialize;

use super::Role;

/// One entry in a conversation timeline. Messages loaded from the backend
/// carry server-assigned ids; optimistic placeholders carry locally-assigned
/// ids. A message stays mutable only while `streaming` is true.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub streaming: bool,
}

impl Message {
    pub fn new(id: i64, role: Role, content: &str) -> Message {
        return Message {
            id,
            role,
            content: content.to_string(),
            streaming: false,
        };
    }

    /// An empty assistant message that chunk events append to until the
    /// stream completes.
    pub fn placeholder(id: i64) -> Message {
        return Message {
            id,
            role: Role::Assistant,
            content: "".to_string(),
            streaming: true,
        };
    }

    pub fn append(&mut self, fragment: &str) {
        self.content += fragment;
    }
}
