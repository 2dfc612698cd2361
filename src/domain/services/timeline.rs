#[cfg(test)]
#[path = "timeline_test.rs"]
mod tests;

use crate::domain::models::Message;
use crate::domain::models::Role;

/// Ordered message sequence for the active session. At most one message is
/// streaming at a time; operations on unknown ids are no-ops, since a stale
/// stream may try to touch a timeline that has since been replaced.
#[derive(Default)]
pub struct Timeline {
    messages: Vec<Message>,
    next_local_id: i64,
}

impl Timeline {
    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn len(&self) -> usize {
        return self.messages.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.messages.is_empty();
    }

    /// Replaces the timeline with server history and re-seeds the local id
    /// counter above every server-assigned id.
    pub fn load(&mut self, messages: Vec<Message>) {
        self.next_local_id = messages.iter().map(|msg| return msg.id).max().unwrap_or(0);
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn alloc_id(&mut self) -> i64 {
        self.next_local_id += 1;
        return self.next_local_id;
    }

    /// Appends a finalized user message, returning its local id.
    pub fn push_user(&mut self, content: &str) -> i64 {
        let id = self.alloc_id();
        self.messages.push(Message::new(id, Role::User, content));
        return id;
    }

    /// Appends the streaming assistant placeholder, returning its local id.
    pub fn push_placeholder(&mut self) -> i64 {
        let id = self.alloc_id();
        self.messages.push(Message::placeholder(id));
        return id;
    }

    /// Concatenates a fragment onto the streaming message with the given id.
    pub fn append_streaming(&mut self, id: i64, fragment: &str) {
        if let Some(msg) = self
            .messages
            .iter_mut()
            .find(|msg| return msg.id == id && msg.streaming)
        {
            msg.append(fragment);
        }
    }

    /// Flips the message to immutable. Further appends to it are no-ops.
    pub fn finalize(&mut self, id: i64) {
        if let Some(msg) = self.messages.iter_mut().find(|msg| return msg.id == id) {
            msg.streaming = false;
        }
    }

    /// Removes a message entirely; used to roll back an optimistic
    /// placeholder on failure.
    pub fn discard(&mut self, id: i64) {
        self.messages.retain(|msg| return msg.id != id);
    }
}
