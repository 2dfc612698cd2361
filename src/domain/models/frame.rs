use serde::Deserialize;
use serde::Serialize;

/// One decoded unit of the chat event stream. The backend emits each frame
/// as `data: {json}` delimited by a blank line; the `type` field carries the
/// discriminator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    /// Informational. Sent once the backend has resolved which session the
    /// message belongs to; reserved for future use.
    Session { session_id: i64 },
    /// A fragment of assistant output, applied in arrival order.
    Chunk { content: String },
    /// Terminal. Carries the authoritative session id, which may differ from
    /// the one the request was sent with when the backend implicitly created
    /// a new session.
    Done { session_id: i64 },
    /// Terminal. The stream failed server-side.
    Error { error: String },
}

impl StreamFrame {
    pub fn is_terminal(&self) -> bool {
        return matches!(self, StreamFrame::Done { .. } | StreamFrame::Error { .. });
    }
}
