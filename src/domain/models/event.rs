/// Notifications published by the controller and session store to whoever
/// subscribed. Payload-free variants signal that the corresponding state
/// should be re-read through the controller's accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// Timeline structure changed: placeholders added, a message finalized
    /// or discarded, history loaded, or the timeline cleared.
    TimelineUpdated,
    /// A streamed fragment was appended to the in-flight assistant message.
    AssistantDelta(String),
    SessionsUpdated,
    CatalogUpdated,
    /// The optimistic assistant placeholder was rolled back; the payload is
    /// a human-readable notice.
    StreamFailed(String),
    /// The stored credential was rejected outside the auth flow and has been
    /// cleared. The user must log in again.
    CredentialExpired,
}
