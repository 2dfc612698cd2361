#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::ProviderCatalog;
use super::SessionStore;
use super::Timeline;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::StreamFrame;
use crate::domain::models::UiEvent;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::ApiError;
use crate::infrastructure::api::StreamRequest;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No in-flight stream; submission is enabled.
    Idle,
    /// Placeholders are on the timeline, the request has not resolved yet.
    Sending,
    /// Frames are being applied. Completion and failure re-arm to Idle
    /// immediately; they are surfaced as events rather than resting states.
    Streaming,
}

/// Orchestrates one request/stream per submitted message and owns all chat
/// state: the timeline, the session store, the provider catalog, and the
/// single in-flight slot. Presentation subscribes for change notifications
/// and reads state back through the accessors.
pub struct ChatController {
    client: Arc<ApiClient>,
    timeline: Timeline,
    sessions: SessionStore,
    catalog: ProviderCatalog,
    phase: Phase,
    stream_seq: u64,
    subscribers: Vec<mpsc::UnboundedSender<UiEvent>>,
}

impl ChatController {
    pub fn new(client: Arc<ApiClient>) -> ChatController {
        return ChatController {
            client,
            timeline: Timeline::default(),
            sessions: SessionStore::default(),
            catalog: ProviderCatalog::default(),
            phase: Phase::Idle,
            stream_seq: 0,
            subscribers: vec![],
        };
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        return &self.client;
    }

    pub fn timeline(&self) -> &Timeline {
        return &self.timeline;
    }

    pub fn sessions(&self) -> &SessionStore {
        return &self.sessions;
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        return &self.catalog;
    }

    pub fn phase(&self) -> Phase {
        return self.phase;
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<UiEvent> {
        let (tx, rx) = mpsc::unbounded_channel::<UiEvent>();
        self.subscribers.push(tx);
        return rx;
    }

    fn publish(&mut self, event: UiEvent) {
        // Dropped receivers unsubscribe themselves.
        self.subscribers.retain(|tx| return tx.send(event.clone()).is_ok());
    }

    /// Wraps an API error for propagation, emitting the credential-expired
    /// notification when the transport layer invalidated the session.
    fn track(&mut self, err: ApiError) -> anyhow::Error {
        if matches!(err, ApiError::CredentialExpired) {
            self.publish(UiEvent::CredentialExpired);
        }
        return anyhow::Error::new(err);
    }

    /// Initial load: provider catalog, session list, and the history of the
    /// adopted session. Catalog and list failures are non-fatal except when
    /// the credential has expired.
    pub async fn bootstrap(&mut self) -> Result<()> {
        let client = Arc::clone(&self.client);

        match client.providers().await {
            Ok(providers) => {
                self.catalog.load(providers);

                let provider = Config::get(ConfigKey::Provider);
                if !provider.is_empty() {
                    if let Err(err) = self.catalog.select_provider(&provider) {
                        tracing::warn!(error = %err, "ignoring configured provider");
                    }
                }
                let model = Config::get(ConfigKey::Model);
                if !model.is_empty() {
                    if let Err(err) = self.catalog.select_model(&model) {
                        tracing::warn!(error = %err, "ignoring configured model");
                    }
                }

                self.publish(UiEvent::CatalogUpdated);
            }
            Err(err @ ApiError::CredentialExpired) => return Err(self.track(err)),
            Err(err) => tracing::warn!(error = %err, "failed to load providers"),
        }

        match self.sessions.reload(&client).await {
            Ok(()) => self.publish(UiEvent::SessionsUpdated),
            Err(err @ ApiError::CredentialExpired) => return Err(self.track(err)),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load sessions");
                return Ok(());
            }
        }

        let preferred = Config::get(ConfigKey::SessionID).parse::<i64>().ok();
        let adopted = match preferred {
            Some(id) if self.sessions.contains(id) => Some(id),
            _ => self.sessions.sessions().first().map(|session| return session.id),
        };

        if let Some(id) = adopted {
            self.switch_session(id).await?;
        }

        return Ok(());
    }

    /// Makes a session active and loads its history. Any in-flight stream
    /// is abandoned: its late events no longer pass the sequence guard.
    pub async fn switch_session(&mut self, id: i64) -> Result<()> {
        if !self.sessions.contains(id) {
            bail!("no session with id {id}");
        }

        self.stream_seq += 1;
        self.sessions.set_active(Some(id));

        let client = Arc::clone(&self.client);
        match client.session_messages(id).await {
            Ok(history) => {
                self.timeline.load(history);
                self.publish(UiEvent::TimelineUpdated);
                return Ok(());
            }
            Err(err) => return Err(self.track(err)),
        }
    }

    pub async fn new_session(&mut self, title: Option<&str>) -> Result<i64> {
        self.stream_seq += 1;
        self.timeline.clear();
        self.sessions.set_active(None);
        self.publish(UiEvent::TimelineUpdated);

        let client = Arc::clone(&self.client);
        let session = match self.sessions.create(&client, title).await {
            Ok(session) => session,
            Err(err) => return Err(self.track(err)),
        };

        self.sessions.set_active(Some(session.id));
        self.publish(UiEvent::SessionsUpdated);

        return Ok(session.id);
    }

    /// Title edits are independent of any in-flight stream.
    pub async fn rename_session(&mut self, id: i64, title: &str) -> Result<()> {
        let client = Arc::clone(&self.client);
        if let Err(err) = self.sessions.rename(&client, id, title).await {
            return Err(self.track(err));
        }

        self.publish(UiEvent::SessionsUpdated);
        return Ok(());
    }

    /// Deleting the active session clears the timeline and active pointer
    /// before the backend call resolves.
    pub async fn delete_session(&mut self, id: i64) -> Result<()> {
        if self.sessions.active_id() == Some(id) {
            self.stream_seq += 1;
            self.timeline.clear();
            self.publish(UiEvent::TimelineUpdated);
        }

        let client = Arc::clone(&self.client);
        if let Err(err) = self.sessions.delete(&client, id).await {
            return Err(self.track(err));
        }

        self.publish(UiEvent::SessionsUpdated);
        return Ok(());
    }

    pub fn select_provider(&mut self, provider: &str) -> Result<()> {
        self.catalog.select_provider(provider)?;
        self.publish(UiEvent::CatalogUpdated);
        return Ok(());
    }

    pub fn select_model(&mut self, model: &str) -> Result<()> {
        self.catalog.select_model(model)?;
        self.publish(UiEvent::CatalogUpdated);
        return Ok(());
    }

    /// Submits one user message: optimistic placeholders first, then one
    /// stream whose frames are applied in arrival order until a terminal
    /// frame, transport failure, or closure. Stream failures are handled
    /// here (rollback plus notice), not returned as errors.
    pub async fn submit(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            bail!("cannot send an empty message");
        }
        if self.phase != Phase::Idle {
            bail!("a response is still streaming");
        }

        self.stream_seq += 1;
        let seq = self.stream_seq;

        self.timeline.push_user(text);
        let assistant_id = self.timeline.push_placeholder();
        self.phase = Phase::Sending;
        self.publish(UiEvent::TimelineUpdated);

        let request = StreamRequest {
            message: text.to_string(),
            session_id: self.sessions.active_id(),
            provider: self.catalog.provider().map(str::to_string),
            model: self.catalog.model().map(str::to_string),
        };

        let client = Arc::clone(&self.client);
        let mut stream = match client.open_stream(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                let notice = err.to_string();
                if matches!(err, ApiError::CredentialExpired) {
                    self.publish(UiEvent::CredentialExpired);
                }
                self.fail_stream(seq, assistant_id, &notice);
                return Ok(());
            }
        };

        self.phase = Phase::Streaming;

        loop {
            match stream.next_frame().await {
                Ok(Some(frame)) => {
                    if self.apply_frame(seq, assistant_id, frame).await {
                        break;
                    }
                }
                Ok(None) => {
                    // Closure without a terminal frame is an implicit
                    // incomplete-stream condition.
                    self.fail_stream(seq, assistant_id, "the stream ended before completing");
                    break;
                }
                Err(err) => {
                    self.fail_stream(seq, assistant_id, &err.to_string());
                    break;
                }
            }
        }

        return Ok(());
    }

    /// Applies one decoded frame, returning whether the stream is finished.
    /// The sequence guard drops events from streams that are no longer
    /// current; the timeline they would target no longer exists.
    async fn apply_frame(&mut self, seq: u64, assistant_id: i64, frame: StreamFrame) -> bool {
        if seq != self.stream_seq {
            tracing::debug!(seq = seq, "dropping frame from a stale stream");
            return true;
        }

        match frame {
            StreamFrame::Session { session_id } => {
                tracing::debug!(session_id = session_id, "stream attached to session");
                return false;
            }
            StreamFrame::Chunk { content } => {
                self.timeline.append_streaming(assistant_id, &content);
                self.publish(UiEvent::AssistantDelta(content));
                return false;
            }
            StreamFrame::Done { session_id } => {
                self.timeline.finalize(assistant_id);
                self.phase = Phase::Idle;
                self.publish(UiEvent::TimelineUpdated);

                if self.sessions.active_id() != Some(session_id) {
                    self.adopt_session(session_id).await;
                }

                return true;
            }
            StreamFrame::Error { error } => {
                self.fail_stream(seq, assistant_id, &error);
                return true;
            }
        }
    }

    /// The backend created a session implicitly for this message: adopt the
    /// authoritative id and refresh the list once.
    async fn adopt_session(&mut self, session_id: i64) {
        self.sessions.set_active(Some(session_id));

        let client = Arc::clone(&self.client);
        match self.sessions.reload(&client).await {
            Ok(()) => self.publish(UiEvent::SessionsUpdated),
            Err(ApiError::CredentialExpired) => self.publish(UiEvent::CredentialExpired),
            Err(err) => tracing::warn!(error = %err, "failed to refresh sessions after stream"),
        }
    }

    /// Rolls back the optimistic placeholder and re-arms to Idle. The
    /// conversation history stays consistent with what the assistant
    /// actually completed.
    fn fail_stream(&mut self, seq: u64, assistant_id: i64, notice: &str) {
        if seq != self.stream_seq {
            return;
        }

        self.timeline.discard(assistant_id);
        self.phase = Phase::Idle;
        self.publish(UiEvent::TimelineUpdated);
        self.publish(UiEvent::StreamFailed(notice.to_string()));
    }
}
