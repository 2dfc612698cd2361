#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use crate::domain::models::Session;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::ApiError;

/// Cached copy of the backend's session list plus the active pointer. The
/// backend is the source of truth: every mutation is followed by a full
/// reload rather than a local patch.
#[derive(Default)]
pub struct SessionStore {
    sessions: Vec<Session>,
    active_id: Option<i64>,
}

impl SessionStore {
    pub fn sessions(&self) -> &[Session] {
        return &self.sessions;
    }

    pub fn active_id(&self) -> Option<i64> {
        return self.active_id;
    }

    pub fn set_active(&mut self, id: Option<i64>) {
        self.active_id = id;
    }

    pub fn contains(&self, id: i64) -> bool {
        return self.sessions.iter().any(|session| return session.id == id);
    }

    /// Drops a session from the cache before the backend delete resolves,
    /// clearing the active pointer when it targeted that session. Returns
    /// whether the evicted session was active, so the caller can clear the
    /// timeline in the same breath.
    pub fn evict(&mut self, id: i64) -> bool {
        self.sessions.retain(|session| return session.id != id);

        if self.active_id == Some(id) {
            self.active_id = None;
            return true;
        }

        return false;
    }

    pub async fn reload(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        self.sessions = client.list_sessions().await?;
        return Ok(());
    }

    pub async fn create(
        &mut self,
        client: &ApiClient,
        title: Option<&str>,
    ) -> Result<Session, ApiError> {
        let session = client.create_session(title).await?;
        self.reload(client).await?;
        return Ok(session);
    }

    pub async fn rename(
        &mut self,
        client: &ApiClient,
        id: i64,
        title: &str,
    ) -> Result<(), ApiError> {
        client.rename_session(id, title).await?;
        self.reload(client).await?;
        return Ok(());
    }

    /// Returns whether the deleted session was the active one. The local
    /// eviction happens before any await so the UI never renders stale
    /// messages against a dead session id.
    pub async fn delete(&mut self, client: &ApiClient, id: i64) -> Result<bool, ApiError> {
        let was_active = self.evict(id);
        client.delete_session(id).await?;
        self.reload(client).await?;
        return Ok(was_active);
    }
}
