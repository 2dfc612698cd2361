use serde::Deserialize;
use serde::Serialize;

/// A named conversation owned by the backend. The client only ever holds a
/// cached copy; every mutation round-trips through the API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            if !title.is_empty() {
                return title.to_string();
            }
        }

        return format!("Chat {}", self.id);
    }
}
