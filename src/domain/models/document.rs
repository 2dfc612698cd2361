use serde::Deserialize;
use serde::Serialize;

/// An uploaded document as the backend reports it. Processing happens
/// server-side; `status` moves through pending, processing, completed and
/// failed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub status: String,
    pub uploaded_at: String,
}
