use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOperation {
    SwapPhotos,
    ChangeLayout,
    MovePhotoCrossPage,
    ReorderPages,
    DuplicatePage,
    DeletePage,
    RegeneratePages,
}

/// Record of one applied edit. Returned to the caller, which owns the album log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditHistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub operation: EditOperation,
    pub page_index: Option<usize>,
    pub details: Value,
}

impl EditHistoryEntry {
    pub fn new(operation: EditOperation, page_index: Option<usize>, details: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            operation,
            page_index,
            details,
        }
    }
}
