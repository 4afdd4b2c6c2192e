use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A PPE issuance record, created when a PPE request is completed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PpeRegisterEntry {
    pub id: String,
    /// Request whose completion issued this item.
    pub request_id: String,
    /// The person the item was issued to (the requester).
    pub user_id: String,
    pub item_name: String,
    pub size: String,
    pub qty: u32,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    pub returned: bool,
    pub return_photo_refs: Vec<String>,
    pub remark: Option<String>,
    pub returned_at: Option<DateTime<Utc>>,
}
