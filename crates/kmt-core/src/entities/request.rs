use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{RequestCategory, RequestStatus};
use crate::errors::CoreError;

/// One line of a material request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RequestItem {
    /// Optional reference into the material catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<String>,
    pub material_name: String,
    #[serde(default)]
    pub size: String,
    pub qty: u32,
    /// Blob-store handle for a photo of the new item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_photo_ref: Option<String>,
    /// Blob-store handle for a photo of the returned item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_photo_ref: Option<String>,
}

impl RequestItem {
    /// Shorthand for an item with no size, catalog link, or photos.
    #[must_use]
    pub fn named(material_name: &str, qty: u32) -> Self {
        Self {
            material_id: None,
            material_name: material_name.to_string(),
            size: String::new(),
            qty,
            new_photo_ref: None,
            return_photo_ref: None,
        }
    }

    /// `"{name} ({size}) x{qty}"`, e.g. `"Gloves (L) x2"`; the size part is
    /// dropped when blank (`"Gloves x1"`).
    #[must_use]
    pub fn summary(&self) -> String {
        if self.size.trim().is_empty() {
            format!("{} x{}", self.material_name, self.qty)
        } else {
            format!("{} ({}) x{}", self.material_name, self.size, self.qty)
        }
    }
}

/// A staff submission for materials or PPE.
///
/// Status changes only through the workflow engine; `deleted_at` only through
/// the recovery operations.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MaterialRequest {
    pub id: String,
    pub requester_id: String,
    pub area: String,
    pub category: RequestCategory,
    pub items: Vec<RequestItem>,
    pub status: RequestStatus,
    pub assigned_supervisor_id: Option<String>,
    pub decline_reason: Option<String>,
    pub received_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MaterialRequest {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    #[must_use]
    pub fn total_qty(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }
}

/// Input for creating a request. Validated before anything is written.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewRequest {
    pub area: String,
    #[serde(default)]
    pub category: RequestCategory,
    pub items: Vec<RequestItem>,
}

impl NewRequest {
    #[must_use]
    pub fn new(area: &str, category: RequestCategory, items: Vec<RequestItem>) -> Self {
        Self {
            area: area.to_string(),
            category,
            items,
        }
    }

    /// Parse an items payload such as
    /// `[{"material_name":"Ring spanner 10","size":"","qty":1}]`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the JSON does not describe a list of
    /// items (including negative quantities).
    pub fn items_from_json(raw: &str) -> Result<Vec<RequestItem>, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("invalid items payload: {e}")))
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the area is blank, there are no
    /// items, or an item has an empty name or a zero quantity.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.area.trim().is_empty() {
            return Err(CoreError::Validation("area must not be empty".into()));
        }
        if self.items.is_empty() {
            return Err(CoreError::Validation(
                "a request needs at least one item".into(),
            ));
        }
        for (idx, item) in self.items.iter().enumerate() {
            let line = idx + 1;
            if item.material_name.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "item {line}: material_name must not be empty"
                )));
            }
            if item.qty == 0 {
                return Err(CoreError::Validation(format!(
                    "item {line}: qty must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}
