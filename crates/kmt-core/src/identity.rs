use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::MaterialRequest;
use crate::enums::Role;

/// The caller of an operation, as verified by the external identity provider.
///
/// The core never authenticates; it trusts this tuple and only reads the role
/// and area for authorization.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
    /// Work area label, e.g. `"Rustaq"`. Admins may have none.
    pub area: Option<String>,
}

impl Actor {
    /// Build an actor; a blank area counts as none.
    #[must_use]
    pub fn new(id: &str, role: Role, area: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            role,
            area: area.map(str::trim).filter(|a| !a.is_empty()).map(String::from),
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    #[must_use]
    pub fn in_area(&self, area: &str) -> bool {
        self.area.as_deref().map(str::trim) == Some(area.trim())
    }

    /// Admins review every area; supervisors only their own.
    #[must_use]
    pub fn can_review_area(&self, area: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Supervisor => self.in_area(area),
            Role::Staff => false,
        }
    }

    /// Whether the request is visible to this actor at all.
    ///
    /// Staff see only what they submitted.
    #[must_use]
    pub fn can_view(&self, request: &MaterialRequest) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Supervisor => self.in_area(&request.area),
            Role::Staff => request.requester_id == self.id,
        }
    }
}
