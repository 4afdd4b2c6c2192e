//! Default actor tuple, as handed over by the identity provider.
//!
//! The values are trusted as already verified; only the role is checked,
//! because it must be one of the closed set of roles.

use kmt_core::enums::Role;
use kmt_core::identity::Actor;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActorConfig {
    #[serde(default)]
    pub id: String,

    /// One of `staff`, `supervisor`, `admin`.
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub area: String,
}

impl ActorConfig {
    pub fn is_configured(&self) -> bool {
        !self.id.is_empty() && !self.role.is_empty()
    }

    /// Build the actor, validating the role at the boundary.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if id or role is missing, and
    /// `ConfigError::InvalidValue` if the role is not a known role.
    pub fn to_actor(&self) -> Result<Actor, ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "actor".into(),
            });
        }
        let role: Role = self.role.parse().map_err(|e: kmt_core::errors::CoreError| {
            ConfigError::InvalidValue {
                field: "actor.role".into(),
                reason: e.to_string(),
            }
        })?;
        let area = Some(self.area.trim()).filter(|a| !a.is_empty());
        Ok(Actor::new(self.id.trim(), role, area))
    }
}
