//! ID prefix constants.
//!
//! IDs are generated by the database as `{prefix}-{8 hex chars}`, e.g. `req-a3f8b2c1`.

pub const PREFIX_REQUEST: &str = "req";
pub const PREFIX_AUDIT: &str = "aud";
pub const PREFIX_PPE: &str = "ppe";
pub const PREFIX_MATERIAL: &str = "mat";

/// Every prefix in use, for ID-format tests.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_REQUEST, PREFIX_AUDIT, PREFIX_PPE, PREFIX_MATERIAL];
