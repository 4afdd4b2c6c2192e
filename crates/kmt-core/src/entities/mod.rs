//! Entity structs for all KMT domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `kmt-db/migrations`).
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` for JSON roundtrip
//! and schema validation.

mod audit;
mod material;
mod ppe;
mod request;

pub use audit::AuditEntry;
pub use material::Material;
pub use ppe::PpeRegisterEntry;
pub use request::{MaterialRequest, NewRequest, RequestItem};
