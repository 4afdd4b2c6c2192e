//! Repository modules implementing the KMT operations.
//!
//! Each module adds methods to `KmtService` via `impl KmtService` blocks.
//! Loaders that must run inside a write transaction take a
//! `&libsql::Connection` and never touch the gate themselves.

pub mod audit;
pub mod export;
pub mod material;
pub mod ppe;
pub mod recovery;
pub mod request;
pub mod workflow;
