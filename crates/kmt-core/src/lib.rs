//! # kmt-core
//!
//! Core types, state machine, and error types for the KMT request tracker.
//!
//! This crate provides the foundational types shared across all KMT crates:
//! - Entity structs (material requests, audit entries, PPE register, materials)
//! - Status, role, and action enums with the request state machine
//! - The caller identity (`Actor`) and its visibility / review rules
//! - Transition checks (edge, authorization, input validation)
//! - ID prefix constants
//! - The domain error taxonomy
//! - Export projection rows for external renderers

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod export;
pub mod identity;
pub mod ids;
pub mod workflow;
