//! Domain layer containing extraction logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, state machine trait)
//! - `transcript` - Turns, transcripts and canonical normalization
//! - `schema` - Typed field specifications, schemas and the registry
//! - `extraction` - Repair loop state machine, attempts and result records

pub mod extraction;
pub mod foundation;
pub mod schema;
pub mod transcript;
