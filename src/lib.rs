//! Transcript Analytics - Structured analytics from conversation transcripts
//!
//! Turns a support or voice-agent conversation into a validated record of
//! analytics fields. A transcript is normalized to canonical text, a
//! language model is asked for an object matching a declared schema, and
//! the candidate is validated. Invalid candidates are sent back with the
//! field errors until one conforms or the attempt budget runs out.
//!
//! - `domain` - transcripts, schemas, the repair loop state machine and records
//! - `ports` - language model and transcript source interfaces
//! - `adapters` - OpenAI, Azure OpenAI, Anthropic, mock, JSON-lines and in-memory
//! - `application` - the extraction pipeline and thread handler
//! - `config` - environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
