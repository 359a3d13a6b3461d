//! Command handlers.

mod extract_thread;

pub use extract_thread::{
    ExtractThreadCommand, ExtractThreadError, ExtractThreadHandler, ExtractThreadResult,
};
