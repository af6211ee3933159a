//! # reread-core
//!
//! Core types, traits, and abstractions for the reread library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other reread crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod traits;
pub mod urls;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use schedule::{is_due, next_review, ReviewAdvance, REPETITION_INTERVALS};
pub use traits::*;
pub use urls::canonicalize_url;
pub use uuid_utils::{extract_timestamp, is_v7, new_v7};
