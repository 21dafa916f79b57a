// ABOUTME: Library root for shipyard - exposes the pipeline and its parts.
// ABOUTME: The main binary is in main.rs.

pub mod cache_key;
pub mod collaborators;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod rollback;
pub mod types;
