//! # MicroKG Common Library
//!
//! Shared code for the MicroKG node synonymization tools:
//! - Error types
//! - Bootstrap configuration (TOML) loading
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
