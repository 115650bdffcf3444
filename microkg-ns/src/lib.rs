//! microkg-ns library interface
//!
//! Node synonymization for micro knowledge graphs: resolves entity references
//! to canonical identifiers through a local synonym database, triages the
//! failures, and retries them after identifier/name normalization.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod tabular;
pub mod workflow;

pub use microkg_common::{Error, Result};

/// `<git-hash>[-dirty] <profile> <utc-timestamp>` captured by `build.rs`
pub const BUILD_INFO: &str = env!("MICROKG_NS_BUILD");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_has_revision_profile_and_timestamp() {
        let fields: Vec<&str> = BUILD_INFO.split(' ').collect();
        assert_eq!(fields.len(), 3);
        assert!(!fields[0].is_empty());
        assert!(fields[2].ends_with('Z'));
    }
}
