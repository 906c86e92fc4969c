//! Read-optimized hostname lookup with two-sided wildcard support.
//!
//! Keys are staged through [`HostKeys`], compacted once into a frozen
//! [`HostMap`], and looked up afterwards without synchronization.

/// Build-time limits and per-key flags
pub mod config;
/// Staging phase: key collection and classification
pub mod keys;
/// The frozen combined lookup handle
pub mod map;

/// Streaming string hash and ASCII case folding
mod hash;
/// Frozen flat tables and the wildcard hierarchy
mod table;

mod error;

pub use config::{BuildOptions, KeyFlags, StagingSize};
pub use error::{HashError, Result};
pub use hash::{hash, hash_key, hash_key_lc, hash_strlow};
pub use keys::HostKeys;
pub use map::HostMap;
