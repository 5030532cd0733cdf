//! Type definitions for bizdash

mod error;
mod records;
mod report;

pub use error::*;
pub use records::*;
pub use report::*;

/// Cache loading warning types
#[derive(Debug, Clone)]
pub enum CacheWarning {
    /// Failed to open or read cache file
    LoadFailed(String),
    /// Cache file was corrupted (invalid JSON)
    Corrupted(String),
}

impl std::fmt::Display for CacheWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheWarning::LoadFailed(msg) | CacheWarning::Corrupted(msg) => f.write_str(msg),
        }
    }
}
