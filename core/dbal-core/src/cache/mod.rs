//! Disk-based query result cache

pub mod filesystem;
pub mod options;
pub mod result;
pub mod store;

pub use filesystem::Filesystem;
pub use options::{CacheOptions, CacheTime};
pub use result::CachedResult;
pub use store::{CacheStatus, CacheStore};
