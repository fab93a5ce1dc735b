//! Forum domain rules that do not depend on the cache.

pub mod error;
pub mod types;
