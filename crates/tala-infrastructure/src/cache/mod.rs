//! Cache module (in-process tenant lookups)

pub mod slug_cache;

pub use slug_cache::SlugCache;
