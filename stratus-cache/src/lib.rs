//! Cache store backends for Stratus.
//!
//! - [`RedisCacheStore`]: network store shared by every service instance
//! - [`MemoryCacheStore`]: in-process TTL map with a capacity bound

mod memory;
mod redis_store;

pub use memory::{MemoryCacheConfig, MemoryCacheStats, MemoryCacheStore};
pub use redis_store::RedisCacheStore;
