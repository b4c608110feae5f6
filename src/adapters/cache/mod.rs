//! Cache adapter implementations.

mod cached_repository;
mod in_memory;
mod redis;

pub use cached_repository::CachedPaymentRepository;
pub use in_memory::InMemoryCacheStore;
pub use redis::RedisCacheStore;
