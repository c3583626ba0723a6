pub mod memory;
pub mod moka;
pub mod null;
pub mod redis;

pub use memory::MemoryObjectCache;
pub use moka::MokaObjectCache;
pub use null::NullObjectCache;
pub use redis::RedisObjectCache;
