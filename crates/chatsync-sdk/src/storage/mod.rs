//! 本地存储
//!
//! 只有内存缓存；持久化由传输协作方负责。

pub mod conversation_cache;
pub mod presence_cache;

pub use conversation_cache::{CacheStats, ConversationCache};
pub use presence_cache::{PresenceCache, PresenceCacheStats};
