//! ChatSync SDK - 即时通讯客户端同步核心
//!
//! 本 SDK 不实现网络协议，只负责客户端一侧的状态与调度：
//! - 🔗 关联请求：把管理器调用编排成带关联 ID 的请求，交给宿主提供的传输层
//! - 📬 回调注册表：每个请求的回调恰好结束一次，关闭时统一失败
//! - 💬 会话缓存：会话与消息的内存视图，未读数实时推导
//! - 📄 游标分页：统一的 `(cursor, page_size) -> CursorPage<T>` 拉取约定
//! - ⚙️ 事件分发：服务端推送解码成类型化事件，按类别通知监听器
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use chatsync_sdk::{ChannelTransport, ChatClient, ChatSyncConfig, Message};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChatSyncConfig::builder().app_key("demo#app").build()?;
//!     let (transport, mut outbound) = ChannelTransport::new();
//!     let client = ChatClient::new(config, Arc::new(transport))?;
//!
//!     // 宿主负责把 outbound 中的请求发给服务端，并把结果交回 handle_inbound
//!     tokio::spawn(async move { while let Some(_request) = outbound.recv().await {} });
//!
//!     client.login("alice", "token").await?;
//!     let sent = client
//!         .chat_manager()
//!         .send(Message::create_text_send_message("bob", "hello"))
//!         .await?;
//!     println!("sent {}", sent.msg_id);
//!     Ok(())
//! }
//! ```

pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod invoker;
pub mod listener;
pub mod logging;
pub mod managers;
pub mod methods;
pub mod model;
pub mod pagination;
pub mod registry;
pub mod storage;
pub mod transport;
pub mod utils;
pub mod version;

// 重新导出核心类型，方便使用
pub use callback::{CallBack, ValueCallBack};
pub use client::{ChatClient, UserSession};
pub use config::{ChatSyncConfig, ChatSyncConfigBuilder, PresenceCacheConfig};
pub use error::{error_code, ChatSyncError, ErrorKind, Result};
pub use events::{
    ChatEvent, ConnectionEvent, ContactEvent, EventCategory, EventDispatcher, EventStats,
    GroupEvent, MultiDeviceEvent, PresenceEvent, PushEvent, RoomEvent, ThreadEvent,
};
pub use listener::{
    AnyListener, ChatListener, ConnectionListener, ContactListener, GroupListener,
    MultiDeviceListener, PresenceListener, RoomListener, ThreadListener,
};
pub use logging::init_tracing;
pub use managers::{
    ChatManager, ContactManager, GroupManager, PresenceManager, RoomManager, ThreadManager,
    UserInfoManager,
};
pub use model::{
    ChatThread, Contact, Conversation, ConversationKey, ConversationType, CursorPage, Group,
    Message, MessageBody, MessageDirection, MessageStatus, PageResult, Presence, Room, UserInfo,
};
pub use pagination::{CursorPager, NumberedResource, PagedResource, PaginationEngine};
pub use registry::{CallbackRegistry, PendingRequest, RegistryStats};
pub use storage::{CacheStats, ConversationCache, PresenceCache, PresenceCacheStats};
pub use transport::{ChannelTransport, OutboundRequest, Transport, TransportEvent};
pub use version::{BUILD_TIME, SDK_VERSION};
