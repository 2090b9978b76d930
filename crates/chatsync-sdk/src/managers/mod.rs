//! 管理器门面
//!
//! 每个管理器只持有客户端上下文的引用，按业务域把调用编排成请求。

pub mod chat;
pub mod contact;
pub mod group;
pub mod presence;
pub mod room;
pub mod thread;
pub mod user_info;

pub use chat::ChatManager;
pub use contact::ContactManager;
pub use group::GroupManager;
pub use presence::PresenceManager;
pub use room::RoomManager;
pub use thread::ThreadManager;
pub use user_info::UserInfoManager;
