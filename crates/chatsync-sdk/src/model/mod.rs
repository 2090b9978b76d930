//! 数据模型
//!
//! 所有对外传输的结构都可以 serde 序列化，JSON 字段统一使用 snake_case。

pub mod conversation;
pub mod cursor;
pub mod enums;
pub mod group;
pub mod message;
pub mod options;
pub mod presence;
pub mod reaction;
pub mod room;
pub mod thread;
pub mod user;

pub use conversation::{Conversation, ConversationKey, RemoteConversation};
pub use cursor::{CursorPage, PageResult};
pub use enums::{
    ConversationType, DownloadStatus, MessageBodyType, MessageDirection, MessageSearchDirection,
    MessageSearchScope, MessageStatus, MultiDevicesOperation,
};
pub use group::{
    Group, GroupInfo, GroupOptions, GroupPermissionType, GroupReadAck, GroupSharedFile, GroupStyle,
};
pub use message::{
    AttributeValue, CmdBody, CombineBody, CustomBody, FileBody, ImageBody, LocationBody, Message,
    MessageBody, SupportLanguage, TextBody, VideoBody, VoiceBody,
};
pub use options::{FetchServerMessagesOption, MessageSearchOptions};
pub use presence::{Presence, PresenceDeviceStatus};
pub use reaction::{
    MessagePinInfo, MessageReaction, MessageReactionChange, MessageReactionOperation,
    ReactionOperate, RecallMessageInfo,
};
pub use room::{Room, RoomPermissionType};
pub use thread::{ChatThread, ChatThreadEvent, ChatThreadOperation};
pub use user::{Contact, UserInfo};

/// 消息的会话类型（与会话类型同一套取值）
pub type ChatType = ConversationType;
