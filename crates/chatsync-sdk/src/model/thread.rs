use serde::{Deserialize, Serialize};

use super::message::Message;

/// 子区
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatThread {
    pub thread_id: String,
    /// 创建子区的父消息 ID
    pub message_id: String,
    /// 所属群组 ID
    pub parent_id: String,
    pub owner: String,
    pub name: String,
    pub message_count: u32,
    pub members_count: u32,
    pub create_at: i64,
    pub last_message: Option<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatThreadOperation {
    Unknown,
    Create,
    Update,
    Delete,
    UpdateMsg,
}

impl Default for ChatThreadOperation {
    fn default() -> Self {
        ChatThreadOperation::Unknown
    }
}

/// 子区变更通知
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatThreadEvent {
    pub from: String,
    pub operation: ChatThreadOperation,
    pub thread: ChatThread,
}
