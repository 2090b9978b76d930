use serde::{Deserialize, Serialize};

use super::message::Message;

/// 消息上的一种表情回应
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageReaction {
    pub reaction: String,
    pub count: u32,
    pub user_list: Vec<String>,
    /// 当前用户是否添加过该回应
    pub state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionOperate {
    Remove,
    Add,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReactionOperation {
    pub user_id: String,
    pub reaction: String,
    pub operate: ReactionOperate,
}

/// 表情回应变更通知
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageReactionChange {
    pub conversation_id: String,
    pub message_id: String,
    pub reaction_list: Vec<MessageReaction>,
    pub operation_list: Vec<MessageReactionOperation>,
}

/// 消息撤回信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallMessageInfo {
    pub recall_by: String,
    pub recall_message_id: String,
    pub conversation_id: String,
    pub ext: String,
    /// 被撤回消息在撤回前的快照（本地可能没有）
    pub recall_message: Option<Message>,
}

/// 消息置顶信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePinInfo {
    pub pinned_by: String,
    pub pinned_at: i64,
}
