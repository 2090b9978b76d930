use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::enums::ConversationType;
use super::message::Message;

/// 会话唯一标识：(会话 ID, 会话类型, 是否子区)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationKey {
    pub id: String,
    pub conv_type: ConversationType,
    #[serde(default)]
    pub is_thread: bool,
}

impl ConversationKey {
    pub fn new(id: impl Into<String>, conv_type: ConversationType) -> Self {
        Self {
            id: id.into(),
            conv_type,
            is_thread: false,
        }
    }

    pub fn direct(id: impl Into<String>) -> Self {
        Self::new(id, ConversationType::Direct)
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self::new(id, ConversationType::Group)
    }

    pub fn room(id: impl Into<String>) -> Self {
        Self::new(id, ConversationType::Room)
    }

    /// 子区会话（挂在群组下）
    pub fn thread(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conv_type: ConversationType::Group,
            is_thread: true,
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_thread {
            write!(f, "{}:{}#thread", self.conv_type.as_str(), self.id)
        } else {
            write!(f, "{}:{}", self.conv_type.as_str(), self.id)
        }
    }
}

/// 会话元数据
///
/// 未读数和最后一条消息都不在这里存储，由缓存按时间线实时推导。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(rename = "type")]
    pub conv_type: ConversationType,
    #[serde(default)]
    pub is_thread: bool,
    #[serde(default)]
    pub is_pinned: bool,
    /// 置顶时间，未置顶时为 0
    #[serde(default)]
    pub pinned_time: i64,
    #[serde(default)]
    pub ext: HashMap<String, String>,
}

impl Conversation {
    pub fn new(key: &ConversationKey) -> Self {
        Self {
            id: key.id.clone(),
            conv_type: key.conv_type,
            is_thread: key.is_thread,
            is_pinned: false,
            pinned_time: 0,
            ext: HashMap::new(),
        }
    }

    pub fn key(&self) -> ConversationKey {
        ConversationKey {
            id: self.id.clone(),
            conv_type: self.conv_type,
            is_thread: self.is_thread,
        }
    }

    /// 设置置顶状态，保持 pinned_time != 0 ⇔ is_pinned
    pub(crate) fn apply_pin(&mut self, is_pinned: bool, timestamp: i64) {
        self.is_pinned = is_pinned;
        self.pinned_time = if is_pinned { timestamp.max(1) } else { 0 };
    }
}

/// 服务端会话列表中的一项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConversation {
    #[serde(flatten)]
    pub conversation: Conversation,
    #[serde(default)]
    pub last_message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(ConversationKey::group("g1").to_string(), "group:g1");
        assert_eq!(ConversationKey::thread("t1").to_string(), "group:t1#thread");
    }

    #[test]
    fn test_pin_keeps_time_consistent() {
        let mut conv = Conversation::new(&ConversationKey::direct("bob"));
        conv.apply_pin(true, 0);
        assert!(conv.is_pinned);
        assert_eq!(conv.pinned_time, 1);
        conv.apply_pin(true, 1_700_000_000_000);
        assert_eq!(conv.pinned_time, 1_700_000_000_000);
        conv.apply_pin(false, 1_700_000_000_500);
        assert!(!conv.is_pinned);
        assert_eq!(conv.pinned_time, 0);
    }

    #[test]
    fn test_remote_conversation_decode() {
        let remote: RemoteConversation = serde_json::from_value(serde_json::json!({
            "id": "g1",
            "type": "group",
            "is_pinned": true,
            "pinned_time": 42
        }))
        .unwrap();
        assert_eq!(remote.conversation.key(), ConversationKey::group("g1"));
        assert!(remote.last_message.is_none());
    }
}
