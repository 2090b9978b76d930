use serde::{Deserialize, Serialize};

use super::enums::{MessageBodyType, MessageSearchDirection, MessageSearchScope};

/// 从服务端拉取历史消息的选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchServerMessagesOption {
    /// 是否把拉取到的消息写入本地缓存
    pub is_save: bool,
    pub direction: MessageSearchDirection,
    /// 只拉取该用户发送的消息（群聊有效）
    pub from: Option<String>,
    pub msg_types: Vec<MessageBodyType>,
    /// 起始时间，-1 表示不限
    pub start_time: i64,
    /// 结束时间，-1 表示不限
    pub end_time: i64,
}

impl Default for FetchServerMessagesOption {
    fn default() -> Self {
        Self {
            is_save: true,
            direction: MessageSearchDirection::Up,
            from: None,
            msg_types: Vec::new(),
            start_time: -1,
            end_time: -1,
        }
    }
}

/// 本地消息搜索选项
///
/// 统一取代多个重载的搜索接口，不需要的条件保持默认值即可。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSearchOptions {
    pub msg_types: Vec<MessageBodyType>,
    /// 搜索起点时间戳，-1 表示从最新消息开始
    pub timestamp: i64,
    pub max_count: usize,
    pub from: Option<String>,
    pub direction: MessageSearchDirection,
    pub scope: MessageSearchScope,
}

impl Default for MessageSearchOptions {
    fn default() -> Self {
        Self {
            msg_types: Vec::new(),
            timestamp: -1,
            max_count: 20,
            from: None,
            direction: MessageSearchDirection::Up,
            scope: MessageSearchScope::Content,
        }
    }
}

impl MessageSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_msg_types(mut self, types: Vec<MessageBodyType>) -> Self {
        self.msg_types = types;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_direction(mut self, direction: MessageSearchDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_scope(mut self, scope: MessageSearchScope) -> Self {
        self.scope = scope;
        self
    }
}
