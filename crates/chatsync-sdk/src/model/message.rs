//! 消息模型
//!
//! 消息体是带标签的枚举，任何时刻只可能存在一种消息体。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::enums::{
    ConversationType, DownloadStatus, MessageBodyType, MessageDirection, MessageSearchScope,
    MessageStatus,
};
use crate::utils::now_millis;

/// 消息扩展属性值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    JsonString(String),
    Null,
}

impl AttributeValue {
    /// 字符串形式（用于扩展属性搜索）
    pub fn as_search_text(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) | AttributeValue::JsonString(s) => Some(s.clone()),
            AttributeValue::Bool(b) => Some(b.to_string()),
            AttributeValue::Int32(v) => Some(v.to_string()),
            AttributeValue::Int64(v) => Some(v.to_string()),
            AttributeValue::Float(v) => Some(v.to_string()),
            AttributeValue::Double(v) => Some(v.to_string()),
            AttributeValue::Null => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBody {
    pub text: String,
    #[serde(default)]
    pub target_languages: Vec<String>,
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

/// 翻译服务支持的语言
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportLanguage {
    pub code: String,
    pub name: String,
    pub native_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileBody {
    pub local_path: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub remote_path: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub download_status: DownloadStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBody {
    #[serde(flatten)]
    pub file: FileBody,
    #[serde(default)]
    pub thumbnail_local_path: String,
    #[serde(default)]
    pub thumbnail_remote_path: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub original: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoBody {
    #[serde(flatten)]
    pub file: FileBody,
    #[serde(default)]
    pub thumbnail_local_path: String,
    #[serde(default)]
    pub thumbnail_remote_path: String,
    #[serde(default)]
    pub duration: i32,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceBody {
    #[serde(flatten)]
    pub file: FileBody,
    #[serde(default)]
    pub duration: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationBody {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub building_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmdBody {
    pub action: String,
    #[serde(default)]
    pub deliver_online_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomBody {
    pub event: String,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// 合并转发消息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombineBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub compatible_text: String,
    #[serde(default)]
    pub message_list: Vec<String>,
}

/// 消息体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum MessageBody {
    Text(TextBody),
    Image(ImageBody),
    Video(VideoBody),
    Voice(VoiceBody),
    File(FileBody),
    Location(LocationBody),
    Cmd(CmdBody),
    Custom(CustomBody),
    Combine(CombineBody),
}

impl MessageBody {
    pub fn text(content: impl Into<String>) -> Self {
        MessageBody::Text(TextBody {
            text: content.into(),
            ..Default::default()
        })
    }

    pub fn cmd(action: impl Into<String>, deliver_online_only: bool) -> Self {
        MessageBody::Cmd(CmdBody {
            action: action.into(),
            deliver_online_only,
        })
    }

    pub fn custom(event: impl Into<String>, params: HashMap<String, String>) -> Self {
        MessageBody::Custom(CustomBody {
            event: event.into(),
            params,
        })
    }

    pub fn location(latitude: f64, longitude: f64, address: impl Into<String>) -> Self {
        MessageBody::Location(LocationBody {
            latitude,
            longitude,
            address: address.into(),
            building_name: String::new(),
        })
    }

    pub fn file(local_path: impl Into<String>, display_name: impl Into<String>, file_size: i64) -> Self {
        MessageBody::File(FileBody {
            local_path: local_path.into(),
            display_name: display_name.into(),
            file_size,
            ..Default::default()
        })
    }

    pub fn body_type(&self) -> MessageBodyType {
        match self {
            MessageBody::Text(_) => MessageBodyType::Text,
            MessageBody::Image(_) => MessageBodyType::Image,
            MessageBody::Video(_) => MessageBodyType::Video,
            MessageBody::Voice(_) => MessageBodyType::Voice,
            MessageBody::File(_) => MessageBodyType::File,
            MessageBody::Location(_) => MessageBodyType::Location,
            MessageBody::Cmd(_) => MessageBodyType::Cmd,
            MessageBody::Custom(_) => MessageBodyType::Custom,
            MessageBody::Combine(_) => MessageBodyType::Combine,
        }
    }

    /// 可被关键字搜索的正文
    pub fn searchable_text(&self) -> Option<&str> {
        match self {
            MessageBody::Text(b) => Some(&b.text),
            MessageBody::File(b) => Some(&b.display_name),
            MessageBody::Location(b) => Some(&b.address),
            MessageBody::Combine(b) => Some(&b.summary),
            _ => None,
        }
    }
}

/// 消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub msg_id: String,
    pub conversation_id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub chat_type: ConversationType,
    #[serde(default)]
    pub direction: MessageDirection,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub local_time: i64,
    /// 0 表示服务端时间未知
    #[serde(default)]
    pub server_time: i64,
    #[serde(default)]
    pub has_read_ack: bool,
    #[serde(default)]
    pub has_deliver_ack: bool,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_thread: bool,
    #[serde(default)]
    pub is_need_group_ack: bool,
    #[serde(default)]
    pub deliver_online_only: bool,
    #[serde(default)]
    pub is_content_replaced: bool,
    pub body: MessageBody,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
}

impl Message {
    /// 创建一条待发送消息：会话 ID 即接收方，状态为 Create，自己发的消息视为已读
    pub fn create_send_message(
        to: impl Into<String>,
        body: MessageBody,
        chat_type: ConversationType,
    ) -> Self {
        let to = to.into();
        Self {
            msg_id: generate_msg_id(),
            conversation_id: to.clone(),
            from: String::new(),
            to,
            chat_type,
            direction: MessageDirection::Send,
            status: MessageStatus::Create,
            local_time: now_millis(),
            server_time: 0,
            has_read_ack: false,
            has_deliver_ack: false,
            is_read: true,
            is_thread: false,
            is_need_group_ack: false,
            deliver_online_only: false,
            is_content_replaced: false,
            body,
            attributes: HashMap::new(),
        }
    }

    pub fn create_text_send_message(to: impl Into<String>, content: impl Into<String>) -> Self {
        Self::create_send_message(to, MessageBody::text(content), ConversationType::Direct)
    }

    pub fn create_cmd_send_message(
        to: impl Into<String>,
        action: impl Into<String>,
        deliver_online_only: bool,
    ) -> Self {
        let mut msg = Self::create_send_message(
            to,
            MessageBody::cmd(action, deliver_online_only),
            ConversationType::Direct,
        );
        msg.deliver_online_only = deliver_online_only;
        msg
    }

    /// 排序时间：优先服务端时间，未知时退回本地时间
    pub fn sort_time(&self, by_server_time: bool) -> i64 {
        if by_server_time && self.server_time > 0 {
            self.server_time
        } else {
            self.local_time
        }
    }

    pub fn body_type(&self) -> MessageBodyType {
        self.body.body_type()
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.attributes.insert(key.into(), value);
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// 关键字匹配（大小写不敏感）
    pub fn matches_keyword(&self, keyword: &str, scope: MessageSearchScope) -> bool {
        if keyword.is_empty() {
            return true;
        }
        let needle = keyword.to_lowercase();
        let in_content = || {
            self.body
                .searchable_text()
                .map(|t| t.to_lowercase().contains(&needle))
                .unwrap_or(false)
        };
        let in_ext = || {
            self.attributes.values().any(|v| {
                v.as_search_text()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        };
        match scope {
            MessageSearchScope::Content => in_content(),
            MessageSearchScope::Ext => in_ext(),
            MessageSearchScope::All => in_content() || in_ext(),
        }
    }
}

/// 客户端生成的消息 ID
pub fn generate_msg_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_text_send_message() {
        let msg = Message::create_text_send_message("bob", "hello");
        assert_eq!(msg.conversation_id, "bob");
        assert_eq!(msg.to, "bob");
        assert_eq!(msg.status, MessageStatus::Create);
        assert_eq!(msg.direction, MessageDirection::Send);
        assert!(msg.is_read);
        assert_eq!(msg.body_type(), MessageBodyType::Text);
        assert!(!msg.msg_id.is_empty());
    }

    #[test]
    fn test_sort_time_prefers_server_time() {
        let mut msg = Message::create_text_send_message("bob", "hi");
        msg.local_time = 100;
        assert_eq!(msg.sort_time(true), 100);
        msg.server_time = 250;
        assert_eq!(msg.sort_time(true), 250);
        assert_eq!(msg.sort_time(false), 100);
    }

    #[test]
    fn test_message_json_shape() {
        let mut msg = Message::create_text_send_message("bob", "hi");
        msg.set_attribute("urgent", AttributeValue::Bool(true));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["body"]["type"], "text");
        assert_eq!(value["body"]["body"]["text"], "hi");
        assert_eq!(value["attributes"]["urgent"]["type"], "bool");

        let decoded: Message = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_minimal_message() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "msg_id": "m1",
            "conversation_id": "c1",
            "body": {"type": "cmd", "body": {"action": "typing"}}
        }))
        .unwrap();
        assert_eq!(msg.status, MessageStatus::Create);
        assert_eq!(msg.server_time, 0);
        assert_eq!(msg.body_type(), MessageBodyType::Cmd);
    }

    #[test]
    fn test_keyword_scope() {
        let mut msg = Message::create_text_send_message("bob", "Lunch at noon?");
        msg.set_attribute("tag", AttributeValue::String("work".into()));
        assert!(msg.matches_keyword("lunch", MessageSearchScope::Content));
        assert!(!msg.matches_keyword("work", MessageSearchScope::Content));
        assert!(msg.matches_keyword("work", MessageSearchScope::Ext));
        assert!(msg.matches_keyword("work", MessageSearchScope::All));
        assert!(!msg.matches_keyword("dinner", MessageSearchScope::All));
    }
}
