use serde::{Deserialize, Serialize};

/// SDK 内置错误码
///
/// 传输层错误码由服务端/传输协作方原样透传，这里只定义客户端自身产生的错误码。
pub mod error_code {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 传输通道已关闭，请求无法发出
    pub const TRANSPORT_CLOSED: i32 = 2;
    /// 参数不合法（请求未发出即被拒绝）
    pub const INVALID_PARAM: i32 = 101;
    /// 本地缓存状态不满足操作前提
    pub const INVALID_STATE: i32 = 102;
    /// 资源不存在
    pub const NOT_FOUND: i32 = 103;
    /// 响应数据无法解码
    pub const DECODE_FAILED: i32 = 104;
    /// 客户端正在关闭，所有未完成请求统一以此错误码结束
    pub const CLIENT_SHUTDOWN: i32 = 199;
}

/// 错误分类
///
/// 回调方通过它区分"服务端拒绝"与"客户端误用"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 连接/鉴权/服务端失败
    Transport,
    /// 调用参数越界，请求未发出
    Validation,
    /// 本地缓存不变量被破坏
    State,
    /// 客户端关闭
    Shutdown,
    /// 边界处的数据解码失败
    Decode,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatSyncError {
    #[error("Transport error [{code}]: {description}")]
    Transport { code: i32, description: String },

    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Client is shutting down")]
    ShuttingDown,
}

impl ChatSyncError {
    /// 由传输层的 (code, description) 构造
    pub fn transport(code: i32, description: impl Into<String>) -> Self {
        ChatSyncError::Transport {
            code,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatSyncError::Transport { .. } => ErrorKind::Transport,
            ChatSyncError::Validation(_) => ErrorKind::Validation,
            ChatSyncError::State(_) | ChatSyncError::NotFound(_) => ErrorKind::State,
            ChatSyncError::Decode(_) => ErrorKind::Decode,
            ChatSyncError::ShuttingDown => ErrorKind::Shutdown,
        }
    }

    /// 整数错误码；传输层错误返回服务端原始错误码
    pub fn code(&self) -> i32 {
        match self {
            ChatSyncError::Transport { code, .. } => *code,
            ChatSyncError::Validation(_) => error_code::INVALID_PARAM,
            ChatSyncError::State(_) => error_code::INVALID_STATE,
            ChatSyncError::NotFound(_) => error_code::NOT_FOUND,
            ChatSyncError::Decode(_) => error_code::DECODE_FAILED,
            ChatSyncError::ShuttingDown => error_code::CLIENT_SHUTDOWN,
        }
    }

    /// 错误描述（不含错误码前缀）
    pub fn description(&self) -> String {
        match self {
            ChatSyncError::Transport { description, .. } => description.clone(),
            ChatSyncError::Validation(msg)
            | ChatSyncError::State(msg)
            | ChatSyncError::NotFound(msg)
            | ChatSyncError::Decode(msg) => msg.clone(),
            ChatSyncError::ShuttingDown => "client shutting down".to_string(),
        }
    }

    /// 是否为服务端/传输层错误
    pub fn is_transport_error(&self) -> bool {
        matches!(self, ChatSyncError::Transport { .. })
    }

    /// 是否为客户端误用（参数或本地状态）
    pub fn is_client_misuse(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::State)
    }
}

impl From<serde_json::Error> for ChatSyncError {
    fn from(error: serde_json::Error) -> Self {
        ChatSyncError::Decode(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_and_code() {
        let e = ChatSyncError::transport(508, "server busy");
        assert_eq!(e.kind(), ErrorKind::Transport);
        assert_eq!(e.code(), 508);
        assert_eq!(e.description(), "server busy");
        assert!(e.is_transport_error());
        assert!(!e.is_client_misuse());

        let e = ChatSyncError::Validation("page_size out of range".into());
        assert_eq!(e.code(), error_code::INVALID_PARAM);
        assert!(e.is_client_misuse());

        assert_eq!(ChatSyncError::ShuttingDown.code(), error_code::CLIENT_SHUTDOWN);
        assert_eq!(ChatSyncError::ShuttingDown.kind(), ErrorKind::Shutdown);
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err = serde_json::from_str::<u32>("\"abc\"").unwrap_err();
        let e: ChatSyncError = err.into();
        assert_eq!(e.kind(), ErrorKind::Decode);
        assert_eq!(e.code(), error_code::DECODE_FAILED);
    }

    #[test]
    fn test_display() {
        let e = ChatSyncError::transport(2, "network unreachable");
        assert_eq!(e.to_string(), "Transport error [2]: network unreachable");
    }
}
