//! 传输适配层
//!
//! SDK 只依赖 [`Transport`] 这个接缝：异步请求立即返回，结果稍后以
//! [`TransportEvent`] 的形式经 `ChatClient::handle_inbound` 送回。
//! 真正的协议（FFI、WebSocket、HTTP 长轮询）由宿主实现。

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{error_code, ChatSyncError, Result};
use crate::events::EventCategory;

/// 传输协作方
pub trait Transport: Send + Sync {
    /// 发出一个异步请求，不等待结果
    ///
    /// 同步返回的错误会被转交给该请求的错误回调，不会抛给门面调用方。
    fn call(&self, correlation_id: &str, method: &str, params: Value) -> Result<()>;

    /// 同步读取传输层持有的本地状态
    fn call_sync(&self, method: &str, params: Value) -> Result<Value>;
}

/// 传输层送回的入站事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportEvent {
    /// 请求成功
    Response {
        correlation_id: String,
        #[serde(default)]
        payload: Value,
    },
    /// 请求失败
    Failure {
        correlation_id: String,
        code: i32,
        #[serde(default)]
        description: String,
    },
    /// 请求进度（0-100）
    Progress { correlation_id: String, percent: i32 },
    /// 服务端主动推送，交给事件分发器
    Push {
        category: EventCategory,
        event: String,
        #[serde(default)]
        payload: Value,
    },
}

impl TransportEvent {
    /// 从宿主送来的 JSON 文本解析
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            TransportEvent::Response { correlation_id, .. }
            | TransportEvent::Failure { correlation_id, .. }
            | TransportEvent::Progress { correlation_id, .. } => Some(correlation_id),
            TransportEvent::Push { .. } => None,
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, TransportEvent::Push { .. })
    }
}

/// 发往宿主的出站请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundRequest {
    pub correlation_id: String,
    pub method: String,
    pub params: Value,
}

pub type SyncHandler = Arc<dyn Fn(&str, Value) -> Result<Value> + Send + Sync>;

/// 基于 tokio 通道的传输实现
///
/// 出站请求写入无界通道，由宿主的任务消费后把结果喂回 `ChatClient::handle_inbound`；
/// 同步读取交给可替换的处理函数。
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<OutboundRequest>,
    sync_handler: RwLock<Option<SyncHandler>>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                sync_handler: RwLock::new(None),
            },
            receiver,
        )
    }

    pub fn with_sync_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&str, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.set_sync_handler(handler);
        self
    }

    pub fn set_sync_handler<F>(&self, handler: F)
    where
        F: Fn(&str, Value) -> Result<Value> + Send + Sync + 'static,
    {
        *self.sync_handler.write() = Some(Arc::new(handler));
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Transport for ChannelTransport {
    fn call(&self, correlation_id: &str, method: &str, params: Value) -> Result<()> {
        debug!("➡️ {} [{}]", method, correlation_id);
        self.sender
            .send(OutboundRequest {
                correlation_id: correlation_id.to_string(),
                method: method.to_string(),
                params,
            })
            .map_err(|_| {
                warn!("Outbound channel closed, dropping {}", method);
                ChatSyncError::transport(error_code::TRANSPORT_CLOSED, "transport channel closed")
            })
    }

    fn call_sync(&self, method: &str, params: Value) -> Result<Value> {
        let handler = self.sync_handler.read().clone();
        match handler {
            Some(handler) => handler(method, params),
            None => Err(ChatSyncError::State(format!(
                "no sync handler installed for {}",
                method
            ))),
        }
    }
}

impl fmt::Debug for ChannelTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelTransport")
            .field("closed", &self.sender.is_closed())
            .field("has_sync_handler", &self.sync_handler.read().is_some())
            .finish()
    }
}
