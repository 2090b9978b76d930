//! 请求发起
//!
//! 生成关联 ID → 挂入注册表 → 交给传输层。调用线程不等待网络结果。

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::callback::{CallBack, ValueCallBack};
use crate::error::Result;
use crate::registry::{CallbackRegistry, PendingRequest};
use crate::transport::Transport;

/// 生成关联 ID
pub fn next_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 把 JSON 响应解码为 `T`
pub fn decode_json<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

#[derive(Clone)]
pub struct Invoker {
    transport: Arc<dyn Transport>,
    registry: Arc<CallbackRegistry>,
}

impl Invoker {
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<CallbackRegistry>) -> Self {
        Self {
            transport,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// 发出请求，返回关联 ID
    ///
    /// 注册失败或传输层同步报错时，错误都交给请求自己的错误回调。
    pub fn invoke(&self, method: &str, params: Value, request: PendingRequest) -> String {
        let correlation_id = next_correlation_id();
        if let Err(rejected) = self.registry.register(correlation_id.clone(), request) {
            debug!("Request {} rejected: {}", method, rejected.error);
            rejected.fail();
            return correlation_id;
        }
        if let Err(e) = self.transport.call(&correlation_id, method, params) {
            warn!("Transport refused {} [{}]: {}", method, correlation_id, e);
            self.registry.fail_with(&correlation_id, e);
        }
        correlation_id
    }

    /// 无返回值请求
    pub fn invoke_unit(&self, method: &str, params: Value, callback: CallBack) -> String {
        self.invoke(method, params, PendingRequest::from_callback(method, callback))
    }

    /// 带返回值请求，响应按 `T` 的 serde 定义解码
    pub fn invoke_value<T>(&self, method: &str, params: Value, callback: ValueCallBack<T>) -> String
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.invoke(
            method,
            params,
            PendingRequest::from_value_callback(method, decode_json::<T>, callback),
        )
    }

    /// 同步读取
    pub fn call_sync<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let value = self.transport.call_sync(method, params)?;
        decode_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_code, ChatSyncError};
    use crate::transport::test_helpers::ScriptedTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn test_invoke_registers_and_calls() {
        let transport = ScriptedTransport::new();
        let registry = Arc::new(CallbackRegistry::new());
        let invoker = Invoker::new(transport.clone(), registry.clone());

        let got = Arc::new(AtomicI32::new(0));
        let g = got.clone();
        let id = invoker.invoke_value(
            "user.count",
            json!({}),
            ValueCallBack::new().on_success(move |v: i32| g.store(v, Ordering::SeqCst)),
        );
        assert_eq!(transport.last_call().unwrap().correlation_id, id);
        assert!(registry.contains(&id));

        registry.resolve(&id, json!(7));
        assert_eq!(got.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_sync_transport_error_goes_to_error_handler() {
        let transport = ScriptedTransport::new();
        transport.fail_calls_with(ChatSyncError::transport(error_code::TRANSPORT_CLOSED, "closed"));
        let registry = Arc::new(CallbackRegistry::new());
        let invoker = Invoker::new(transport.clone(), registry.clone());

        let code = Arc::new(AtomicI32::new(0));
        let c = code.clone();
        invoker.invoke_unit(
            "chat.ping",
            Value::Null,
            CallBack::new().on_error(move |e| c.store(e.code(), Ordering::SeqCst)),
        );
        assert_eq!(code.load(Ordering::SeqCst), error_code::TRANSPORT_CLOSED);
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_invoke_after_shutdown_fails_with_shutdown() {
        let transport = ScriptedTransport::new();
        let registry = Arc::new(CallbackRegistry::new());
        let invoker = Invoker::new(transport.clone(), registry.clone());
        registry.shutdown();

        let code = Arc::new(AtomicI32::new(0));
        let c = code.clone();
        invoker.invoke_unit(
            "chat.ping",
            Value::Null,
            CallBack::new().on_error(move |e| c.store(e.code(), Ordering::SeqCst)),
        );
        assert_eq!(code.load(Ordering::SeqCst), error_code::CLIENT_SHUTDOWN);
        assert!(transport.calls().is_empty());
    }
}
