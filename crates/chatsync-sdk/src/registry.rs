//! 回调注册表
//!
//! 把异步请求的关联 ID 映射到调用方的完成回调，保证每个请求只被结束一次：
//! - `resolve` / `fail` 在锁内移除条目，释放锁之后再调用回调
//! - 重复或过期的结束通知直接忽略
//! - `shutdown` 与 `register` 共用同一把锁，关闭之后不会再有新请求挂入

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::callback::{CallBack, ProgressHandler, ValueCallBack};
use crate::error::{ChatSyncError, Result};
use crate::utils::now_millis;

type Completion = Box<dyn FnOnce(Result<Value>) + Send>;

/// 一个等待结束的请求
pub struct PendingRequest {
    method: String,
    complete: Completion,
    progress: Option<ProgressHandler>,
    created_at: i64,
}

impl PendingRequest {
    pub fn new<F>(method: impl Into<String>, complete: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        Self {
            method: method.into(),
            complete: Box::new(complete),
            progress: None,
            created_at: now_millis(),
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressHandler>) -> Self {
        self.progress = progress;
        self
    }

    /// 无返回值的请求：响应内容被忽略
    pub fn from_callback(method: impl Into<String>, callback: CallBack) -> Self {
        let progress = callback.progress_handler();
        Self::new(method, move |result| callback.complete(result.map(|_| ())))
            .with_progress(progress)
    }

    /// 带返回值的请求：先用 `decode` 解码响应，解码失败走错误回调
    pub fn from_value_callback<T, D>(
        method: impl Into<String>,
        decode: D,
        callback: ValueCallBack<T>,
    ) -> Self
    where
        T: Send + 'static,
        D: FnOnce(Value) -> Result<T> + Send + 'static,
    {
        let progress = callback.progress_handler();
        Self::new(method, move |result| callback.complete(result.and_then(decode)))
            .with_progress(progress)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// 结束该请求（消耗自身，因此只可能调用一次）
    pub fn complete(self, result: Result<Value>) {
        (self.complete)(result)
    }

    pub fn fail(self, error: ChatSyncError) {
        self.complete(Err(error))
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("has_progress", &self.progress.is_some())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// 注册被拒绝时把请求交还给调用方，由调用方以 `error` 结束它
#[derive(Debug)]
pub struct RejectedRequest {
    pub request: PendingRequest,
    pub error: ChatSyncError,
}

impl RejectedRequest {
    pub fn fail(self) {
        self.request.fail(self.error)
    }
}

/// 注册表统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub registered: u64,
    pub resolved: u64,
    pub failed: u64,
    /// 针对未知/已结束请求的重复通知
    pub stale: u64,
    /// 关闭时被统一失败的请求
    pub swept: u64,
}

struct RegistryInner {
    pending: HashMap<String, PendingRequest>,
    closed: bool,
    stats: RegistryStats,
}

pub struct CallbackRegistry {
    inner: Mutex<RegistryInner>,
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                pending: HashMap::new(),
                closed: false,
                stats: RegistryStats::default(),
            }),
        }
    }

    /// 挂起一个请求
    ///
    /// 注册表已关闭或关联 ID 重复时返回 `Err`，请求原样交还。
    pub fn register(
        &self,
        correlation_id: impl Into<String>,
        request: PendingRequest,
    ) -> std::result::Result<(), RejectedRequest> {
        let correlation_id = correlation_id.into();
        let mut inner = self.inner.lock();
        if inner.closed {
            debug!("Registry closed, rejecting {} ({})", correlation_id, request.method);
            return Err(RejectedRequest {
                request,
                error: ChatSyncError::ShuttingDown,
            });
        }
        if inner.pending.contains_key(&correlation_id) {
            warn!("Duplicate correlation id: {}", correlation_id);
            return Err(RejectedRequest {
                request,
                error: ChatSyncError::State(format!(
                    "duplicate correlation id: {}",
                    correlation_id
                )),
            });
        }
        debug!("Registered {} -> {}", correlation_id, request.method);
        inner.pending.insert(correlation_id, request);
        inner.stats.registered += 1;
        Ok(())
    }

    /// 成功结束；返回是否真的结束了一个挂起的请求
    pub fn resolve(&self, correlation_id: &str, payload: Value) -> bool {
        match self.take(correlation_id, true) {
            Some(request) => {
                request.complete(Ok(payload));
                true
            }
            None => false,
        }
    }

    /// 以传输层错误结束
    pub fn fail(&self, correlation_id: &str, code: i32, description: &str) -> bool {
        self.fail_with(correlation_id, ChatSyncError::transport(code, description))
    }

    /// 以任意错误结束
    pub fn fail_with(&self, correlation_id: &str, error: ChatSyncError) -> bool {
        match self.take(correlation_id, false) {
            Some(request) => {
                request.fail(error);
                true
            }
            None => false,
        }
    }

    /// 进度通知，可在结束前出现任意次
    pub fn progress(&self, correlation_id: &str, percent: i32) -> bool {
        let handler = {
            let inner = self.inner.lock();
            match inner.pending.get(correlation_id) {
                Some(request) => request.progress.clone(),
                None => {
                    debug!("Progress for unknown request {} ignored", correlation_id);
                    return false;
                }
            }
        };
        if let Some(handler) = handler {
            handler(percent.clamp(0, 100));
        }
        true
    }

    /// 关闭注册表并以 CLIENT_SHUTDOWN 结束全部挂起请求，返回被结束的数量
    pub fn shutdown(&self) -> usize {
        let drained: Vec<(String, PendingRequest)> = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            let drained: Vec<_> = inner.pending.drain().collect();
            inner.stats.swept += drained.len() as u64;
            drained
        };

        let count = drained.len();
        if count > 0 {
            info!("🛑 Failing {} pending request(s) on shutdown", count);
        }
        for (correlation_id, request) in drained {
            debug!("Shutdown sweep: {} ({})", correlation_id, request.method);
            request.fail(ChatSyncError::ShuttingDown);
        }
        count
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn contains(&self, correlation_id: &str) -> bool {
        self.inner.lock().pending.contains_key(correlation_id)
    }

    pub fn stats(&self) -> RegistryStats {
        self.inner.lock().stats.clone()
    }

    fn take(&self, correlation_id: &str, success: bool) -> Option<PendingRequest> {
        let mut inner = self.inner.lock();
        match inner.pending.remove(correlation_id) {
            Some(request) => {
                if success {
                    inner.stats.resolved += 1;
                } else {
                    inner.stats.failed += 1;
                }
                Some(request)
            }
            None => {
                inner.stats.stale += 1;
                debug!("Stale completion for {} ignored", correlation_id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_code;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_request(
        successes: Arc<AtomicUsize>,
        errors: Arc<AtomicUsize>,
        last_code: Arc<parking_lot::Mutex<Option<i32>>>,
    ) -> PendingRequest {
        PendingRequest::new("test.method", move |result| match result {
            Ok(_) => {
                successes.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                errors.fetch_add(1, Ordering::SeqCst);
                *last_code.lock() = Some(e.code());
            }
        })
    }

    #[test]
    fn test_resolve_fires_exactly_once() {
        let registry = CallbackRegistry::new();
        let ok = Arc::new(AtomicUsize::new(0));
        let err = Arc::new(AtomicUsize::new(0));
        let code = Arc::new(parking_lot::Mutex::new(None));
        registry
            .register("a", counting_request(ok.clone(), err.clone(), code.clone()))
            .unwrap();

        assert!(registry.resolve("a", json!({"x": 1})));
        assert!(!registry.resolve("a", json!({"x": 2})));
        assert!(!registry.fail("a", 500, "late failure"));

        assert_eq!(ok.load(Ordering::SeqCst), 1);
        assert_eq!(err.load(Ordering::SeqCst), 0);
        assert_eq!(registry.pending_count(), 0);
        let stats = registry.stats();
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.stale, 2);
    }

    #[test]
    fn test_fail_fires_exactly_once() {
        let registry = CallbackRegistry::new();
        let ok = Arc::new(AtomicUsize::new(0));
        let err = Arc::new(AtomicUsize::new(0));
        let code = Arc::new(parking_lot::Mutex::new(None));
        registry
            .register("b", counting_request(ok.clone(), err.clone(), code.clone()))
            .unwrap();

        assert!(registry.fail("b", 401, "unauthorized"));
        assert!(!registry.fail("b", 401, "unauthorized"));
        assert!(!registry.resolve("b", Value::Null));

        assert_eq!(ok.load(Ordering::SeqCst), 0);
        assert_eq!(err.load(Ordering::SeqCst), 1);
        assert_eq!(*code.lock(), Some(401));
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let registry = CallbackRegistry::new();
        assert!(!registry.resolve("nope", Value::Null));
        assert!(!registry.progress("nope", 50));
        assert_eq!(registry.stats().stale, 1);
    }

    #[test]
    fn test_progress_before_terminal() {
        let registry = CallbackRegistry::new();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let s = seen.clone();
        let done = Arc::new(AtomicUsize::new(0));
        let d = done.clone();
        let cb = CallBack::new()
            .on_progress(move |p| s.lock().push(p))
            .on_success(move || {
                d.fetch_add(1, Ordering::SeqCst);
            });
        registry
            .register("up", PendingRequest::from_callback("chat.send", cb))
            .unwrap();

        assert!(registry.progress("up", 10));
        assert!(registry.progress("up", 60));
        assert!(registry.progress("up", 150));
        assert!(registry.resolve("up", Value::Null));
        assert!(!registry.progress("up", 100));

        assert_eq!(*seen.lock(), vec![10, 60, 100]);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shutdown_fails_pending_once_and_blocks_late_resolve() {
        let registry = CallbackRegistry::new();
        let ok = Arc::new(AtomicUsize::new(0));
        let err = Arc::new(AtomicUsize::new(0));
        let code = Arc::new(parking_lot::Mutex::new(None));
        registry
            .register("x", counting_request(ok.clone(), err.clone(), code.clone()))
            .unwrap();

        assert_eq!(registry.shutdown(), 1);
        assert!(!registry.resolve("x", json!("late")));

        assert_eq!(ok.load(Ordering::SeqCst), 0);
        assert_eq!(err.load(Ordering::SeqCst), 1);
        assert_eq!(*code.lock(), Some(error_code::CLIENT_SHUTDOWN));
        assert!(registry.is_closed());
        assert_eq!(registry.stats().swept, 1);
    }

    #[test]
    fn test_register_after_shutdown_is_rejected() {
        let registry = CallbackRegistry::new();
        registry.shutdown();

        let err = Arc::new(AtomicUsize::new(0));
        let code = Arc::new(parking_lot::Mutex::new(None));
        let rejected = registry
            .register(
                "y",
                counting_request(Arc::new(AtomicUsize::new(0)), err.clone(), code.clone()),
            )
            .unwrap_err();
        assert_eq!(rejected.error, ChatSyncError::ShuttingDown);
        rejected.fail();

        assert_eq!(err.load(Ordering::SeqCst), 1);
        assert_eq!(*code.lock(), Some(error_code::CLIENT_SHUTDOWN));
        assert_eq!(registry.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = CallbackRegistry::new();
        registry
            .register("dup", PendingRequest::new("m", |_| {}))
            .unwrap();
        let rejected = registry
            .register("dup", PendingRequest::new("m", |_| {}))
            .unwrap_err();
        assert!(rejected.error.is_client_misuse());
        assert_eq!(registry.pending_count(), 1);
    }

    #[test]
    fn test_decode_failure_goes_to_error_handler() {
        let registry = CallbackRegistry::new();
        let got = Arc::new(parking_lot::Mutex::new(None));
        let g = got.clone();
        let cb = ValueCallBack::<u32>::new()
            .on_success(|_| panic!("should not decode"))
            .on_error(move |e| *g.lock() = Some(e.code()));
        registry
            .register(
                "d",
                PendingRequest::from_value_callback(
                    "user.count",
                    |v| serde_json::from_value::<u32>(v).map_err(Into::into),
                    cb,
                ),
            )
            .unwrap();
        registry.resolve("d", json!("not a number"));
        assert_eq!(*got.lock(), Some(error_code::DECODE_FAILED));
    }

    #[test]
    fn test_concurrent_duplicate_delivery() {
        let registry = Arc::new(CallbackRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        registry
            .register(
                "race",
                PendingRequest::new("m", move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let r = registry.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        r.resolve("race", Value::Null)
                    } else {
                        r.fail("race", 1, "dup")
                    }
                })
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
