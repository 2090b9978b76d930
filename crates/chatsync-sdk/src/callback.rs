//! 调用方回调
//!
//! 每个回调槽位（成功 / 失败 / 进度）都是独立可选的，不关心的槽位留空即可。

use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::{ChatSyncError, Result};

pub type ErrorHandler = Box<dyn FnOnce(ChatSyncError) + Send>;
pub type ProgressHandler = Arc<dyn Fn(i32) + Send + Sync>;

/// 无返回值操作的回调
#[derive(Default)]
pub struct CallBack {
    on_success: Option<Box<dyn FnOnce() + Send>>,
    on_error: Option<ErrorHandler>,
    on_progress: Option<ProgressHandler>,
}

impl CallBack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ChatSyncError) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// 桥接到 oneshot，供 async 调用方等待结果
    pub fn channel() -> (Self, oneshot::Receiver<Result<()>>) {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(parking_lot::Mutex::new(Some(tx)));
        let tx_err = tx.clone();
        let cb = Self::new()
            .on_success(move || {
                if let Some(tx) = tx.lock().take() {
                    let _ = tx.send(Ok(()));
                }
            })
            .on_error(move |e| {
                if let Some(tx) = tx_err.lock().take() {
                    let _ = tx.send(Err(e));
                }
            });
        (cb, rx)
    }

    pub(crate) fn progress_handler(&self) -> Option<ProgressHandler> {
        self.on_progress.clone()
    }

    /// 成功回调之前先执行 `f`（用于缓存副作用），调用方没设置成功回调时同样执行
    pub(crate) fn before_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = self.on_success.take();
        self.on_success = Some(Box::new(move || {
            f();
            if let Some(inner) = inner {
                inner();
            }
        }));
        self
    }

    pub(crate) fn complete(self, result: Result<()>) {
        match result {
            Ok(()) => {
                if let Some(f) = self.on_success {
                    f();
                }
            }
            Err(e) => {
                if let Some(f) = self.on_error {
                    f(e);
                }
            }
        }
    }
}

impl fmt::Debug for CallBack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallBack")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// 带返回值操作的回调
pub struct ValueCallBack<T> {
    on_success: Option<Box<dyn FnOnce(T) + Send>>,
    on_error: Option<ErrorHandler>,
    on_progress: Option<ProgressHandler>,
}

impl<T> Default for ValueCallBack<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
            on_progress: None,
        }
    }
}

impl<T: Send + 'static> ValueCallBack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(ChatSyncError) + Send + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// 桥接到 oneshot，供 async 调用方等待结果
    pub fn channel() -> (Self, oneshot::Receiver<Result<T>>) {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(parking_lot::Mutex::new(Some(tx)));
        let tx_err = tx.clone();
        let cb = Self::new()
            .on_success(move |value| {
                if let Some(tx) = tx.lock().take() {
                    let _ = tx.send(Ok(value));
                }
            })
            .on_error(move |e| {
                if let Some(tx) = tx_err.lock().take() {
                    let _ = tx.send(Err(e));
                }
            });
        (cb, rx)
    }

    pub(crate) fn progress_handler(&self) -> Option<ProgressHandler> {
        self.on_progress.clone()
    }

    /// 成功回调之前先拿结果执行 `f`
    pub(crate) fn before_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let inner = self.on_success.take();
        self.on_success = Some(Box::new(move |value| {
            f(&value);
            if let Some(inner) = inner {
                inner(value);
            }
        }));
        self
    }

    pub(crate) fn complete(self, result: Result<T>) {
        match result {
            Ok(value) => {
                if let Some(f) = self.on_success {
                    f(value);
                }
            }
            Err(e) => {
                if let Some(f) = self.on_error {
                    f(e);
                }
            }
        }
    }
}

impl<T> fmt::Debug for ValueCallBack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCallBack")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// 把 oneshot 接收端的结果展开；发送端被丢弃视为客户端已关闭
pub(crate) async fn await_result<T>(rx: oneshot::Receiver<Result<T>>) -> Result<T> {
    match rx.await {
        Ok(result) => result,
        Err(_) => Err(ChatSyncError::ShuttingDown),
    }
}
