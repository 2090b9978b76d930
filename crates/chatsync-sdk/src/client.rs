//! 客户端上下文
//!
//! [`ChatClient`] 持有一组协作对象（传输、注册表、缓存、分发器、分页引擎），
//! 各个管理器门面都从它取得。没有全局单例，同一进程可以存在多个互不干扰的客户端。
//!
//! 入站路径只有一个：宿主把传输层送回的 [`TransportEvent`] 交给 `handle_inbound`。

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::callback::{await_result, CallBack, ValueCallBack};
use crate::config::ChatSyncConfig;
use crate::error::Result;
use crate::events::{
    ChatEvent, ConnectionEvent, EventCategory, EventDispatcher, EventStats, GroupEvent,
    MultiDeviceEvent, PresenceEvent, PushEvent, RoomEvent, ThreadEvent,
};
use crate::invoker::Invoker;
use crate::listener::AnyListener;
use crate::managers::{
    ChatManager, ContactManager, GroupManager, PresenceManager, RoomManager, ThreadManager,
    UserInfoManager,
};
use crate::methods;
use crate::model::{ConversationKey, ConversationType, MultiDevicesOperation, UserInfo};
use crate::pagination::{CursorPager, PagedResource, PaginationEngine};
use crate::registry::{CallbackRegistry, RegistryStats};
use crate::storage::{ConversationCache, PresenceCache};
use crate::transport::{Transport, TransportEvent};
use crate::version;

/// 当前登录会话
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: String,
    pub token: String,
    pub login_time: DateTime<Utc>,
}

/// 各管理器共享的内部状态
pub(crate) struct ClientCore {
    pub(crate) config: ChatSyncConfig,
    pub(crate) invoker: Invoker,
    pub(crate) cache: Arc<ConversationCache>,
    pub(crate) presence: Arc<PresenceCache>,
    pub(crate) user_infos: Arc<RwLock<HashMap<String, UserInfo>>>,
    pub(crate) dispatcher: EventDispatcher,
    pub(crate) pagination: PaginationEngine,
    session: Arc<RwLock<Option<UserSession>>>,
    connected: Arc<AtomicBool>,
}

impl ClientCore {
    pub(crate) fn registry(&self) -> &Arc<CallbackRegistry> {
        self.invoker.registry()
    }

    /// 离开群组/聊天室后按配置清理本地会话
    pub(crate) fn drop_conversation_on_exit(&self, key: &ConversationKey) {
        let delete = match key.conv_type {
            ConversationType::Group => self.config.delete_messages_as_exit_group,
            ConversationType::Room => self.config.delete_messages_as_exit_room,
            ConversationType::Direct => false,
        };
        if delete && self.cache.delete_conversation(key, true) {
            debug!("Removed local conversation {} after exit", key);
        }
    }

    /// 推送对缓存的副作用，先于监听器执行
    fn apply_push(&self, event: &PushEvent) {
        match event {
            PushEvent::Connection(e) => self.apply_connection(e),
            PushEvent::Chat(e) => self.apply_chat(e),
            PushEvent::Group(GroupEvent::UserRemoved { group_id, .. })
            | PushEvent::Group(GroupEvent::GroupDestroyed { group_id, .. }) => {
                self.drop_conversation_on_exit(&ConversationKey::group(group_id.as_str()));
            }
            PushEvent::Room(RoomEvent::RemovedFromRoom { room_id, .. })
            | PushEvent::Room(RoomEvent::Destroyed { room_id, .. }) => {
                self.drop_conversation_on_exit(&ConversationKey::room(room_id.as_str()));
            }
            PushEvent::Presence(PresenceEvent::PresenceUpdated(list)) => self.presence.update(list),
            PushEvent::Thread(ThreadEvent::ThreadDestroyed(e)) => {
                self.cache
                    .delete_conversation(&ConversationKey::thread(e.thread.thread_id.as_str()), true);
            }
            PushEvent::MultiDevice(MultiDeviceEvent::ConversationEvent {
                operation,
                conversation_id,
                conv_type,
            }) => {
                let key = ConversationKey::new(conversation_id.as_str(), *conv_type);
                match operation {
                    MultiDevicesOperation::ConversationPinned => {
                        self.cache.get_or_create(&key, true);
                        self.cache.pin(&key, true);
                    }
                    MultiDevicesOperation::ConversationUnpinned => {
                        self.cache.pin(&key, false);
                    }
                    MultiDevicesOperation::ConversationDeleted => {
                        self.cache.delete_conversation(&key, true);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn apply_connection(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Connected => {
                self.connected.store(true, Ordering::SeqCst);
                info!("✅ Connected");
            }
            ConnectionEvent::Disconnected => {
                self.connected.store(false, Ordering::SeqCst);
                warn!("Disconnected");
            }
            ConnectionEvent::TokenWillExpire => {}
            other => {
                // 其余连接事件都意味着当前会话失效
                self.connected.store(false, Ordering::SeqCst);
                self.session.write().take();
                warn!("Session ended by server: {:?}", other);
            }
        }
    }

    fn apply_chat(&self, event: &ChatEvent) {
        match event {
            ChatEvent::MessagesReceived(messages) => {
                for message in messages {
                    let key = ConversationCache::key_of(message);
                    self.cache.get_or_create(&key, true);
                    self.cache.insert_message(&key, message.clone());
                }
            }
            ChatEvent::MessagesRead(messages) => {
                let ids: Vec<String> = messages.iter().map(|m| m.msg_id.clone()).collect();
                self.cache.apply_read_acks(&ids);
            }
            ChatEvent::MessagesDelivered(messages) => {
                let ids: Vec<String> = messages.iter().map(|m| m.msg_id.clone()).collect();
                self.cache.apply_delivery_acks(&ids);
            }
            ChatEvent::MessagesRecalled(recalls) => {
                let ids: Vec<String> = recalls.iter().map(|r| r.recall_message_id.clone()).collect();
                self.cache.remove_messages(&ids);
            }
            ChatEvent::ConversationRead { from, .. } => {
                self.cache
                    .apply_conversation_read(&ConversationKey::direct(from.as_str()));
            }
            ChatEvent::MessageContentChanged { message, .. } => {
                self.cache.replace_body(&message.msg_id, message.body.clone());
            }
            _ => {}
        }
    }
}

/// 聊天 SDK 客户端
#[derive(Clone)]
pub struct ChatClient {
    core: Arc<ClientCore>,
}

impl ChatClient {
    /// 创建客户端；配置不合法时返回 `Validation` 错误
    pub fn new(config: ChatSyncConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(CallbackRegistry::new());
        let invoker = Invoker::new(transport, registry);
        let core = ClientCore {
            cache: Arc::new(ConversationCache::new(&config)),
            presence: Arc::new(PresenceCache::new(config.presence_cache.clone())),
            user_infos: Arc::new(RwLock::new(HashMap::new())),
            dispatcher: EventDispatcher::new(config.event_buffer_size),
            pagination: PaginationEngine::new(invoker.clone()),
            invoker,
            session: Arc::new(RwLock::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            config,
        };
        info!("🚀 ChatClient created (app_key={})", core.config.app_key);
        Ok(Self {
            core: Arc::new(core),
        })
    }

    pub fn config(&self) -> &ChatSyncConfig {
        &self.core.config
    }

    // ========== 入站 ==========

    /// 处理传输层送回的一条事件
    ///
    /// 响应、失败、进度交给注册表；推送先更新缓存再分发给监听器。
    /// 推送解码失败时返回 `Decode` 错误，其余情况总是成功。
    pub fn handle_inbound(&self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::Response {
                correlation_id,
                payload,
            } => {
                self.core.registry().resolve(&correlation_id, payload);
            }
            TransportEvent::Failure {
                correlation_id,
                code,
                description,
            } => {
                self.core.registry().fail(&correlation_id, code, &description);
            }
            TransportEvent::Progress {
                correlation_id,
                percent,
            } => {
                self.core.registry().progress(&correlation_id, percent);
            }
            TransportEvent::Push {
                category,
                event,
                payload,
            } => {
                self.handle_push(category, &event, payload)?;
            }
        }
        Ok(())
    }

    /// 从 JSON 文本处理入站事件
    pub fn handle_inbound_json(&self, text: &str) -> Result<()> {
        self.handle_inbound(TransportEvent::from_json(text)?)
    }

    /// 解码推送 → 更新缓存 → 通知监听器，返回被通知的监听器数量
    pub fn handle_push(&self, category: EventCategory, discriminant: &str, payload: Value) -> Result<usize> {
        let event = match PushEvent::decode(category, discriminant, payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping undecodable {} push '{}': {}", category, discriminant, e);
                self.core.dispatcher.record_decode_failure();
                return Err(e);
            }
        };
        self.core.apply_push(&event);
        Ok(self.core.dispatcher.dispatch_event(event))
    }

    // ========== 生命周期 ==========

    /// 使用 token 登录
    pub fn login_with_token(&self, user_id: &str, token: &str, callback: CallBack) {
        let session = self.core.session.clone();
        let connected = self.core.connected.clone();
        let new_session = UserSession {
            user_id: user_id.to_string(),
            token: token.to_string(),
            login_time: Utc::now(),
        };
        let callback = callback.before_success(move || {
            info!("✅ Logged in as {}", new_session.user_id);
            *session.write() = Some(new_session);
            connected.store(true, Ordering::SeqCst);
        });
        self.core.invoker.invoke_unit(
            methods::LOGIN,
            json!({
                "user_id": user_id,
                "token": token,
                "app_key": self.core.config.app_key,
                "user_agent": version::user_agent(),
            }),
            callback,
        );
    }

    pub async fn login(&self, user_id: &str, token: &str) -> Result<()> {
        let (callback, rx) = CallBack::channel();
        self.login_with_token(user_id, token, callback);
        await_result(rx).await
    }

    /// 登出；成功后清空本地缓存
    pub fn logout(&self, unbind_device_token: bool, callback: CallBack) {
        let core = self.core.clone();
        let callback = callback.before_success(move || {
            core.session.write().take();
            core.connected.store(false, Ordering::SeqCst);
            core.cache.clear();
            core.presence.clear();
            core.user_infos.write().clear();
            info!("Logged out");
        });
        self.core.invoker.invoke_unit(
            methods::LOGOUT,
            json!({ "unbind_device_token": unbind_device_token }),
            callback,
        );
    }

    /// 当前登录用户；本地没有会话时向传输层同步查询
    pub fn current_user(&self) -> Option<String> {
        if let Some(session) = self.core.session.read().as_ref() {
            return Some(session.user_id.clone());
        }
        match self.core.invoker.call_sync::<Option<String>>(methods::CURRENT_USER, Value::Null) {
            Ok(user) => user.filter(|u| !u.is_empty()),
            Err(e) => {
                debug!("current_user lookup failed: {}", e);
                None
            }
        }
    }

    pub fn session(&self) -> Option<UserSession> {
        self.core.session.read().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.core.connected.load(Ordering::SeqCst)
    }

    pub fn is_logged_in(&self) -> bool {
        self.core.session.read().is_some()
    }

    /// 关闭客户端：所有未完成请求以 `CLIENT_SHUTDOWN` 失败，之后的请求立即失败
    pub fn shutdown(&self) -> usize {
        let drained = self.core.registry().shutdown();
        self.core.connected.store(false, Ordering::SeqCst);
        info!("🛑 ChatClient shut down, {} pending requests failed", drained);
        drained
    }

    pub fn is_shut_down(&self) -> bool {
        self.core.registry().is_closed()
    }

    // ========== 监听器 ==========

    pub fn add_listener(&self, listener: AnyListener) -> bool {
        self.core.dispatcher.subscribe(listener)
    }

    pub fn remove_listener(&self, listener: &AnyListener) -> bool {
        self.core.dispatcher.unsubscribe(listener)
    }

    pub fn remove_all_listeners(&self) {
        self.core.dispatcher.clear_listeners();
    }

    /// 订阅全部推送事件的流
    pub fn subscribe_events(&self) -> broadcast::Receiver<PushEvent> {
        self.core.dispatcher.subscribe_stream()
    }

    // ========== 通用请求 ==========

    /// 发出任意方法的请求并等待结果
    pub async fn request<T>(&self, method: &str, params: Value) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (callback, rx) = ValueCallBack::channel();
        self.core.invoker.invoke_value(method, params, callback);
        await_result(rx).await
    }

    // ========== 管理器 ==========

    pub fn chat_manager(&self) -> ChatManager {
        ChatManager::new(self.core.clone())
    }

    pub fn contact_manager(&self) -> ContactManager {
        ContactManager::new(self.core.clone())
    }

    pub fn group_manager(&self) -> GroupManager {
        GroupManager::new(self.core.clone())
    }

    pub fn room_manager(&self) -> RoomManager {
        RoomManager::new(self.core.clone())
    }

    pub fn presence_manager(&self) -> PresenceManager {
        PresenceManager::new(self.core.clone())
    }

    pub fn thread_manager(&self) -> ThreadManager {
        ThreadManager::new(self.core.clone())
    }

    pub fn user_info_manager(&self) -> UserInfoManager {
        UserInfoManager::new(self.core.clone())
    }

    // ========== 状态 ==========

    pub fn cache(&self) -> &Arc<ConversationCache> {
        &self.core.cache
    }

    pub fn pagination(&self) -> &PaginationEngine {
        &self.core.pagination
    }

    /// 按配置的 `default_page_size` 创建拉取器，超出资源上限时截断到上限
    pub fn default_pager<T, D>(
        &self,
        resource: PagedResource,
        seed: impl Into<String>,
        decode: D,
    ) -> Result<CursorPager<T>>
    where
        T: Send + 'static,
        D: Fn(Value) -> Result<T> + Send + Sync + 'static,
    {
        let range = resource.page_size_range();
        let page_size = self
            .core
            .config
            .default_page_size
            .clamp(*range.start(), *range.end());
        self.core.pagination.pager(resource, seed, page_size, decode)
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.core.registry().stats()
    }

    pub fn pending_request_count(&self) -> usize {
        self.core.registry().pending_count()
    }

    pub fn event_stats(&self) -> EventStats {
        self.core.dispatcher.stats()
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("app_key", &self.core.config.app_key)
            .field("connected", &self.is_connected())
            .field("pending", &self.pending_request_count())
            .finish()
    }
}

#[cfg(test)]
impl ChatClient {
    pub(crate) fn core_registry_for_tests(&self) -> Arc<CallbackRegistry> {
        self.core.registry().clone()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::error::{error_code, ChatSyncError};
    use crate::listener::{ChatListener, ConnectionListener};
    use crate::model::{Message, MessageStatus};
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn incoming(id: &str, from: &str, server_time: i64) -> Value {
        json!({
            "msg_id": id,
            "conversation_id": from,
            "from": from,
            "to": "me",
            "chat_type": "direct",
            "direction": "receive",
            "status": "success",
            "server_time": server_time,
            "body": {"type": "text", "body": {"text": "hello"}}
        })
    }

    #[test]
    fn test_invalid_config_rejected() {
        let transport = crate::transport::test_helpers::ScriptedTransport::new();
        let err = ChatClient::new(ChatSyncConfig::default(), transport).unwrap_err();
        assert!(matches!(err, ChatSyncError::Validation(_)));
    }

    #[test]
    fn test_inbound_response_routes_to_registry() {
        let (client, transport) = scripted_client();
        let user = Arc::new(Mutex::new(None));
        let u = user.clone();
        client.login_with_token(
            "alice",
            "token",
            CallBack::new().on_success(move || *u.lock() = Some("ok")),
        );
        assert_eq!(client.pending_request_count(), 1);
        assert!(!client.is_logged_in());

        respond_last(&client, &transport, Value::Null);
        assert_eq!(*user.lock(), Some("ok"));
        assert_eq!(client.current_user().as_deref(), Some("alice"));
        assert!(client.is_connected());
        assert_eq!(client.pending_request_count(), 0);

        // 重复的响应被忽略
        respond_last(&client, &transport, Value::Null);
        assert_eq!(client.registry_stats().stale, 1);
    }

    #[test]
    fn test_failure_carries_code() {
        let (client, transport) = scripted_client();
        let code = Arc::new(AtomicUsize::new(0));
        let c = code.clone();
        client.login_with_token(
            "alice",
            "bad",
            CallBack::new().on_error(move |e| c.store(e.code() as usize, Ordering::SeqCst)),
        );
        fail_last(&client, &transport, 202);
        assert_eq!(code.load(Ordering::SeqCst), 202);
        assert!(!client.is_logged_in());
    }

    #[test]
    fn test_current_user_falls_back_to_sync_call() {
        let (client, transport) = scripted_client();
        assert_eq!(client.current_user(), None);
        transport.set_sync_reply(methods::CURRENT_USER, json!("bob"));
        assert_eq!(client.current_user().as_deref(), Some("bob"));
    }

    #[derive(Default)]
    struct Seen {
        received: Mutex<Vec<String>>,
        unread_at_callback: Mutex<Vec<usize>>,
        cache: Mutex<Option<Arc<ConversationCache>>>,
    }

    impl ChatListener for Seen {
        fn on_messages_received(&self, messages: &[Message]) {
            self.received
                .lock()
                .extend(messages.iter().map(|m| m.msg_id.clone()));
            if let Some(cache) = self.cache.lock().as_ref() {
                self.unread_at_callback
                    .lock()
                    .push(cache.unread_count(&ConversationKey::direct("bob")));
            }
        }
    }

    #[test]
    fn test_push_updates_cache_before_listeners() {
        let (client, _transport) = scripted_client();
        let seen = Arc::new(Seen::default());
        *seen.cache.lock() = Some(client.cache().clone());
        assert!(client.add_listener(AnyListener::Chat(seen.clone())));

        let notified = client
            .handle_push(
                EventCategory::Chat,
                "messages_received",
                json!([incoming("m1", "bob", 100), incoming("m2", "bob", 200)]),
            )
            .unwrap();
        assert_eq!(notified, 1);
        assert_eq!(*seen.received.lock(), vec!["m1", "m2"]);
        assert_eq!(*seen.unread_at_callback.lock(), vec![2]);

        let key = ConversationKey::direct("bob");
        assert_eq!(client.cache().unread_count(&key), 2);
        assert_eq!(client.cache().last_message(&key).unwrap().msg_id, "m2");
    }

    #[test]
    fn test_push_recall_and_read_acks() {
        let (client, _transport) = scripted_client();
        client
            .handle_push(
                EventCategory::Chat,
                "messages_received",
                json!([incoming("m1", "bob", 100), incoming("m2", "bob", 200)]),
            )
            .unwrap();
        client
            .handle_push(
                EventCategory::Chat,
                "messages_recalled",
                json!([{"recall_message_id": "m1", "conversation_id": "bob"}]),
            )
            .unwrap();
        assert!(client.cache().load_message("m1").is_none());
        assert!(client.cache().load_message("m2").is_some());

        let key = ConversationKey::direct("bob");
        let sent = Message::create_text_send_message("bob", "hi");
        client.cache().insert_message(&key, sent.clone());

        let json = r#"{"kind":"push","category":"chat","event":"conversation_read","payload":{"from":"bob","to":"me"}}"#;
        client.handle_inbound_json(json).unwrap();
        assert!(client.cache().load_message(&sent.msg_id).unwrap().has_read_ack);
        assert!(!client.cache().load_message("m2").unwrap().has_read_ack);
    }

    #[test]
    fn test_undecodable_push_is_error_and_not_dispatched() {
        let (client, _transport) = scripted_client();
        let err = client
            .handle_push(EventCategory::Chat, "messages_received", json!("garbage"))
            .unwrap_err();
        assert!(matches!(err, ChatSyncError::Decode(_)));
        assert_eq!(client.event_stats().total_events, 0);
        assert_eq!(client.event_stats().decode_failures, 1);

        let json = r#"{"kind":"push","category":"chat","event":"no_such_event","payload":null}"#;
        assert!(client.handle_inbound_json(json).is_err());
        assert_eq!(client.event_stats().decode_failures, 2);
    }

    #[test]
    fn test_redelivered_push_keeps_read_state() {
        let (client, _transport) = scripted_client();
        let key = ConversationKey::direct("bob");
        let push = || json!([incoming("m1", "bob", 100)]);

        client
            .handle_push(EventCategory::Chat, "messages_received", push())
            .unwrap();
        assert_eq!(client.cache().unread_count(&key), 1);
        assert!(client.cache().mark_message_as_read(&key, "m1"));

        client
            .handle_push(EventCategory::Chat, "messages_received", push())
            .unwrap();
        assert_eq!(client.cache().unread_count(&key), 0);
        let stored = client.cache().load_message("m1").unwrap();
        assert!(stored.is_read);
        assert_eq!(stored.status, MessageStatus::Success);
        assert_eq!(client.cache().stats().message_count, 1);
    }

    #[test]
    fn test_group_removal_respects_config() {
        let (client, _transport) = scripted_client();
        let key = ConversationKey::group("g1");
        client.cache().get_or_create(&key, true);
        client
            .handle_push(
                EventCategory::Group,
                "user_removed",
                json!({"group_id": "g1", "group_name": "team"}),
            )
            .unwrap();
        assert!(client.cache().conversation(&key).is_none());

        let (client, _transport) =
            scripted_client_with(ChatSyncConfig::builder().app_key("k").delete_messages_as_exit_group(false));
        client.cache().get_or_create(&key, true);
        client
            .handle_push(EventCategory::Group, "group_destroyed", json!({"group_id": "g1"}))
            .unwrap();
        assert!(client.cache().conversation(&key).is_some());
    }

    struct Kicked(AtomicUsize);

    impl ConnectionListener for Kicked {
        fn on_kicked_by_other_device(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_connection_events_update_state() {
        let (client, transport) = scripted_client();
        client.login_with_token("alice", "t", CallBack::new());
        respond_last(&client, &transport, Value::Null);
        assert!(client.is_connected());

        let kicked = Arc::new(Kicked(AtomicUsize::new(0)));
        client.add_listener(AnyListener::Connection(kicked.clone()));
        client
            .handle_push(EventCategory::Connection, "kicked_by_other_device", Value::Null)
            .unwrap();
        assert_eq!(kicked.0.load(Ordering::SeqCst), 1);
        assert!(!client.is_connected());
        assert!(client.session().is_none());
    }

    #[test]
    fn test_shutdown_fails_pending_and_rejects_new() {
        let (client, transport) = scripted_client();
        let codes = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let c = codes.clone();
            client.login_with_token(
                "alice",
                "t",
                CallBack::new().on_error(move |e| c.lock().push(e.code())),
            );
        }
        assert_eq!(client.shutdown(), 3);
        assert_eq!(*codes.lock(), vec![error_code::CLIENT_SHUTDOWN; 3]);

        let c = codes.clone();
        client.login_with_token(
            "alice",
            "t",
            CallBack::new().on_error(move |e| c.lock().push(e.code())),
        );
        assert_eq!(codes.lock().len(), 4);
        assert_eq!(transport.calls().len(), 3);
        assert!(client.is_shut_down());
    }

    #[tokio::test]
    async fn test_request_bridge() {
        let (client, transport) = scripted_client();
        let registry = client.core_registry_for_tests();
        transport.reply_with(&registry, |method, _| {
            (method == "custom.echo").then(|| Ok(json!({"status": "success"})))
        });
        let value: Value = client.request("custom.echo", json!({})).await.unwrap();
        assert_eq!(value["status"], "success");

        let status: MessageStatus = client
            .request::<HashMap<String, MessageStatus>>("custom.echo", json!({}))
            .await
            .unwrap()["status"];
        assert_eq!(status, MessageStatus::Success);
    }

    #[tokio::test]
    async fn test_logout_clears_cache() {
        let (client, transport) = scripted_client();
        client
            .handle_push(
                EventCategory::Chat,
                "messages_received",
                json!([incoming("m1", "bob", 100)]),
            )
            .unwrap();
        let registry = client.core_registry_for_tests();
        transport.reply_with(&registry, |_, _| Some(Ok(Value::Null)));
        client.login("alice", "t").await.unwrap();

        let (cb, rx) = CallBack::channel();
        client.logout(true, cb);
        await_result(rx).await.unwrap();
        assert!(client.cache().load_message("m1").is_none());
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn test_default_pager_clamps_to_resource_limit() {
        let (client, transport) = scripted_client_with(
            ChatSyncConfig::builder()
                .app_key("test#app")
                .default_page_size(500),
        );
        let registry = client.core_registry_for_tests();
        transport.reply_with(&registry, |_, _| Some(Ok(json!({ "cursor": "", "list": [] }))));

        let mut pager = client
            .default_pager(PagedResource::Contacts, "", crate::invoker::decode_json::<String>)
            .unwrap();
        let page = pager.next_page().await.unwrap().unwrap();
        assert!(page.is_empty());
        assert!(pager.is_finished());
        assert_eq!(transport.last_call().unwrap().params["page_size"], 50);
    }

    #[test]
    fn test_login_reports_user_agent() {
        let (client, transport) = scripted_client();
        client.login_with_token("alice", "tok", CallBack::new());
        let call = transport.last_call().unwrap();
        assert_eq!(call.method, methods::LOGIN);
        assert_eq!(call.params["app_key"], "test#app");
        assert!(call.params["user_agent"]
            .as_str()
            .unwrap()
            .starts_with("chatsync-sdk/"));
    }
}
