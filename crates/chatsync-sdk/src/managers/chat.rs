//! 消息与会话管理器
//!
//! 远程操作走传输层，成功后在用户回调之前把结果落到会话缓存；
//! 本地查询直接读缓存，不经过传输层。

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::callback::{await_result, CallBack, ProgressHandler, ValueCallBack};
use crate::client::ClientCore;
use crate::error::{ChatSyncError, Result};
use crate::invoker::decode_json;
use crate::methods;
use crate::model::{
    Conversation, ConversationKey, CursorPage, FetchServerMessagesOption, GroupReadAck, Message,
    MessageBody, MessageDirection, MessageReaction, MessageSearchDirection, MessageSearchOptions,
    MessageStatus, RemoteConversation, SupportLanguage,
};
use crate::model::message::generate_msg_id;
use crate::pagination::PagedResource;
use crate::registry::PendingRequest;
use crate::storage::ConversationCache;
use crate::utils::time::now_millis;

/// 发送成功的回执
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SendReceipt {
    server_msg_id: Option<String>,
    server_time: i64,
}

/// 消息管理器
#[derive(Clone)]
pub struct ChatManager {
    core: Arc<ClientCore>,
}

impl ChatManager {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    fn cache(&self) -> &Arc<ConversationCache> {
        &self.core.cache
    }

    // ========== 发送 ==========

    /// 发送消息
    ///
    /// 消息先以 Progress 状态写入缓存，服务端确认后变为 Success，失败则为 Fail。
    /// 回执带有服务端消息 ID 时，缓存里的消息 ID 会被替换。返回写入缓存时的消息。
    pub fn send_message(&self, message: Message, callback: CallBack) -> Message {
        let progress = callback.progress_handler();
        self.dispatch_send(message, progress, move |result| {
            callback.complete(result.map(|_| ()))
        })
    }

    /// `send_message` 的 async 版本，返回服务端确认后的消息
    pub async fn send(&self, message: Message) -> Result<Message> {
        let (callback, rx) = ValueCallBack::channel();
        self.dispatch_send(message, None, move |result| callback.complete(result));
        await_result(rx).await
    }

    /// 重发一条发送失败的消息
    ///
    /// 失败是终态，重发以新的本地 ID 发出一份副本，原失败消息从缓存中移除。
    /// 消息不存在或不是失败状态时回调以错误结束并返回 None。
    pub fn resend_message(&self, msg_id: &str, callback: CallBack) -> Option<Message> {
        match self.prepare_resend(msg_id) {
            Ok(message) => {
                let progress = callback.progress_handler();
                Some(self.dispatch_send(message, progress, move |result| {
                    callback.complete(result.map(|_| ()))
                }))
            }
            Err(e) => {
                callback.complete(Err(e));
                None
            }
        }
    }

    /// `resend_message` 的 async 版本
    pub async fn resend(&self, msg_id: &str) -> Result<Message> {
        let message = self.prepare_resend(msg_id)?;
        let (callback, rx) = ValueCallBack::channel();
        self.dispatch_send(message, None, move |result| callback.complete(result));
        await_result(rx).await
    }

    fn prepare_resend(&self, msg_id: &str) -> Result<Message> {
        let failed = self
            .cache()
            .load_message(msg_id)
            .ok_or_else(|| ChatSyncError::NotFound(format!("message {}", msg_id)))?;
        if failed.status != MessageStatus::Fail {
            return Err(ChatSyncError::State(format!(
                "message {} is {:?}, only failed messages can be resent",
                msg_id, failed.status
            )));
        }
        self.cache()
            .delete_message(&ConversationCache::key_of(&failed), msg_id);

        let mut retry = failed;
        retry.msg_id = generate_msg_id();
        retry.local_time = now_millis();
        retry.server_time = 0;
        debug!("Resending {} as {}", msg_id, retry.msg_id);
        Ok(retry)
    }

    fn dispatch_send<F>(
        &self,
        message: Message,
        progress: Option<ProgressHandler>,
        done: F,
    ) -> Message
    where
        F: FnOnce(Result<Message>) + Send + 'static,
    {
        let mut message = message;
        message.direction = MessageDirection::Send;
        message.status = MessageStatus::Progress;
        let key = ConversationCache::key_of(&message);
        self.cache().get_or_create(&key, true);
        self.cache().insert_message(&key, message.clone());

        let params = match serde_json::to_value(&message) {
            Ok(params) => params,
            Err(e) => {
                self.cache()
                    .update_message_status(&message.msg_id, MessageStatus::Fail);
                done(Err(e.into()));
                return message;
            }
        };

        let cache = self.cache().clone();
        let msg_id = message.msg_id.clone();
        let fallback = message.clone();
        let request = PendingRequest::new(methods::SEND_MESSAGE, move |result| match result {
            Ok(payload) => {
                let receipt = match payload {
                    Value::Null => SendReceipt::default(),
                    payload => serde_json::from_value(payload).unwrap_or_else(|e| {
                        // 服务端已经接受了消息，回执读不出来时保留本地 ID
                        warn!("Unreadable send receipt for {}, keeping local id: {}", msg_id, e);
                        SendReceipt::default()
                    }),
                };
                let mut stored = cache.load_message(&msg_id).unwrap_or(fallback);
                stored.status = MessageStatus::Success;
                if receipt.server_time > 0 {
                    stored.server_time = receipt.server_time;
                }
                match receipt
                    .server_msg_id
                    .filter(|id| !id.is_empty() && *id != msg_id)
                {
                    Some(server_id) => {
                        debug!("Message {} acked as {}", msg_id, server_id);
                        stored.msg_id = server_id;
                        cache.replace_message(&msg_id, stored.clone());
                    }
                    None => {
                        cache.update_message(&key, stored.clone());
                    }
                }
                done(Ok(stored));
            }
            Err(e) => {
                warn!("Send {} failed: {}", msg_id, e);
                cache.update_message_status(&msg_id, MessageStatus::Fail);
                done(Err(e));
            }
        })
        .with_progress(progress);
        self.core.invoker.invoke(methods::SEND_MESSAGE, params, request);
        message
    }

    // ========== 翻译与合并消息 ==========

    /// 翻译文本消息，成功后把带译文的消息写回缓存
    pub fn translate_message(
        &self,
        message: &Message,
        target_languages: &[String],
        callback: ValueCallBack<Message>,
    ) {
        if !matches!(message.body, MessageBody::Text(_)) {
            callback.complete(Err(ChatSyncError::Validation(format!(
                "message {} is not a text message",
                message.msg_id
            ))));
            return;
        }
        let cache = self.cache().clone();
        let callback = callback.before_success(move |translated: &Message| {
            if let Some(mut stored) = cache.load_message(&translated.msg_id) {
                stored.body = translated.body.clone();
                cache.update_message(&ConversationCache::key_of(&stored), stored);
            }
        });
        self.core.invoker.invoke_value(
            methods::TRANSLATE_MESSAGE,
            json!({ "message": message, "target_languages": target_languages }),
            callback,
        );
    }

    pub fn fetch_support_languages(&self, callback: ValueCallBack<Vec<SupportLanguage>>) {
        self.core
            .invoker
            .invoke_value(methods::FETCH_SUPPORT_LANGUAGES, Value::Null, callback);
    }

    /// 拉取合并转发消息里的原始消息列表
    pub fn fetch_combine_message_detail(&self, message: &Message, callback: ValueCallBack<Vec<Message>>) {
        if !matches!(message.body, MessageBody::Combine(_)) {
            callback.complete(Err(ChatSyncError::Validation(format!(
                "message {} is not a combine message",
                message.msg_id
            ))));
            return;
        }
        self.core.invoker.invoke_value(
            methods::FETCH_COMBINE_MESSAGE_DETAIL,
            json!({ "message": message }),
            callback,
        );
    }

    // ========== 回执 ==========

    /// 发送单条已读回执，成功后本地标记已读
    pub fn ack_message_read(&self, msg_id: &str, callback: CallBack) {
        let cache = self.cache().clone();
        let id = msg_id.to_string();
        let callback = callback.before_success(move || {
            if let Some(message) = cache.load_message(&id) {
                cache.mark_message_as_read(&ConversationCache::key_of(&message), &id);
            }
        });
        self.core
            .invoker
            .invoke_unit(methods::ACK_MESSAGE_READ, json!({ "msg_id": msg_id }), callback);
    }

    /// 发送会话已读回执，成功后本地整个会话标记已读
    pub fn ack_conversation_read(&self, key: &ConversationKey, callback: CallBack) {
        let cache = self.cache().clone();
        let k = key.clone();
        let callback = callback.before_success(move || {
            cache.mark_all_messages_as_read(&k);
        });
        self.core.invoker.invoke_unit(
            methods::ACK_CONVERSATION_READ,
            json!({ "conversation_id": key.id, "type": key.conv_type }),
            callback,
        );
    }

    /// 群消息已读回执
    pub fn ack_group_message_read(&self, group_id: &str, msg_id: &str, content: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::ACK_GROUP_MESSAGE_READ,
            json!({ "group_id": group_id, "msg_id": msg_id, "content": content }),
            callback,
        );
    }

    // ========== 撤回、修改、删除 ==========

    /// 撤回消息，成功后从缓存移除
    pub fn recall_message(&self, msg_id: &str, ext: &str, callback: CallBack) {
        let cache = self.cache().clone();
        let id = msg_id.to_string();
        let callback = callback.before_success(move || {
            cache.remove_messages(&[id]);
        });
        self.core.invoker.invoke_unit(
            methods::RECALL_MESSAGE,
            json!({ "msg_id": msg_id, "ext": ext }),
            callback,
        );
    }

    /// 修改已发送消息的内容，成功后替换缓存中的消息体
    pub fn modify_message(&self, msg_id: &str, body: MessageBody, callback: CallBack) {
        let params = match serde_json::to_value(&body) {
            Ok(body_json) => json!({ "msg_id": msg_id, "body": body_json }),
            Err(e) => {
                callback.complete(Err(e.into()));
                return;
            }
        };
        let cache = self.cache().clone();
        let id = msg_id.to_string();
        let callback = callback.before_success(move || {
            cache.replace_body(&id, body);
        });
        self.core
            .invoker
            .invoke_unit(methods::MODIFY_MESSAGE, params, callback);
    }

    pub fn report_message(&self, msg_id: &str, tag: &str, reason: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::REPORT_MESSAGE,
            json!({ "msg_id": msg_id, "tag": tag, "reason": reason }),
            callback,
        );
    }

    /// 删除服务端会话，成功后同步删除本地会话
    pub fn delete_conversation_from_server(
        &self,
        key: &ConversationKey,
        delete_messages: bool,
        callback: CallBack,
    ) {
        let cache = self.cache().clone();
        let k = key.clone();
        let callback = callback.before_success(move || {
            cache.delete_conversation(&k, delete_messages);
        });
        self.core.invoker.invoke_unit(
            methods::DELETE_CONVERSATION_FROM_SERVER,
            json!({
                "conversation_id": key.id,
                "type": key.conv_type,
                "is_thread": key.is_thread,
                "delete_messages": delete_messages,
            }),
            callback,
        );
    }

    /// 删除服务端漫游消息，成功后同步删除本地消息
    pub fn delete_messages_from_server(&self, key: &ConversationKey, msg_ids: Vec<String>, callback: CallBack) {
        let cache = self.cache().clone();
        let ids = msg_ids.clone();
        let callback = callback.before_success(move || {
            cache.remove_messages(&ids);
        });
        self.core.invoker.invoke_unit(
            methods::DELETE_MESSAGES_FROM_SERVER,
            json!({ "conversation_id": key.id, "type": key.conv_type, "msg_ids": msg_ids }),
            callback,
        );
    }

    // ========== 置顶 ==========

    /// 置顶/取消置顶会话，成功后更新本地会话
    pub fn pin_conversation(&self, key: &ConversationKey, is_pinned: bool, callback: CallBack) {
        let cache = self.cache().clone();
        let k = key.clone();
        let callback = callback.before_success(move || {
            cache.get_or_create(&k, true);
            cache.pin(&k, is_pinned);
        });
        self.core.invoker.invoke_unit(
            methods::PIN_CONVERSATION,
            json!({ "conversation_id": key.id, "type": key.conv_type, "is_pinned": is_pinned }),
            callback,
        );
    }

    pub fn pin_message(&self, msg_id: &str, callback: CallBack) {
        self.core
            .invoker
            .invoke_unit(methods::PIN_MESSAGE, json!({ "msg_id": msg_id }), callback);
    }

    pub fn unpin_message(&self, msg_id: &str, callback: CallBack) {
        self.core
            .invoker
            .invoke_unit(methods::UNPIN_MESSAGE, json!({ "msg_id": msg_id }), callback);
    }

    pub fn fetch_pinned_messages(&self, key: &ConversationKey, callback: ValueCallBack<Vec<Message>>) {
        self.core.invoker.invoke_value(
            methods::FETCH_PINNED_MESSAGES,
            json!({ "conversation_id": key.id, "type": key.conv_type }),
            callback,
        );
    }

    // ========== 表情回复 ==========

    pub fn add_reaction(&self, msg_id: &str, reaction: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::ADD_REACTION,
            json!({ "msg_id": msg_id, "reaction": reaction }),
            callback,
        );
    }

    pub fn remove_reaction(&self, msg_id: &str, reaction: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::REMOVE_REACTION,
            json!({ "msg_id": msg_id, "reaction": reaction }),
            callback,
        );
    }

    /// 批量获取消息的表情回复，键为消息 ID
    pub fn fetch_reaction_list(
        &self,
        msg_ids: &[String],
        group_id: Option<&str>,
        callback: ValueCallBack<HashMap<String, Vec<MessageReaction>>>,
    ) {
        self.core.invoker.invoke_value(
            methods::FETCH_REACTION_LIST,
            json!({ "msg_ids": msg_ids, "group_id": group_id }),
            callback,
        );
    }

    /// 某个表情下的用户列表（游标分页）
    pub fn fetch_reaction_detail(
        &self,
        msg_id: &str,
        reaction: &str,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<String>>,
    ) -> Result<()> {
        let resource = PagedResource::ReactionDetail {
            msg_id: msg_id.to_string(),
            reaction: reaction.to_string(),
        };
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<String>, callback)
    }

    // ========== 远程分页 ==========

    /// 拉取一页历史消息；`option.is_save` 时写入缓存
    pub fn fetch_history_messages(
        &self,
        key: &ConversationKey,
        cursor: &str,
        page_size: u32,
        option: FetchServerMessagesOption,
        callback: ValueCallBack<CursorPage<Message>>,
    ) -> Result<()> {
        let is_save = option.is_save;
        let resource = PagedResource::Messages {
            conversation: key.clone(),
            option,
        };
        let cache = self.cache().clone();
        let k = key.clone();
        let callback = callback.before_success(move |page: &CursorPage<Message>| {
            if is_save && !page.data.is_empty() {
                cache.get_or_create(&k, true);
                let saved = page
                    .data
                    .iter()
                    .filter(|m| cache.insert_message(&k, (*m).clone()))
                    .count();
                debug!("Saved {}/{} history messages into {}", saved, page.data.len(), k);
            }
        });
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<Message>, callback)
    }

    pub async fn fetch_history_page(
        &self,
        key: &ConversationKey,
        cursor: &str,
        page_size: u32,
        option: FetchServerMessagesOption,
    ) -> Result<CursorPage<Message>> {
        let (callback, rx) = ValueCallBack::channel();
        self.fetch_history_messages(key, cursor, page_size, option, callback)?;
        await_result(rx).await
    }

    /// 拉取一页服务端会话并写入缓存
    pub fn fetch_conversations_from_server(
        &self,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<RemoteConversation>>,
    ) -> Result<()> {
        self.fetch_conversation_page(false, cursor, page_size, callback)
    }

    /// 只拉取置顶会话
    pub fn fetch_pinned_conversations_from_server(
        &self,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<RemoteConversation>>,
    ) -> Result<()> {
        self.fetch_conversation_page(true, cursor, page_size, callback)
    }

    fn fetch_conversation_page(
        &self,
        pinned_only: bool,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<RemoteConversation>>,
    ) -> Result<()> {
        let cache = self.cache().clone();
        let callback = callback.before_success(move |page: &CursorPage<RemoteConversation>| {
            cache.hydrate(page.data.clone());
        });
        self.core.pagination.fetch(
            &PagedResource::Conversations { pinned_only },
            cursor,
            page_size,
            decode_json::<RemoteConversation>,
            callback,
        )
    }

    pub async fn fetch_conversations_page(
        &self,
        cursor: &str,
        page_size: u32,
    ) -> Result<CursorPage<RemoteConversation>> {
        let (callback, rx) = ValueCallBack::channel();
        self.fetch_conversations_from_server(cursor, page_size, callback)?;
        await_result(rx).await
    }

    /// 群消息已读回执详情
    pub fn fetch_group_read_acks(
        &self,
        group_id: &str,
        msg_id: &str,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<GroupReadAck>>,
    ) -> Result<()> {
        let resource = PagedResource::GroupReadAcks {
            group_id: group_id.to_string(),
            msg_id: msg_id.to_string(),
        };
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<GroupReadAck>, callback)
    }

    // ========== 本地 ==========

    pub fn conversation(&self, key: &ConversationKey, create_if_missing: bool) -> Option<Conversation> {
        self.cache().get_or_create(key, create_if_missing)
    }

    pub fn load_all_conversations(&self) -> Vec<Conversation> {
        self.cache().load_all_conversations()
    }

    /// 只删除本地会话
    pub fn delete_conversation(&self, key: &ConversationKey, delete_messages: bool) -> bool {
        self.cache().delete_conversation(key, delete_messages)
    }

    pub fn load_message(&self, msg_id: &str) -> Option<Message> {
        self.cache().load_message(msg_id)
    }

    pub fn load_messages(
        &self,
        key: &ConversationKey,
        start_msg_id: &str,
        count: usize,
        direction: MessageSearchDirection,
    ) -> Vec<Message> {
        self.cache().load_messages(key, start_msg_id, count, direction)
    }

    /// 本地写入一条消息（不发送）
    pub fn insert_message(&self, message: Message) -> bool {
        let key = ConversationCache::key_of(&message);
        self.cache().get_or_create(&key, true);
        self.cache().insert_message(&key, message)
    }

    /// 批量导入消息
    pub fn import_messages(&self, messages: Vec<Message>) -> usize {
        self.cache().import_messages(messages)
    }

    /// 更新本地消息，状态不允许回退
    pub fn update_message(&self, message: Message) -> bool {
        let key = ConversationCache::key_of(&message);
        self.cache().update_message(&key, message)
    }

    /// 本地缓存的消息总数
    pub fn message_count(&self) -> usize {
        self.cache().stats().message_count
    }

    pub fn conversation_message_count(&self, key: &ConversationKey) -> usize {
        self.cache().message_count(key)
    }

    /// 清空全部会话与消息
    ///
    /// `clear_server_data` 为 true 时先清服务端漫游数据，成功后才清本地；否则只清本地。
    pub fn delete_all_messages_and_conversations(&self, clear_server_data: bool, callback: CallBack) {
        let cache = self.cache().clone();
        if !clear_server_data {
            cache.clear();
            callback.complete(Ok(()));
            return;
        }
        let callback = callback.before_success(move || cache.clear());
        self.core.invoker.invoke_unit(
            methods::DELETE_ALL_MESSAGES_AND_CONVERSATIONS,
            Value::Null,
            callback,
        );
    }

    pub fn unread_message_count(&self) -> usize {
        self.cache().total_unread_count()
    }

    pub fn mark_all_conversations_as_read(&self) -> usize {
        self.cache().mark_all_conversations_as_read()
    }

    pub fn search_messages(&self, keywords: &str, options: &MessageSearchOptions) -> Vec<Message> {
        self.cache().search_messages(keywords, options)
    }

    /// 传给宿主的调试信息
    pub fn cache_summary(&self) -> Value {
        let stats = self.cache().stats();
        json!({
            "conversations": stats.conversation_count,
            "messages": stats.message_count,
            "unread": stats.total_unread,
        })
    }
}
