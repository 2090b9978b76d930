//! 会话缓存
//!
//! 会话元数据 + 按时间排序的消息时间线，全部在内存中。
//!
//! - 消息只在 `messages` 中存一份，以 msg_id 为键；会话只持有 `(排序时间, msg_id)` 引用
//! - 排序时间：服务端时间非 0 时用服务端时间，否则用本地时间；同一时间按 msg_id 排
//! - 未读数从时间线实时统计 `is_read == false`，不单独存储
//! - 所有读-改-写都在同一把写锁内完成
//!
//! 结构性错误（会话 ID 不匹配、消息不存在）一律返回 `false` / `None`，不返回错误。

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::config::ChatSyncConfig;
use crate::model::{
    Conversation, ConversationKey, Message, MessageBody, MessageBodyType, MessageDirection,
    MessageSearchDirection, MessageSearchOptions, MessageStatus, RemoteConversation,
};
use crate::utils::time::{format_millis, now_millis};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TimelineEntry {
    sort_time: i64,
    msg_id: String,
}

#[derive(Debug)]
struct ConversationEntry {
    meta: Conversation,
    timeline: Vec<TimelineEntry>,
}

impl ConversationEntry {
    fn position(&self, msg_id: &str) -> Option<usize> {
        self.timeline.iter().position(|e| e.msg_id == msg_id)
    }

    fn insert_ordered(&mut self, entry: TimelineEntry) {
        let pos = self.timeline.partition_point(|e| e < &entry);
        self.timeline.insert(pos, entry);
    }

    fn remove(&mut self, msg_id: &str) -> bool {
        match self.position(msg_id) {
            Some(pos) => {
                self.timeline.remove(pos);
                true
            }
            None => false,
        }
    }

    fn last_activity(&self) -> i64 {
        self.timeline.last().map(|e| e.sort_time).unwrap_or(0)
    }
}

#[derive(Debug)]
struct StoredMessage {
    key: ConversationKey,
    message: Message,
}

struct CacheInner {
    conversations: HashMap<ConversationKey, ConversationEntry>,
    messages: HashMap<String, StoredMessage>,
    sort_by_server_time: bool,
}

impl CacheInner {
    fn sort_time(&self, message: &Message) -> i64 {
        message.sort_time(self.sort_by_server_time)
    }

    /// 取得会话条目，不存在时创建；新建时会收回之前脱离会话但仍保留的消息
    fn ensure_entry(&mut self, key: &ConversationKey) -> &mut ConversationEntry {
        let messages = &self.messages;
        let by_server_time = self.sort_by_server_time;
        self.conversations.entry(key.clone()).or_insert_with(|| {
            let mut timeline: Vec<TimelineEntry> = messages
                .iter()
                .filter(|(_, stored)| &stored.key == key)
                .map(|(id, stored)| TimelineEntry {
                    sort_time: stored.message.sort_time(by_server_time),
                    msg_id: id.clone(),
                })
                .collect();
            timeline.sort();
            debug!("Created conversation {} ({} retained messages)", key, timeline.len());
            ConversationEntry {
                meta: Conversation::new(key),
                timeline,
            }
        })
    }

    /// 把消息从存储和所属会话的时间线中摘除
    fn detach(&mut self, msg_id: &str) -> Option<StoredMessage> {
        let stored = self.messages.remove(msg_id)?;
        if let Some(entry) = self.conversations.get_mut(&stored.key) {
            entry.remove(msg_id);
        }
        Some(stored)
    }

    /// 同 ID 消息再次写入时合并本地状态：状态不回退，已读与回执标记只增不减
    fn merge_existing(&self, message: &mut Message) {
        let existing = match self.messages.get(&message.msg_id) {
            Some(stored) => &stored.message,
            None => return,
        };
        if !existing.status.can_transition_to(message.status) {
            debug!(
                "Keeping status {:?} over {:?} for {}",
                existing.status, message.status, message.msg_id
            );
            message.status = existing.status;
        }
        message.is_read |= existing.is_read;
        message.has_read_ack |= existing.has_read_ack;
        message.has_deliver_ack |= existing.has_deliver_ack;
    }

    fn store(&mut self, key: &ConversationKey, message: Message, ordered: bool) {
        self.detach(&message.msg_id);
        let entry = TimelineEntry {
            sort_time: self.sort_time(&message),
            msg_id: message.msg_id.clone(),
        };
        let conv = self.ensure_entry(key);
        if ordered {
            conv.insert_ordered(entry);
        } else {
            conv.timeline.push(entry);
        }
        self.messages.insert(
            message.msg_id.clone(),
            StoredMessage {
                key: key.clone(),
                message,
            },
        );
    }

    fn message_in(&self, key: &ConversationKey, msg_id: &str) -> Option<&Message> {
        self.messages
            .get(msg_id)
            .filter(|stored| &stored.key == key)
            .map(|stored| &stored.message)
    }

    fn message_in_mut(&mut self, key: &ConversationKey, msg_id: &str) -> Option<&mut Message> {
        self.messages
            .get_mut(msg_id)
            .filter(|stored| &stored.key == key)
            .map(|stored| &mut stored.message)
    }

    fn timeline_messages(&self, entry: &ConversationEntry) -> Vec<Message> {
        entry
            .timeline
            .iter()
            .filter_map(|e| self.messages.get(&e.msg_id).map(|s| s.message.clone()))
            .collect()
    }

    fn unread_in(&self, entry: &ConversationEntry) -> usize {
        entry
            .timeline
            .iter()
            .filter_map(|e| self.messages.get(&e.msg_id))
            .filter(|s| !s.message.is_read)
            .count()
    }

    fn mark_read(&mut self, msg_id: &str) -> bool {
        match self.messages.get_mut(msg_id) {
            Some(stored) => {
                let changed = !stored.message.is_read || !stored.message.has_read_ack;
                stored.message.is_read = true;
                stored.message.has_read_ack = true;
                changed
            }
            None => false,
        }
    }

    /// 按搜索选项在时间线上截取一段窗口，结果按时间正序
    fn window<P>(
        &self,
        entry: &ConversationEntry,
        options: &MessageSearchOptions,
        predicate: P,
    ) -> Vec<Message>
    where
        P: Fn(&Message) -> bool,
    {
        let candidates = entry
            .timeline
            .iter()
            .filter(|e| match options.direction {
                MessageSearchDirection::Up => options.timestamp < 0 || e.sort_time < options.timestamp,
                MessageSearchDirection::Down => options.timestamp < 0 || e.sort_time > options.timestamp,
            })
            .filter_map(|e| self.messages.get(&e.msg_id).map(|s| &s.message))
            .filter(|m| options.from.as_ref().map(|f| &m.from == f).unwrap_or(true))
            .filter(|m| options.msg_types.is_empty() || options.msg_types.contains(&m.body_type()))
            .filter(|m| predicate(*m));

        match options.direction {
            MessageSearchDirection::Up => {
                let mut picked: Vec<Message> = candidates
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .take(options.max_count)
                    .cloned()
                    .collect();
                picked.reverse();
                picked
            }
            MessageSearchDirection::Down => candidates.take(options.max_count).cloned().collect(),
        }
    }
}

/// 会话缓存统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub conversation_count: usize,
    pub message_count: usize,
    pub total_unread: usize,
}

pub struct ConversationCache {
    inner: RwLock<CacheInner>,
    enable_empty_conversation: bool,
    regard_import_msg_as_read: bool,
}

impl ConversationCache {
    pub fn new(config: &ChatSyncConfig) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                conversations: HashMap::new(),
                messages: HashMap::new(),
                sort_by_server_time: config.sort_message_by_server_time,
            }),
            enable_empty_conversation: config.enable_empty_conversation,
            regard_import_msg_as_read: config.regard_import_msg_as_read,
        }
    }

    /// 消息所属会话的键
    pub fn key_of(message: &Message) -> ConversationKey {
        ConversationKey {
            id: message.conversation_id.clone(),
            conv_type: message.chat_type,
            is_thread: message.is_thread,
        }
    }

    // ========== 会话 ==========

    /// 获取会话，`create_if_missing` 为 false 且不存在时返回 None
    pub fn get_or_create(&self, key: &ConversationKey, create_if_missing: bool) -> Option<Conversation> {
        if !create_if_missing {
            return self.conversation(key);
        }
        let mut inner = self.inner.write();
        Some(inner.ensure_entry(key).meta.clone())
    }

    pub fn conversation(&self, key: &ConversationKey) -> Option<Conversation> {
        self.inner.read().conversations.get(key).map(|e| e.meta.clone())
    }

    /// 所有会话：置顶的在前（按置顶时间倒序），其余按最近活动时间倒序
    pub fn load_all_conversations(&self) -> Vec<Conversation> {
        let inner = self.inner.read();
        let mut entries: Vec<&ConversationEntry> = inner
            .conversations
            .values()
            .filter(|e| self.enable_empty_conversation || !e.timeline.is_empty())
            .collect();
        entries.sort_by(|a, b| {
            b.meta
                .is_pinned
                .cmp(&a.meta.is_pinned)
                .then_with(|| b.meta.pinned_time.cmp(&a.meta.pinned_time))
                .then_with(|| b.last_activity().cmp(&a.last_activity()))
                .then_with(|| a.meta.id.cmp(&b.meta.id))
        });
        entries.into_iter().map(|e| e.meta.clone()).collect()
    }

    /// 用服务端会话列表更新缓存，返回处理的会话数
    pub fn hydrate(&self, conversations: Vec<RemoteConversation>) -> usize {
        let mut inner = self.inner.write();
        let count = conversations.len();
        for remote in conversations {
            let key = remote.conversation.key();
            {
                let entry = inner.ensure_entry(&key);
                let mut meta = remote.conversation;
                meta.pinned_time = if meta.is_pinned { meta.pinned_time.max(1) } else { 0 };
                entry.meta = meta;
            }
            if let Some(mut message) = remote.last_message {
                if !Self::belongs_to(&message, &key) {
                    continue;
                }
                inner.merge_existing(&mut message);
                inner.store(&key, message, true);
            }
        }
        debug!("Hydrated {} conversation(s)", count);
        count
    }

    /// 删除会话；`delete_messages` 为 false 时消息保留，会话重新出现时会被收回
    pub fn delete_conversation(&self, key: &ConversationKey, delete_messages: bool) -> bool {
        let mut inner = self.inner.write();
        let entry = match inner.conversations.remove(key) {
            Some(entry) => entry,
            None => return false,
        };
        if delete_messages {
            for e in &entry.timeline {
                inner.messages.remove(&e.msg_id);
            }
        }
        debug!("Deleted conversation {} (messages dropped: {})", key, delete_messages);
        true
    }

    /// 置顶/取消置顶，置顶时间取当前时间
    pub fn pin(&self, key: &ConversationKey, is_pinned: bool) -> bool {
        self.set_pinned(key, is_pinned, now_millis())
    }

    pub fn set_pinned(&self, key: &ConversationKey, is_pinned: bool, timestamp: i64) -> bool {
        let mut inner = self.inner.write();
        match inner.conversations.get_mut(key) {
            Some(entry) => {
                entry.meta.apply_pin(is_pinned, timestamp);
                debug!(
                    "Conversation {} pinned={} at {}",
                    key,
                    is_pinned,
                    format_millis(entry.meta.pinned_time)
                );
                true
            }
            None => false,
        }
    }

    pub fn set_ext(&self, key: &ConversationKey, ext: HashMap<String, String>) -> bool {
        let mut inner = self.inner.write();
        match inner.conversations.get_mut(key) {
            Some(entry) => {
                entry.meta.ext = ext;
                true
            }
            None => false,
        }
    }

    // ========== 消息写入 ==========

    /// 消息的会话 ID 与类型都必须和目标会话一致
    fn belongs_to(message: &Message, key: &ConversationKey) -> bool {
        if message.conversation_id == key.id && message.chat_type == key.conv_type {
            return true;
        }
        warn!(
            "Message {} belongs to {}:{}, refusing write into {}",
            message.msg_id,
            message.chat_type.as_str(),
            message.conversation_id,
            key
        );
        false
    }

    /// 按排序时间有序插入；同 ID 消息再次写入时与本地状态合并后替换
    pub fn insert_message(&self, key: &ConversationKey, mut message: Message) -> bool {
        if !Self::belongs_to(&message, key) {
            return false;
        }
        let mut inner = self.inner.write();
        inner.merge_existing(&mut message);
        inner.store(key, message, true);
        true
    }

    /// 直接追加到时间线末尾（调用方保证它是最新的消息）
    pub fn append_message(&self, key: &ConversationKey, mut message: Message) -> bool {
        if !Self::belongs_to(&message, key) {
            return false;
        }
        let mut inner = self.inner.write();
        inner.merge_existing(&mut message);
        inner.store(key, message, false);
        true
    }

    /// 导入一批消息，按各自所属会话有序插入，返回导入数量
    pub fn import_messages(&self, messages: Vec<Message>) -> usize {
        let mut inner = self.inner.write();
        let count = messages.len();
        for mut message in messages {
            if self.regard_import_msg_as_read {
                message.is_read = true;
            }
            let key = Self::key_of(&message);
            inner.merge_existing(&mut message);
            inner.store(&key, message, true);
        }
        count
    }

    /// 整体替换一条已缓存的消息并重新定位，拒绝状态回退
    pub fn update_message(&self, key: &ConversationKey, message: Message) -> bool {
        let mut inner = self.inner.write();
        let current = match inner.message_in(key, &message.msg_id) {
            Some(current) => current.status,
            None => return false,
        };
        if !current.can_transition_to(message.status) {
            warn!(
                "Rejecting status change {:?} -> {:?} for {}",
                current, message.status, message.msg_id
            );
            return false;
        }
        inner.store(key, message, true);
        true
    }

    /// 用服务端回执替换本地消息（服务端可能分配了新的 msg_id）
    pub fn replace_message(&self, old_msg_id: &str, message: Message) -> bool {
        let mut inner = self.inner.write();
        let (key, current) = match inner.messages.get(old_msg_id) {
            Some(stored) => (stored.key.clone(), stored.message.status),
            None => return false,
        };
        if message.conversation_id != key.id || !current.can_transition_to(message.status) {
            return false;
        }
        inner.detach(old_msg_id);
        inner.store(&key, message, true);
        true
    }

    pub fn update_message_status(&self, msg_id: &str, status: MessageStatus) -> bool {
        let mut inner = self.inner.write();
        match inner.messages.get_mut(msg_id) {
            Some(stored) => {
                if !stored.message.status.can_transition_to(status) {
                    warn!(
                        "Rejecting status change {:?} -> {:?} for {}",
                        stored.message.status, status, msg_id
                    );
                    return false;
                }
                stored.message.status = status;
                true
            }
            None => false,
        }
    }

    /// 编辑/翻译后的消息体
    pub fn replace_body(&self, msg_id: &str, body: MessageBody) -> bool {
        let mut inner = self.inner.write();
        match inner.messages.get_mut(msg_id) {
            Some(stored) => {
                stored.message.body = body;
                stored.message.is_content_replaced = true;
                true
            }
            None => false,
        }
    }

    // ========== 已读 ==========

    /// 标记单条消息已读；重复调用结果不变
    pub fn mark_message_as_read(&self, key: &ConversationKey, msg_id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.message_in(key, msg_id).is_none() {
            return false;
        }
        inner.mark_read(msg_id);
        true
    }

    pub fn mark_all_messages_as_read(&self, key: &ConversationKey) -> bool {
        let mut inner = self.inner.write();
        let ids: Vec<String> = match inner.conversations.get(key) {
            Some(entry) => entry.timeline.iter().map(|e| e.msg_id.clone()).collect(),
            None => return false,
        };
        let changed = ids.iter().filter(|id| inner.mark_read(id)).count();
        debug!("Marked {} message(s) read in {}", changed, key);
        true
    }

    /// 返回被改动的消息数
    pub fn mark_all_conversations_as_read(&self) -> usize {
        let mut inner = self.inner.write();
        let ids: Vec<String> = inner
            .conversations
            .values()
            .flat_map(|e| e.timeline.iter().map(|t| t.msg_id.clone()))
            .collect();
        ids.iter().filter(|id| inner.mark_read(id)).count()
    }

    pub fn unread_count(&self, key: &ConversationKey) -> usize {
        let inner = self.inner.read();
        inner
            .conversations
            .get(key)
            .map(|entry| inner.unread_in(entry))
            .unwrap_or(0)
    }

    pub fn total_unread_count(&self) -> usize {
        let inner = self.inner.read();
        inner.conversations.values().map(|e| inner.unread_in(e)).sum()
    }

    /// 对方已读回执：标记这些消息 has_read_ack
    pub fn apply_read_acks(&self, msg_ids: &[String]) -> usize {
        let mut inner = self.inner.write();
        let mut changed = 0;
        for id in msg_ids {
            if let Some(stored) = inner.messages.get_mut(id) {
                if !stored.message.has_read_ack {
                    stored.message.has_read_ack = true;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// 送达回执
    pub fn apply_delivery_acks(&self, msg_ids: &[String]) -> usize {
        let mut inner = self.inner.write();
        let mut changed = 0;
        for id in msg_ids {
            if let Some(stored) = inner.messages.get_mut(id) {
                if !stored.message.has_deliver_ack {
                    stored.message.has_deliver_ack = true;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// 对方读完整个会话：本会话内自己发出的消息全部 has_read_ack
    pub fn apply_conversation_read(&self, key: &ConversationKey) -> bool {
        let mut inner = self.inner.write();
        let ids: Vec<String> = match inner.conversations.get(key) {
            Some(entry) => entry.timeline.iter().map(|e| e.msg_id.clone()).collect(),
            None => return false,
        };
        for id in ids {
            if let Some(message) = inner.message_in_mut(key, &id) {
                if message.direction == MessageDirection::Send {
                    message.has_read_ack = true;
                }
            }
        }
        true
    }

    // ========== 删除 ==========

    pub fn delete_message(&self, key: &ConversationKey, msg_id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.message_in(key, msg_id).is_none() {
            return false;
        }
        inner.detach(msg_id).is_some()
    }

    /// 删除排序时间落在 [start_time, end_time] 内的消息
    pub fn delete_messages(&self, key: &ConversationKey, start_time: i64, end_time: i64) -> bool {
        if start_time > end_time {
            return false;
        }
        let mut inner = self.inner.write();
        let ids: Vec<String> = match inner.conversations.get(key) {
            Some(entry) => entry
                .timeline
                .iter()
                .filter(|e| e.sort_time >= start_time && e.sort_time <= end_time)
                .map(|e| e.msg_id.clone())
                .collect(),
            None => return false,
        };
        for id in &ids {
            inner.detach(id);
        }
        debug!("Deleted {} message(s) in {} within [{}, {}]", ids.len(), key, start_time, end_time);
        true
    }

    pub fn delete_all_messages(&self, key: &ConversationKey) -> bool {
        let mut inner = self.inner.write();
        let ids: Vec<String> = match inner.conversations.get_mut(key) {
            Some(entry) => entry.timeline.drain(..).map(|e| e.msg_id).collect(),
            None => return false,
        };
        for id in ids {
            inner.messages.remove(&id);
        }
        true
    }

    /// 按 ID 移除消息（撤回、被服务端删除），不要求知道所属会话
    pub fn remove_messages(&self, msg_ids: &[String]) -> usize {
        let mut inner = self.inner.write();
        msg_ids.iter().filter(|id| inner.detach(id).is_some()).count()
    }

    // ========== 读取 ==========

    pub fn load_message(&self, msg_id: &str) -> Option<Message> {
        self.inner.read().messages.get(msg_id).map(|s| s.message.clone())
    }

    pub fn last_message(&self, key: &ConversationKey) -> Option<Message> {
        let inner = self.inner.read();
        let entry = inner.conversations.get(key)?;
        let last = entry.timeline.last()?;
        inner.messages.get(&last.msg_id).map(|s| s.message.clone())
    }

    pub fn last_received_message(&self, key: &ConversationKey) -> Option<Message> {
        let inner = self.inner.read();
        let entry = inner.conversations.get(key)?;
        entry
            .timeline
            .iter()
            .rev()
            .filter_map(|e| inner.messages.get(&e.msg_id))
            .find(|s| s.message.direction == MessageDirection::Receive)
            .map(|s| s.message.clone())
    }

    /// 会话内全部消息，按时间正序
    pub fn messages(&self, key: &ConversationKey) -> Vec<Message> {
        let inner = self.inner.read();
        inner
            .conversations
            .get(key)
            .map(|entry| inner.timeline_messages(entry))
            .unwrap_or_default()
    }

    /// 从 `start_msg_id`（不含）开始按方向加载至多 `count` 条，结果按时间正序
    ///
    /// `start_msg_id` 为空时：Up 从最新一条开始，Down 从最早一条开始。
    /// 起始消息不在该会话中时返回空。
    pub fn load_messages(
        &self,
        key: &ConversationKey,
        start_msg_id: &str,
        count: usize,
        direction: MessageSearchDirection,
    ) -> Vec<Message> {
        let inner = self.inner.read();
        let entry = match inner.conversations.get(key) {
            Some(entry) => entry,
            None => return Vec::new(),
        };
        let len = entry.timeline.len();
        let (begin, end) = match (start_msg_id.is_empty(), direction) {
            (true, MessageSearchDirection::Up) => (len.saturating_sub(count), len),
            (true, MessageSearchDirection::Down) => (0, count.min(len)),
            (false, dir) => match entry.position(start_msg_id) {
                Some(pos) => match dir {
                    MessageSearchDirection::Up => (pos.saturating_sub(count), pos),
                    MessageSearchDirection::Down => (pos + 1, (pos + 1).saturating_add(count).min(len)),
                },
                None => return Vec::new(),
            },
        };
        entry.timeline[begin..end]
            .iter()
            .filter_map(|e| inner.messages.get(&e.msg_id).map(|s| s.message.clone()))
            .collect()
    }

    /// 排序时间落在 [start_time, end_time] 内的前 `count` 条
    pub fn load_messages_with_time(
        &self,
        key: &ConversationKey,
        start_time: i64,
        end_time: i64,
        count: usize,
    ) -> Vec<Message> {
        let inner = self.inner.read();
        let entry = match inner.conversations.get(key) {
            Some(entry) => entry,
            None => return Vec::new(),
        };
        entry
            .timeline
            .iter()
            .filter(|e| e.sort_time >= start_time && e.sort_time <= end_time)
            .take(count)
            .filter_map(|e| inner.messages.get(&e.msg_id).map(|s| s.message.clone()))
            .collect()
    }

    pub fn load_messages_with_keyword(
        &self,
        key: &ConversationKey,
        keyword: &str,
        options: &MessageSearchOptions,
    ) -> Vec<Message> {
        let inner = self.inner.read();
        match inner.conversations.get(key) {
            Some(entry) => inner.window(entry, options, |m| m.matches_keyword(keyword, options.scope)),
            None => Vec::new(),
        }
    }

    pub fn load_messages_with_msg_types(
        &self,
        key: &ConversationKey,
        types: &[MessageBodyType],
        options: &MessageSearchOptions,
    ) -> Vec<Message> {
        let options = MessageSearchOptions {
            msg_types: types.to_vec(),
            ..options.clone()
        };
        let inner = self.inner.read();
        match inner.conversations.get(key) {
            Some(entry) => inner.window(entry, &options, |_| true),
            None => Vec::new(),
        }
    }

    /// 跨会话关键字搜索，结果按时间正序，最多 `options.max_count` 条
    pub fn search_messages(&self, keywords: &str, options: &MessageSearchOptions) -> Vec<Message> {
        let inner = self.inner.read();
        let mut hits: Vec<Message> = inner
            .conversations
            .values()
            .flat_map(|entry| inner.window(entry, options, |m| m.matches_keyword(keywords, options.scope)))
            .collect();
        let by_server_time = inner.sort_by_server_time;
        hits.sort_by(|a, b| {
            a.sort_time(by_server_time)
                .cmp(&b.sort_time(by_server_time))
                .then_with(|| a.msg_id.cmp(&b.msg_id))
        });
        let excess = hits.len().saturating_sub(options.max_count);
        match options.direction {
            MessageSearchDirection::Up => {
                hits.drain(..excess);
            }
            MessageSearchDirection::Down => hits.truncate(options.max_count),
        }
        hits
    }

    /// 会话时间线上的消息数
    pub fn message_count(&self, key: &ConversationKey) -> usize {
        self.inner
            .read()
            .conversations
            .get(key)
            .map(|entry| entry.timeline.len())
            .unwrap_or(0)
    }

    pub fn conversation_keys(&self) -> HashSet<ConversationKey> {
        self.inner.read().conversations.keys().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            conversation_count: inner.conversations.len(),
            message_count: inner.messages.len(),
            total_unread: inner.conversations.values().map(|e| inner.unread_in(e)).sum(),
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.conversations.clear();
        inner.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeValue, ConversationType};

    fn cache() -> ConversationCache {
        ConversationCache::new(&ChatSyncConfig::default())
    }

    fn received(conv: &str, id: &str, local_time: i64) -> Message {
        let mut msg = Message::create_text_send_message(conv, format!("body {}", id));
        msg.msg_id = id.to_string();
        msg.local_time = local_time;
        msg.direction = MessageDirection::Receive;
        msg.is_read = false;
        msg
    }

    fn ids(messages: &[Message]) -> Vec<String> {
        messages.iter().map(|m| m.msg_id.clone()).collect()
    }

    #[test]
    fn test_get_or_create() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        assert!(cache.get_or_create(&key, false).is_none());
        let conv = cache.get_or_create(&key, true).unwrap();
        assert_eq!(conv.id, "c1");
        assert_eq!(conv.pinned_time, 0);
        assert!(cache.get_or_create(&key, false).is_some());
    }

    #[test]
    fn test_insert_orders_by_local_time() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        for (id, t) in [("a", 100), ("b", 200), ("c", 150)] {
            assert!(cache.insert_message(&key, received("c1", id, t)));
        }
        let loaded = cache.load_messages(&key, "", 10, MessageSearchDirection::Up);
        let times: Vec<i64> = loaded.iter().map(|m| m.local_time).collect();
        assert_eq!(times, vec![100, 150, 200]);
    }

    #[test]
    fn test_insert_prefers_server_time_and_breaks_ties_by_id() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        let mut late_local = received("c1", "m2", 900);
        late_local.server_time = 50;
        cache.insert_message(&key, received("c1", "m3", 100));
        cache.insert_message(&key, received("c1", "m1", 100));
        cache.insert_message(&key, late_local);
        assert_eq!(ids(&cache.messages(&key)), vec!["m2", "m1", "m3"]);
    }

    #[test]
    fn test_local_time_only_when_server_sort_disabled() {
        let config = ChatSyncConfig {
            sort_message_by_server_time: false,
            ..ChatSyncConfig::default()
        };
        let cache = ConversationCache::new(&config);
        let key = ConversationKey::direct("c1");
        let mut a = received("c1", "a", 300);
        a.server_time = 10;
        cache.insert_message(&key, a);
        cache.insert_message(&key, received("c1", "b", 200));
        assert_eq!(ids(&cache.messages(&key)), vec!["b", "a"]);
    }

    #[test]
    fn test_reinsert_is_idempotent() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        cache.insert_message(&key, received("c1", "a", 100));
        cache.insert_message(&key, received("c1", "b", 200));
        let mut moved = received("c1", "a", 300);
        moved.is_read = true;
        cache.insert_message(&key, moved.clone());
        cache.insert_message(&key, moved);

        assert_eq!(ids(&cache.messages(&key)), vec!["b", "a"]);
        assert_eq!(cache.stats().message_count, 2);
        assert_eq!(cache.unread_count(&key), 1);
    }

    #[test]
    fn test_insert_rejects_conversation_mismatch() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        assert!(!cache.insert_message(&key, received("c2", "x", 1)));
        assert!(!cache.append_message(&key, received("c2", "x", 1)));
        assert!(cache.conversation(&key).is_none());
        assert!(cache.load_message("x").is_none());
    }

    #[test]
    fn test_same_id_moves_between_conversation_types() {
        let cache = cache();
        let direct = ConversationKey::direct("c1");
        let group = ConversationKey::group("c1");
        cache.insert_message(&direct, received("c1", "a", 1));
        let mut in_group = received("c1", "a", 1);
        in_group.chat_type = ConversationType::Group;
        assert!(cache.insert_message(&group, in_group));
        assert!(cache.messages(&direct).is_empty());
        assert_eq!(ids(&cache.messages(&group)), vec!["a"]);
        assert_eq!(cache.stats().message_count, 1);
    }

    #[test]
    fn test_append_pushes_to_tail() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        cache.insert_message(&key, received("c1", "a", 500));
        cache.append_message(&key, received("c1", "b", 100));
        assert_eq!(ids(&cache.messages(&key)), vec!["a", "b"]);
        assert_eq!(cache.last_message(&key).unwrap().msg_id, "b");
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        cache.insert_message(&key, received("c1", "a", 1));
        cache.insert_message(&key, received("c1", "b", 2));
        assert_eq!(cache.unread_count(&key), 2);

        assert!(cache.mark_message_as_read(&key, "a"));
        let once = cache.unread_count(&key);
        assert!(cache.mark_message_as_read(&key, "a"));
        assert_eq!(cache.unread_count(&key), once);
        assert_eq!(once, 1);

        let msg = cache.load_message("a").unwrap();
        assert!(msg.is_read && msg.has_read_ack);
        assert!(!cache.mark_message_as_read(&key, "missing"));
        assert!(!cache.mark_message_as_read(&ConversationKey::group("c1"), "b"));
    }

    #[test]
    fn test_mark_all_read() {
        let cache = cache();
        let k1 = ConversationKey::direct("c1");
        let k2 = ConversationKey::direct("c2");
        cache.insert_message(&k1, received("c1", "a", 1));
        cache.insert_message(&k1, received("c1", "b", 2));
        cache.insert_message(&k2, received("c2", "c", 3));
        assert_eq!(cache.total_unread_count(), 3);

        assert!(cache.mark_all_messages_as_read(&k1));
        assert_eq!(cache.unread_count(&k1), 0);
        assert_eq!(cache.total_unread_count(), 1);
        assert!(!cache.mark_all_messages_as_read(&ConversationKey::room("none")));

        assert_eq!(cache.mark_all_conversations_as_read(), 1);
        assert_eq!(cache.total_unread_count(), 0);
    }

    #[test]
    fn test_delete_by_id_and_time_range() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        for (id, t) in [("a", 100), ("b", 200), ("c", 300), ("d", 400)] {
            cache.insert_message(&key, received("c1", id, t));
        }
        assert!(cache.delete_message(&key, "a"));
        assert!(!cache.delete_message(&key, "a"));
        assert!(cache.delete_messages(&key, 200, 300));
        assert_eq!(ids(&cache.messages(&key)), vec!["d"]);
        assert!(!cache.delete_messages(&key, 500, 100));
        assert!(cache.load_message("b").is_none());

        assert!(cache.delete_all_messages(&key));
        assert!(cache.messages(&key).is_empty());
        assert_eq!(cache.stats().message_count, 0);
    }

    #[test]
    fn test_pin_sets_and_clears_time() {
        let cache = cache();
        let key = ConversationKey::group("g1");
        assert!(!cache.pin(&key, true));
        cache.get_or_create(&key, true);

        assert!(cache.pin(&key, true));
        let conv = cache.conversation(&key).unwrap();
        assert!(conv.is_pinned);
        assert!(conv.pinned_time > 0);

        assert!(cache.pin(&key, false));
        let conv = cache.conversation(&key).unwrap();
        assert!(!conv.is_pinned);
        assert_eq!(conv.pinned_time, 0);
    }

    #[test]
    fn test_update_message_rejects_backward_status() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        let mut msg = received("c1", "a", 100);
        msg.status = MessageStatus::Progress;
        cache.insert_message(&key, msg.clone());

        msg.status = MessageStatus::Create;
        assert!(!cache.update_message(&key, msg.clone()));

        msg.status = MessageStatus::Success;
        msg.server_time = 50;
        assert!(cache.update_message(&key, msg));
        assert!(!cache.update_message_status("a", MessageStatus::Fail));
        assert_eq!(cache.load_message("a").unwrap().status, MessageStatus::Success);
    }

    #[test]
    fn test_replace_message_with_server_id() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        cache.insert_message(&key, received("c1", "local-1", 100));
        let mut server = received("c1", "server-1", 100);
        server.status = MessageStatus::Success;
        assert!(cache.replace_message("local-1", server));
        assert!(cache.load_message("local-1").is_none());
        assert_eq!(ids(&cache.messages(&key)), vec!["server-1"]);
    }

    #[test]
    fn test_load_messages_paging() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            cache.insert_message(&key, received("c1", id, (i as i64 + 1) * 10));
        }
        let latest = cache.load_messages(&key, "", 2, MessageSearchDirection::Up);
        assert_eq!(ids(&latest), vec!["d", "e"]);
        let older = cache.load_messages(&key, "d", 2, MessageSearchDirection::Up);
        assert_eq!(ids(&older), vec!["b", "c"]);
        let newer = cache.load_messages(&key, "b", 10, MessageSearchDirection::Down);
        assert_eq!(ids(&newer), vec!["c", "d", "e"]);
        let oldest = cache.load_messages(&key, "", 2, MessageSearchDirection::Down);
        assert_eq!(ids(&oldest), vec!["a", "b"]);
        assert!(cache.load_messages(&key, "zzz", 2, MessageSearchDirection::Up).is_empty());

        let window = cache.load_messages_with_time(&key, 20, 40, 10);
        assert_eq!(ids(&window), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_keyword_and_type_search() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        let mut a = received("c1", "a", 10);
        a.body = MessageBody::text("Lunch plans");
        let mut b = received("c1", "b", 20);
        b.body = MessageBody::text("lunch moved");
        b.from = "alice".into();
        let mut c = received("c1", "c", 30);
        c.body = MessageBody::cmd("typing", true);
        c.set_attribute("note", AttributeValue::String("lunch".into()));
        for m in [a, b, c] {
            cache.insert_message(&key, m);
        }

        let hits = cache.load_messages_with_keyword(&key, "lunch", &MessageSearchOptions::new());
        assert_eq!(ids(&hits), vec!["a", "b"]);

        let opts = MessageSearchOptions::new().with_from("alice");
        assert_eq!(ids(&cache.load_messages_with_keyword(&key, "lunch", &opts)), vec!["b"]);

        let opts = MessageSearchOptions::new().with_scope(crate::model::MessageSearchScope::All);
        assert_eq!(ids(&cache.load_messages_with_keyword(&key, "lunch", &opts)), vec!["a", "b", "c"]);

        let opts = MessageSearchOptions::new().with_timestamp(30).with_max_count(1);
        assert_eq!(ids(&cache.load_messages_with_keyword(&key, "lunch", &opts)), vec!["b"]);

        let cmds = cache.load_messages_with_msg_types(&key, &[MessageBodyType::Cmd], &MessageSearchOptions::new());
        assert_eq!(ids(&cmds), vec!["c"]);
    }

    #[test]
    fn test_search_across_conversations() {
        let cache = cache();
        let mut x = received("c1", "x", 30);
        x.body = MessageBody::text("meeting at 3");
        let mut y = received("g1", "y", 10);
        y.chat_type = ConversationType::Group;
        y.body = MessageBody::text("Meeting notes");
        cache.import_messages(vec![x, y]);

        let hits = cache.search_messages("meeting", &MessageSearchOptions::new());
        assert_eq!(ids(&hits), vec!["y", "x"]);
        let newest = cache.search_messages("meeting", &MessageSearchOptions::new().with_max_count(1));
        assert_eq!(ids(&newest), vec!["x"]);
    }

    #[test]
    fn test_load_all_conversations_ordering() {
        let cache = cache();
        cache.insert_message(&ConversationKey::direct("old"), received("old", "a", 10));
        cache.insert_message(&ConversationKey::direct("new"), received("new", "b", 20));
        cache.insert_message(&ConversationKey::direct("pinned"), received("pinned", "c", 1));
        cache.get_or_create(&ConversationKey::direct("empty"), true);
        cache.set_pinned(&ConversationKey::direct("pinned"), true, 5);

        let order: Vec<String> = cache.load_all_conversations().into_iter().map(|c| c.id).collect();
        assert_eq!(order, vec!["pinned", "new", "old"]);

        let config = ChatSyncConfig {
            enable_empty_conversation: true,
            ..ChatSyncConfig::default()
        };
        let cache = ConversationCache::new(&config);
        cache.get_or_create(&ConversationKey::direct("empty"), true);
        assert_eq!(cache.load_all_conversations().len(), 1);
    }

    #[test]
    fn test_delete_conversation_keeps_messages_when_asked() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        cache.insert_message(&key, received("c1", "a", 1));

        assert!(cache.delete_conversation(&key, false));
        assert!(cache.conversation(&key).is_none());
        assert!(cache.load_message("a").is_some());
        cache.get_or_create(&key, true);
        assert_eq!(ids(&cache.messages(&key)), vec!["a"]);

        assert!(cache.delete_conversation(&key, true));
        assert!(cache.load_message("a").is_none());
        assert!(!cache.delete_conversation(&key, true));
    }

    #[test]
    fn test_hydrate_and_acks() {
        let cache = cache();
        let mut last = received("g1", "m9", 99);
        last.chat_type = ConversationType::Group;
        last.direction = MessageDirection::Send;
        let remote = RemoteConversation {
            conversation: Conversation {
                is_pinned: true,
                pinned_time: 0,
                ..Conversation::new(&ConversationKey::group("g1"))
            },
            last_message: Some(last),
        };
        assert_eq!(cache.hydrate(vec![remote]), 1);
        let key = ConversationKey::group("g1");
        let conv = cache.conversation(&key).unwrap();
        assert_eq!(conv.pinned_time, 1);
        assert_eq!(cache.last_message(&key).unwrap().msg_id, "m9");

        assert_eq!(cache.apply_delivery_acks(&["m9".to_string()]), 1);
        assert_eq!(cache.apply_delivery_acks(&["m9".to_string()]), 0);
        assert!(cache.apply_conversation_read(&key));
        assert!(cache.load_message("m9").unwrap().has_read_ack);

        assert!(cache.replace_body("m9", MessageBody::text("edited")));
        assert!(cache.load_message("m9").unwrap().is_content_replaced);
        assert_eq!(cache.remove_messages(&["m9".to_string(), "nope".to_string()]), 1);
    }

    #[test]
    fn test_import_respects_read_flag() {
        let config = ChatSyncConfig {
            regard_import_msg_as_read: true,
            ..ChatSyncConfig::default()
        };
        let cache = ConversationCache::new(&config);
        cache.import_messages(vec![received("c1", "a", 1)]);
        assert_eq!(cache.unread_count(&ConversationKey::direct("c1")), 0);
        assert_eq!(cache.last_received_message(&ConversationKey::direct("c1")).unwrap().msg_id, "a");
    }

    #[test]
    fn test_rewrite_keeps_final_status() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        let mut sent = received("c1", "a", 1);
        sent.status = MessageStatus::Success;
        cache.insert_message(&key, sent);

        let mut stale = received("c1", "a", 1);
        stale.status = MessageStatus::Create;
        assert!(cache.insert_message(&key, stale.clone()));
        assert_eq!(cache.load_message("a").unwrap().status, MessageStatus::Success);

        stale.status = MessageStatus::Progress;
        assert!(cache.append_message(&key, stale.clone()));
        assert_eq!(cache.load_message("a").unwrap().status, MessageStatus::Success);

        stale.status = MessageStatus::Fail;
        cache.import_messages(vec![stale]);
        assert_eq!(cache.load_message("a").unwrap().status, MessageStatus::Success);
        assert_eq!(cache.stats().message_count, 1);
    }

    #[test]
    fn test_rewrite_allows_forward_status() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        let mut msg = received("c1", "a", 1);
        msg.status = MessageStatus::Progress;
        cache.insert_message(&key, msg.clone());
        msg.status = MessageStatus::Fail;
        cache.insert_message(&key, msg);
        assert_eq!(cache.load_message("a").unwrap().status, MessageStatus::Fail);
    }

    #[test]
    fn test_hydrate_keeps_local_message_state() {
        let cache = cache();
        let key = ConversationKey::group("g1");
        let mut local = received("g1", "m1", 10);
        local.chat_type = ConversationType::Group;
        local.status = MessageStatus::Success;
        cache.insert_message(&key, local.clone());
        assert!(cache.mark_message_as_read(&key, "m1"));
        cache.apply_delivery_acks(&["m1".to_string()]);

        let mut remote_last = local;
        remote_last.status = MessageStatus::Create;
        remote_last.is_read = false;
        let remote = RemoteConversation {
            conversation: Conversation::new(&key),
            last_message: Some(remote_last),
        };
        cache.hydrate(vec![remote]);

        let stored = cache.load_message("m1").unwrap();
        assert_eq!(stored.status, MessageStatus::Success);
        assert!(stored.is_read);
        assert!(stored.has_deliver_ack);
        assert_eq!(cache.unread_count(&key), 0);
    }

    #[test]
    fn test_redelivery_keeps_read_and_ack_flags() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        cache.insert_message(&key, received("c1", "a", 1));
        assert!(cache.mark_message_as_read(&key, "a"));
        let mut acked = cache.load_message("a").unwrap();
        acked.has_read_ack = true;
        acked.has_deliver_ack = true;
        assert!(cache.update_message(&key, acked));

        cache.insert_message(&key, received("c1", "a", 1));
        let stored = cache.load_message("a").unwrap();
        assert!(stored.is_read);
        assert!(stored.has_read_ack);
        assert!(stored.has_deliver_ack);
        assert_eq!(cache.unread_count(&key), 0);
    }

    #[test]
    fn test_insert_rejects_chat_type_mismatch() {
        let cache = cache();
        let group = ConversationKey::group("c1");
        assert!(!cache.insert_message(&group, received("c1", "a", 1)));
        assert!(!cache.append_message(&group, received("c1", "a", 1)));
        assert!(cache.conversation(&group).is_none());
        assert!(cache.load_message("a").is_none());
    }

    #[test]
    fn test_load_down_with_unbounded_count() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        for (id, t) in [("a", 1), ("b", 2), ("c", 3)] {
            cache.insert_message(&key, received("c1", id, t));
        }
        let after_a = cache.load_messages(&key, "a", usize::MAX, MessageSearchDirection::Down);
        assert_eq!(ids(&after_a), vec!["b", "c"]);
        let after_c = cache.load_messages(&key, "c", usize::MAX, MessageSearchDirection::Down);
        assert!(after_c.is_empty());
        let before_c = cache.load_messages(&key, "c", usize::MAX, MessageSearchDirection::Up);
        assert_eq!(ids(&before_c), vec!["a", "b"]);
    }

    #[test]
    fn test_recreated_conversation_reclaims_retained_messages() {
        let cache = cache();
        let key = ConversationKey::direct("c1");
        cache.insert_message(&key, received("c1", "a", 1));
        assert!(cache.delete_conversation(&key, false));
        assert_eq!(cache.stats().message_count, 1);

        // 新消息到达时会话重建，保留的旧消息回到时间线
        cache.insert_message(&key, received("c1", "b", 2));
        assert_eq!(ids(&cache.messages(&key)), vec!["a", "b"]);
        assert_eq!(cache.unread_count(&key), 2);

        cache.clear();
        assert_eq!(cache.stats().message_count, 0);
    }
}
