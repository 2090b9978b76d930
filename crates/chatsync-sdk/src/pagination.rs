//! 游标分页
//!
//! 每次 `fetch` 只做一次往返、只返回一页，循环与退避留给调用方：
//! - 第一页用空游标（或调用方给的起点），之后把上一页返回的游标原样传回
//! - 空页或游标不再前进即到达末尾
//! - page_size 超出资源允许的范围时在发请求之前同步报 `Validation` 错误
//!
//! 列表项的解码函数由调用方提供，单项解码失败只记告警并跳过。

use serde_json::{json, Map, Value};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::callback::{await_result, ValueCallBack};
use crate::error::{ChatSyncError, Result};
use crate::invoker::Invoker;
use crate::methods;
use crate::model::{ConversationKey, CursorPage, FetchServerMessagesOption, PageResult};
use crate::registry::PendingRequest;

const SMALL_PAGE: RangeInclusive<u32> = 1..=50;
const JOINED_GROUP_PAGE: RangeInclusive<u32> = 1..=20;
const LARGE_PAGE: RangeInclusive<u32> = 1..=200;

/// 游标分页的资源
#[derive(Debug, Clone, PartialEq)]
pub enum PagedResource {
    /// 会话历史消息
    Messages {
        conversation: ConversationKey,
        option: FetchServerMessagesOption,
    },
    /// 服务端会话列表
    Conversations { pinned_only: bool },
    GroupMembers { group_id: String },
    PublicGroups,
    RoomMembers { room_id: String },
    ThreadMembers { thread_id: String },
    /// 群组下的全部子区
    GroupThreads { group_id: String },
    /// 当前用户加入的子区，`group_id` 为 None 时不限群组
    JoinedThreads { group_id: Option<String> },
    Contacts,
    GroupReadAcks { group_id: String, msg_id: String },
    ReactionDetail { msg_id: String, reaction: String },
}

impl PagedResource {
    pub fn method(&self) -> &'static str {
        match self {
            PagedResource::Messages { .. } => methods::FETCH_HISTORY_MESSAGES,
            PagedResource::Conversations { pinned_only: false } => methods::FETCH_CONVERSATIONS,
            PagedResource::Conversations { pinned_only: true } => {
                methods::FETCH_PINNED_CONVERSATIONS
            }
            PagedResource::GroupMembers { .. } => methods::FETCH_GROUP_MEMBERS,
            PagedResource::PublicGroups => methods::FETCH_PUBLIC_GROUPS,
            PagedResource::RoomMembers { .. } => methods::FETCH_ROOM_MEMBERS,
            PagedResource::ThreadMembers { .. } => methods::FETCH_THREAD_MEMBERS,
            PagedResource::GroupThreads { .. } => methods::FETCH_GROUP_THREADS,
            PagedResource::JoinedThreads { .. } => methods::FETCH_JOINED_THREADS,
            PagedResource::Contacts => methods::FETCH_CONTACTS,
            PagedResource::GroupReadAcks { .. } => methods::FETCH_GROUP_READ_ACKS,
            PagedResource::ReactionDetail { .. } => methods::FETCH_REACTION_DETAIL,
        }
    }

    /// 允许的 page_size 范围
    pub fn page_size_range(&self) -> RangeInclusive<u32> {
        match self {
            PagedResource::GroupMembers { .. }
            | PagedResource::PublicGroups
            | PagedResource::RoomMembers { .. } => LARGE_PAGE,
            _ => SMALL_PAGE,
        }
    }

    pub fn validate_page_size(&self, page_size: u32) -> Result<()> {
        check_range(self.method(), self.page_size_range(), page_size)
    }

    /// 请求参数：资源自身参数 + cursor + page_size
    pub fn params(&self, cursor: &str, page_size: u32) -> Value {
        let mut params = match self {
            PagedResource::Messages {
                conversation,
                option,
            } => json!({
                "conversation_id": conversation.id,
                "type": conversation.conv_type,
                "is_thread": conversation.is_thread,
                "direction": option.direction,
                "from": option.from,
                "msg_types": option.msg_types,
                "start_time": option.start_time,
                "end_time": option.end_time,
            }),
            PagedResource::Conversations { .. }
            | PagedResource::PublicGroups
            | PagedResource::Contacts => json!({}),
            PagedResource::GroupMembers { group_id } | PagedResource::GroupThreads { group_id } => {
                json!({ "group_id": group_id })
            }
            PagedResource::RoomMembers { room_id } => json!({ "room_id": room_id }),
            PagedResource::ThreadMembers { thread_id } => json!({ "thread_id": thread_id }),
            PagedResource::JoinedThreads { group_id } => json!({ "group_id": group_id }),
            PagedResource::GroupReadAcks { group_id, msg_id } => {
                json!({ "group_id": group_id, "msg_id": msg_id })
            }
            PagedResource::ReactionDetail { msg_id, reaction } => {
                json!({ "msg_id": msg_id, "reaction": reaction })
            }
        };
        if let Value::Object(map) = &mut params {
            map.insert("cursor".into(), Value::String(cursor.to_string()));
            map.insert("page_size".into(), Value::from(page_size));
        }
        params
    }
}

/// 页码分页的资源（总量小、无需游标）
#[derive(Debug, Clone, PartialEq)]
pub enum NumberedResource {
    PublicRooms,
    JoinedGroups {
        need_member_count: bool,
        need_role: bool,
    },
    GroupBlockList { group_id: String },
    GroupMuteList { group_id: String },
    GroupAllowList { group_id: String },
    RoomBlockList { room_id: String },
    RoomMuteList { room_id: String },
    SubscribedPresences,
    GroupSharedFiles { group_id: String },
}

impl NumberedResource {
    pub fn method(&self) -> &'static str {
        match self {
            NumberedResource::PublicRooms => methods::FETCH_PUBLIC_ROOMS,
            NumberedResource::JoinedGroups { .. } => methods::FETCH_JOINED_GROUPS,
            NumberedResource::GroupBlockList { .. } => methods::FETCH_GROUP_BLOCK_LIST,
            NumberedResource::GroupMuteList { .. } => methods::FETCH_GROUP_MUTE_LIST,
            NumberedResource::GroupAllowList { .. } => methods::FETCH_GROUP_ALLOW_LIST,
            NumberedResource::RoomBlockList { .. } => methods::FETCH_ROOM_BLOCK_LIST,
            NumberedResource::RoomMuteList { .. } => methods::FETCH_ROOM_MUTE_LIST,
            NumberedResource::SubscribedPresences => methods::FETCH_SUBSCRIBED_PRESENCES,
            NumberedResource::GroupSharedFiles { .. } => methods::FETCH_GROUP_SHARED_FILES,
        }
    }

    pub fn page_size_range(&self) -> RangeInclusive<u32> {
        match self {
            NumberedResource::JoinedGroups { .. } => JOINED_GROUP_PAGE,
            _ => LARGE_PAGE,
        }
    }

    pub fn validate(&self, page_number: u32, page_size: u32) -> Result<()> {
        if page_number == 0 {
            return Err(ChatSyncError::Validation(format!(
                "{}: page_number starts at 1",
                self.method()
            )));
        }
        check_range(self.method(), self.page_size_range(), page_size)
    }

    pub fn params(&self, page_number: u32, page_size: u32) -> Value {
        let mut params = match self {
            NumberedResource::PublicRooms | NumberedResource::SubscribedPresences => json!({}),
            NumberedResource::JoinedGroups {
                need_member_count,
                need_role,
            } => json!({ "need_member_count": need_member_count, "need_role": need_role }),
            NumberedResource::GroupBlockList { group_id }
            | NumberedResource::GroupMuteList { group_id }
            | NumberedResource::GroupAllowList { group_id }
            | NumberedResource::GroupSharedFiles { group_id } => json!({ "group_id": group_id }),
            NumberedResource::RoomBlockList { room_id }
            | NumberedResource::RoomMuteList { room_id } => json!({ "room_id": room_id }),
        };
        if let Value::Object(map) = &mut params {
            map.insert("page_number".into(), Value::from(page_number));
            map.insert("page_size".into(), Value::from(page_size));
        }
        params
    }
}

fn check_range(method: &str, range: RangeInclusive<u32>, page_size: u32) -> Result<()> {
    if range.contains(&page_size) {
        Ok(())
    } else {
        Err(ChatSyncError::Validation(format!(
            "{}: page_size {} out of range [{}, {}]",
            method,
            page_size,
            range.start(),
            range.end()
        )))
    }
}

fn take_list(map: &mut Map<String, Value>) -> Result<Vec<Value>> {
    match map.remove("list").or_else(|| map.remove("data")) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ChatSyncError::Decode(format!(
            "page list must be an array, got {}",
            other
        ))),
    }
}

fn decode_items<T, D>(method: &str, items: Vec<Value>, decode: &D) -> Vec<T>
where
    D: Fn(Value) -> Result<T>,
{
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match decode(item) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{}: skipping undecodable item #{}: {}", method, index, e);
                None
            }
        })
        .collect()
}

/// 解码 `{cursor, list}` 形式的响应
pub fn decode_cursor_page<T, D>(method: &str, payload: Value, decode: &D) -> Result<CursorPage<T>>
where
    D: Fn(Value) -> Result<T>,
{
    let mut map = match payload {
        Value::Object(map) => map,
        Value::Null => return Ok(CursorPage::default()),
        other => {
            return Err(ChatSyncError::Decode(format!(
                "cursor page must be an object, got {}",
                other
            )))
        }
    };
    let cursor = match map.remove("cursor") {
        Some(Value::String(cursor)) => cursor,
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            return Err(ChatSyncError::Decode(format!(
                "cursor must be a string, got {}",
                other
            )))
        }
    };
    let items = take_list(&mut map)?;
    let total = items.len();
    let data = decode_items(method, items, decode);
    let skipped = total - data.len();
    Ok(CursorPage::new(cursor, data).with_skipped(skipped))
}

/// 解码 `{count, list}` 形式的响应
pub fn decode_page_result<T, D>(method: &str, payload: Value, decode: &D) -> Result<PageResult<T>>
where
    D: Fn(Value) -> Result<T>,
{
    let mut map = match payload {
        Value::Object(map) => map,
        Value::Null => return Ok(PageResult::default()),
        other => {
            return Err(ChatSyncError::Decode(format!(
                "page result must be an object, got {}",
                other
            )))
        }
    };
    let items = take_list(&mut map)?;
    let raw_count = items.len();
    let page_count = map
        .remove("count")
        .and_then(|v| v.as_u64())
        .map(|c| c as usize)
        .unwrap_or(raw_count);
    let data = decode_items(method, items, decode);
    let skipped = raw_count - data.len();
    Ok(PageResult {
        page_count,
        data,
        skipped,
    })
}

/// 分页引擎
#[derive(Clone)]
pub struct PaginationEngine {
    invoker: Invoker,
}

impl PaginationEngine {
    pub fn new(invoker: Invoker) -> Self {
        Self { invoker }
    }

    /// 拉取一页
    ///
    /// 参数校验失败时同步返回 `Err`，请求不会发出，回调也不会被调用。
    pub fn fetch<T, D>(
        &self,
        resource: &PagedResource,
        cursor: &str,
        page_size: u32,
        decode: D,
        callback: ValueCallBack<CursorPage<T>>,
    ) -> Result<()>
    where
        T: Send + 'static,
        D: Fn(Value) -> Result<T> + Send + 'static,
    {
        resource.validate_page_size(page_size)?;
        let method = resource.method();
        debug!("Fetching {} cursor='{}' page_size={}", method, cursor, page_size);
        let request = PendingRequest::from_value_callback(
            method,
            move |payload| decode_cursor_page(method, payload, &decode),
            callback,
        );
        self.invoker
            .invoke(method, resource.params(cursor, page_size), request);
        Ok(())
    }

    /// `fetch` 的 async 版本
    pub async fn fetch_page<T, D>(
        &self,
        resource: &PagedResource,
        cursor: &str,
        page_size: u32,
        decode: D,
    ) -> Result<CursorPage<T>>
    where
        T: Send + 'static,
        D: Fn(Value) -> Result<T> + Send + 'static,
    {
        let (callback, rx) = ValueCallBack::channel();
        self.fetch(resource, cursor, page_size, decode, callback)?;
        await_result(rx).await
    }

    /// 页码分页，`page_number` 从 1 开始
    pub fn fetch_numbered<T, D>(
        &self,
        resource: &NumberedResource,
        page_number: u32,
        page_size: u32,
        decode: D,
        callback: ValueCallBack<PageResult<T>>,
    ) -> Result<()>
    where
        T: Send + 'static,
        D: Fn(Value) -> Result<T> + Send + 'static,
    {
        resource.validate(page_number, page_size)?;
        let method = resource.method();
        debug!("Fetching {} page={} page_size={}", method, page_number, page_size);
        let request = PendingRequest::from_value_callback(
            method,
            move |payload| decode_page_result(method, payload, &decode),
            callback,
        );
        self.invoker
            .invoke(method, resource.params(page_number, page_size), request);
        Ok(())
    }

    pub async fn fetch_numbered_page<T, D>(
        &self,
        resource: &NumberedResource,
        page_number: u32,
        page_size: u32,
        decode: D,
    ) -> Result<PageResult<T>>
    where
        T: Send + 'static,
        D: Fn(Value) -> Result<T> + Send + 'static,
    {
        let (callback, rx) = ValueCallBack::channel();
        self.fetch_numbered(resource, page_number, page_size, decode, callback)?;
        await_result(rx).await
    }

    /// 创建一个从 `seed` 开始的拉取器
    pub fn pager<T, D>(
        &self,
        resource: PagedResource,
        seed: impl Into<String>,
        page_size: u32,
        decode: D,
    ) -> Result<CursorPager<T>>
    where
        T: Send + 'static,
        D: Fn(Value) -> Result<T> + Send + Sync + 'static,
    {
        resource.validate_page_size(page_size)?;
        let seed = seed.into();
        Ok(CursorPager {
            engine: self.clone(),
            resource,
            cursor: seed.clone(),
            seed,
            page_size,
            finished: false,
            decode: Arc::new(decode),
        })
    }
}

/// 惰性、可重启的逐页拉取器
///
/// 每次 `next_page` 恰好发出一次请求；到达末尾后不再发请求，`restart` 回到起点。
pub struct CursorPager<T> {
    engine: PaginationEngine,
    resource: PagedResource,
    seed: String,
    cursor: String,
    page_size: u32,
    finished: bool,
    decode: Arc<dyn Fn(Value) -> Result<T> + Send + Sync>,
}

impl<T: Send + 'static> CursorPager<T> {
    /// 拉取下一页；已到末尾时返回 `Ok(None)`
    pub async fn next_page(&mut self) -> Result<Option<CursorPage<T>>> {
        if self.finished {
            return Ok(None);
        }
        let decode = self.decode.clone();
        let page = self
            .engine
            .fetch_page(&self.resource, &self.cursor, self.page_size, move |v| decode(v))
            .await?;
        if page.is_end_of_stream(&self.cursor) {
            self.finished = true;
        }
        self.cursor = page.cursor.clone();
        Ok(Some(page))
    }

    /// 回到起始游标
    pub fn restart(&mut self) {
        self.cursor = self.seed.clone();
        self.finished = false;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn resource(&self) -> &PagedResource {
        &self.resource
    }
}
