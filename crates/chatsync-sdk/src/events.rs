//! 事件系统模块 - 服务端推送事件的解码与分发
//!
//! 功能包括：
//! - 按类别（连接、消息、联系人、群组、聊天室、在线状态、子区、多设备）解码推送
//! - 按注册顺序同步通知该类别的全部监听器
//! - 同时广播到 tokio broadcast 通道，供 async 消费方订阅
//! - 事件统计
//!
//! 分发在推送所在线程上同步完成，没有内部队列；监听器里不要做长时间阻塞的工作。

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{ChatSyncError, Result};
use crate::listener::AnyListener;
use crate::model::{
    ChatThreadEvent, ConversationType, Group, GroupReadAck, Message, MessagePinInfo,
    MessageReactionChange, MultiDevicesOperation, Presence, RecallMessageInfo, Room,
};
use crate::utils::now_millis;

/// 监听器类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Connection,
    Chat,
    Contact,
    Group,
    Room,
    Presence,
    Thread,
    MultiDevice,
}

impl EventCategory {
    pub const ALL: [EventCategory; 8] = [
        EventCategory::Connection,
        EventCategory::Chat,
        EventCategory::Contact,
        EventCategory::Group,
        EventCategory::Room,
        EventCategory::Presence,
        EventCategory::Thread,
        EventCategory::MultiDevice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Connection => "connection",
            EventCategory::Chat => "chat",
            EventCategory::Contact => "contact",
            EventCategory::Group => "group",
            EventCategory::Room => "room",
            EventCategory::Presence => "presence",
            EventCategory::Thread => "thread",
            EventCategory::MultiDevice => "multi_device",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 连接事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    TokenWillExpire,
    TokenExpired,
    /// 账号在其他设备登录
    LoggedOtherDevice { device_name: String },
    RemovedFromServer,
    ForbidByServer,
    ChangedPassword,
    LoginTooManyDevice,
    KickedByOtherDevice,
    AuthFailed,
    AppActiveNumberReachLimit,
}

/// 消息事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ChatEvent {
    MessagesReceived(Vec<Message>),
    CmdMessagesReceived(Vec<Message>),
    /// 对方已读了这些消息
    MessagesRead(Vec<Message>),
    MessagesDelivered(Vec<Message>),
    MessagesRecalled(Vec<RecallMessageInfo>),
    ReadAckForGroupMessageUpdated,
    GroupMessageRead(Vec<GroupReadAck>),
    ConversationsUpdated,
    /// 对方读完了整个会话
    ConversationRead { from: String, to: String },
    ReactionChanged(Vec<MessageReactionChange>),
    MessageContentChanged {
        message: Message,
        operator_id: String,
        operation_time: i64,
    },
    MessagePinChanged {
        message_id: String,
        conversation_id: String,
        is_pinned: bool,
        pin_info: MessagePinInfo,
    },
}

/// 联系人事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ContactEvent {
    ContactAdded { user_id: String },
    ContactDeleted { user_id: String },
    ContactInvited {
        user_id: String,
        #[serde(default)]
        reason: String,
    },
    FriendRequestAccepted { user_id: String },
    FriendRequestDeclined { user_id: String },
}

/// 群组事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum GroupEvent {
    InvitationReceived {
        group_id: String,
        #[serde(default)]
        group_name: String,
        inviter: String,
        #[serde(default)]
        reason: String,
    },
    RequestToJoinReceived {
        group_id: String,
        #[serde(default)]
        group_name: String,
        applicant: String,
        #[serde(default)]
        reason: String,
    },
    RequestToJoinAccepted {
        group_id: String,
        #[serde(default)]
        group_name: String,
        accepter: String,
    },
    RequestToJoinDeclined {
        group_id: String,
        #[serde(default)]
        group_name: String,
        decliner: String,
        #[serde(default)]
        reason: String,
    },
    InvitationAccepted {
        group_id: String,
        invitee: String,
        #[serde(default)]
        reason: String,
    },
    InvitationDeclined {
        group_id: String,
        invitee: String,
        #[serde(default)]
        reason: String,
    },
    /// 当前用户被移出群组
    UserRemoved {
        group_id: String,
        #[serde(default)]
        group_name: String,
    },
    GroupDestroyed {
        group_id: String,
        #[serde(default)]
        group_name: String,
    },
    AutoAcceptInvitation {
        group_id: String,
        inviter: String,
        #[serde(default)]
        invite_message: String,
    },
    MuteListAdded {
        group_id: String,
        mutes: Vec<String>,
        #[serde(default)]
        mute_expire: i64,
    },
    MuteListRemoved { group_id: String, mutes: Vec<String> },
    AdminAdded { group_id: String, admin: String },
    AdminRemoved { group_id: String, admin: String },
    OwnerChanged {
        group_id: String,
        new_owner: String,
        old_owner: String,
    },
    MemberJoined { group_id: String, member: String },
    MemberExited { group_id: String, member: String },
    AnnouncementChanged { group_id: String, announcement: String },
    AllowListAdded { group_id: String, members: Vec<String> },
    AllowListRemoved { group_id: String, members: Vec<String> },
    AllMemberMuteChanged { group_id: String, is_all_muted: bool },
    SpecificationChanged(Group),
    DisabledStateChanged { group_id: String, is_disabled: bool },
}

/// 聊天室事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    Destroyed {
        room_id: String,
        #[serde(default)]
        room_name: String,
    },
    MemberJoined { room_id: String, member: String },
    MemberExited {
        room_id: String,
        #[serde(default)]
        room_name: String,
        member: String,
    },
    /// 当前用户被移出聊天室
    RemovedFromRoom {
        room_id: String,
        #[serde(default)]
        room_name: String,
        #[serde(default)]
        reason: String,
    },
    MuteListAdded {
        room_id: String,
        mutes: Vec<String>,
        #[serde(default)]
        expire_time: i64,
    },
    MuteListRemoved { room_id: String, mutes: Vec<String> },
    AdminAdded { room_id: String, admin: String },
    AdminRemoved { room_id: String, admin: String },
    OwnerChanged {
        room_id: String,
        new_owner: String,
        old_owner: String,
    },
    AnnouncementChanged { room_id: String, announcement: String },
    AllowListAdded { room_id: String, members: Vec<String> },
    AllowListRemoved { room_id: String, members: Vec<String> },
    AllMemberMuteChanged { room_id: String, is_all_muted: bool },
    SpecificationChanged(Room),
    AttributesChanged {
        room_id: String,
        attributes: HashMap<String, String>,
        #[serde(default)]
        from: String,
    },
    AttributesRemoved {
        room_id: String,
        keys: Vec<String>,
        #[serde(default)]
        from: String,
    },
}

/// 在线状态事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum PresenceEvent {
    PresenceUpdated(Vec<Presence>),
}

/// 子区事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ThreadEvent {
    ThreadCreated(ChatThreadEvent),
    ThreadUpdated(ChatThreadEvent),
    ThreadDestroyed(ChatThreadEvent),
    UserKicked(ChatThreadEvent),
}

/// 多设备事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum MultiDeviceEvent {
    ContactEvent {
        operation: MultiDevicesOperation,
        target: String,
        #[serde(default)]
        ext: String,
    },
    GroupEvent {
        operation: MultiDevicesOperation,
        target: String,
        #[serde(default)]
        usernames: Vec<String>,
    },
    ThreadEvent {
        operation: MultiDevicesOperation,
        target: String,
        #[serde(default)]
        usernames: Vec<String>,
    },
    ConversationEvent {
        operation: MultiDevicesOperation,
        conversation_id: String,
        conv_type: ConversationType,
    },
    RoamMessageRemoved {
        conversation_id: String,
        #[serde(default)]
        device_id: String,
    },
}

/// 解码后的推送事件
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connection(ConnectionEvent),
    Chat(ChatEvent),
    Contact(ContactEvent),
    Group(GroupEvent),
    Room(RoomEvent),
    Presence(PresenceEvent),
    Thread(ThreadEvent),
    MultiDevice(MultiDeviceEvent),
}

fn decode_tagged<E: DeserializeOwned>(discriminant: &str, payload: Value) -> Result<E> {
    let mut envelope = Map::new();
    envelope.insert("event".into(), Value::String(discriminant.to_string()));
    if !payload.is_null() {
        envelope.insert("payload".into(), payload);
    }
    serde_json::from_value(Value::Object(envelope)).map_err(|e| {
        ChatSyncError::Decode(format!("event '{}': {}", discriminant, e))
    })
}

impl ConnectionEvent {
    /// 事件名，与解码时的 snake_case 名称一致
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionEvent::Connected => "connected",
            ConnectionEvent::Disconnected => "disconnected",
            ConnectionEvent::TokenWillExpire => "token_will_expire",
            ConnectionEvent::TokenExpired => "token_expired",
            ConnectionEvent::LoggedOtherDevice { .. } => "logged_other_device",
            ConnectionEvent::RemovedFromServer => "removed_from_server",
            ConnectionEvent::ForbidByServer => "forbid_by_server",
            ConnectionEvent::ChangedPassword => "changed_password",
            ConnectionEvent::LoginTooManyDevice => "login_too_many_device",
            ConnectionEvent::KickedByOtherDevice => "kicked_by_other_device",
            ConnectionEvent::AuthFailed => "auth_failed",
            ConnectionEvent::AppActiveNumberReachLimit => "app_active_number_reach_limit",
        }
    }
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::MessagesReceived(_) => "messages_received",
            ChatEvent::CmdMessagesReceived(_) => "cmd_messages_received",
            ChatEvent::MessagesRead(_) => "messages_read",
            ChatEvent::MessagesDelivered(_) => "messages_delivered",
            ChatEvent::MessagesRecalled(_) => "messages_recalled",
            ChatEvent::ReadAckForGroupMessageUpdated => "read_ack_for_group_message_updated",
            ChatEvent::GroupMessageRead(_) => "group_message_read",
            ChatEvent::ConversationsUpdated => "conversations_updated",
            ChatEvent::ConversationRead { .. } => "conversation_read",
            ChatEvent::ReactionChanged(_) => "reaction_changed",
            ChatEvent::MessageContentChanged { .. } => "message_content_changed",
            ChatEvent::MessagePinChanged { .. } => "message_pin_changed",
        }
    }
}

impl ContactEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ContactEvent::ContactAdded { .. } => "contact_added",
            ContactEvent::ContactDeleted { .. } => "contact_deleted",
            ContactEvent::ContactInvited { .. } => "contact_invited",
            ContactEvent::FriendRequestAccepted { .. } => "friend_request_accepted",
            ContactEvent::FriendRequestDeclined { .. } => "friend_request_declined",
        }
    }
}

impl GroupEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GroupEvent::InvitationReceived { .. } => "invitation_received",
            GroupEvent::RequestToJoinReceived { .. } => "request_to_join_received",
            GroupEvent::RequestToJoinAccepted { .. } => "request_to_join_accepted",
            GroupEvent::RequestToJoinDeclined { .. } => "request_to_join_declined",
            GroupEvent::InvitationAccepted { .. } => "invitation_accepted",
            GroupEvent::InvitationDeclined { .. } => "invitation_declined",
            GroupEvent::UserRemoved { .. } => "user_removed",
            GroupEvent::GroupDestroyed { .. } => "group_destroyed",
            GroupEvent::AutoAcceptInvitation { .. } => "auto_accept_invitation",
            GroupEvent::MuteListAdded { .. } => "mute_list_added",
            GroupEvent::MuteListRemoved { .. } => "mute_list_removed",
            GroupEvent::AdminAdded { .. } => "admin_added",
            GroupEvent::AdminRemoved { .. } => "admin_removed",
            GroupEvent::OwnerChanged { .. } => "owner_changed",
            GroupEvent::MemberJoined { .. } => "member_joined",
            GroupEvent::MemberExited { .. } => "member_exited",
            GroupEvent::AnnouncementChanged { .. } => "announcement_changed",
            GroupEvent::AllowListAdded { .. } => "allow_list_added",
            GroupEvent::AllowListRemoved { .. } => "allow_list_removed",
            GroupEvent::AllMemberMuteChanged { .. } => "all_member_mute_changed",
            GroupEvent::SpecificationChanged(_) => "specification_changed",
            GroupEvent::DisabledStateChanged { .. } => "disabled_state_changed",
        }
    }
}

impl RoomEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::Destroyed { .. } => "destroyed",
            RoomEvent::MemberJoined { .. } => "member_joined",
            RoomEvent::MemberExited { .. } => "member_exited",
            RoomEvent::RemovedFromRoom { .. } => "removed_from_room",
            RoomEvent::MuteListAdded { .. } => "mute_list_added",
            RoomEvent::MuteListRemoved { .. } => "mute_list_removed",
            RoomEvent::AdminAdded { .. } => "admin_added",
            RoomEvent::AdminRemoved { .. } => "admin_removed",
            RoomEvent::OwnerChanged { .. } => "owner_changed",
            RoomEvent::AnnouncementChanged { .. } => "announcement_changed",
            RoomEvent::AllowListAdded { .. } => "allow_list_added",
            RoomEvent::AllowListRemoved { .. } => "allow_list_removed",
            RoomEvent::AllMemberMuteChanged { .. } => "all_member_mute_changed",
            RoomEvent::SpecificationChanged(_) => "specification_changed",
            RoomEvent::AttributesChanged { .. } => "attributes_changed",
            RoomEvent::AttributesRemoved { .. } => "attributes_removed",
        }
    }
}

impl PresenceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PresenceEvent::PresenceUpdated(_) => "presence_updated",
        }
    }
}

impl ThreadEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ThreadEvent::ThreadCreated(_) => "thread_created",
            ThreadEvent::ThreadUpdated(_) => "thread_updated",
            ThreadEvent::ThreadDestroyed(_) => "thread_destroyed",
            ThreadEvent::UserKicked(_) => "user_kicked",
        }
    }
}

impl MultiDeviceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MultiDeviceEvent::ContactEvent { .. } => "contact_event",
            MultiDeviceEvent::GroupEvent { .. } => "group_event",
            MultiDeviceEvent::ThreadEvent { .. } => "thread_event",
            MultiDeviceEvent::ConversationEvent { .. } => "conversation_event",
            MultiDeviceEvent::RoamMessageRemoved { .. } => "roam_message_removed",
        }
    }
}

impl PushEvent {
    /// 边界解码：(类别, 事件名, 原始负载) → 强类型事件
    pub fn decode(category: EventCategory, discriminant: &str, payload: Value) -> Result<Self> {
        Ok(match category {
            EventCategory::Connection => PushEvent::Connection(decode_tagged(discriminant, payload)?),
            EventCategory::Chat => PushEvent::Chat(decode_tagged(discriminant, payload)?),
            EventCategory::Contact => PushEvent::Contact(decode_tagged(discriminant, payload)?),
            EventCategory::Group => PushEvent::Group(decode_tagged(discriminant, payload)?),
            EventCategory::Room => PushEvent::Room(decode_tagged(discriminant, payload)?),
            EventCategory::Presence => PushEvent::Presence(decode_tagged(discriminant, payload)?),
            EventCategory::Thread => PushEvent::Thread(decode_tagged(discriminant, payload)?),
            EventCategory::MultiDevice => {
                PushEvent::MultiDevice(decode_tagged(discriminant, payload)?)
            }
        })
    }

    pub fn category(&self) -> EventCategory {
        match self {
            PushEvent::Connection(_) => EventCategory::Connection,
            PushEvent::Chat(_) => EventCategory::Chat,
            PushEvent::Contact(_) => EventCategory::Contact,
            PushEvent::Group(_) => EventCategory::Group,
            PushEvent::Room(_) => EventCategory::Room,
            PushEvent::Presence(_) => EventCategory::Presence,
            PushEvent::Thread(_) => EventCategory::Thread,
            PushEvent::MultiDevice(_) => EventCategory::MultiDevice,
        }
    }

    /// 事件名（snake_case）
    pub fn discriminant(&self) -> &'static str {
        match self {
            PushEvent::Connection(e) => e.name(),
            PushEvent::Chat(e) => e.name(),
            PushEvent::Contact(e) => e.name(),
            PushEvent::Group(e) => e.name(),
            PushEvent::Room(e) => e.name(),
            PushEvent::Presence(e) => e.name(),
            PushEvent::Thread(e) => e.name(),
            PushEvent::MultiDevice(e) => e.name(),
        }
    }

    /// 统计用的键："类别.事件名"
    pub fn event_type(&self) -> String {
        format!("{}.{}", self.category(), self.discriminant())
    }
}

/// 同一类别的监听器列表：保持注册顺序，同一实例只出现一次
pub struct ListenerGroup<L: ?Sized> {
    listeners: Vec<Arc<L>>,
}

impl<L: ?Sized> Default for ListenerGroup<L> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }
}

impl<L: ?Sized> ListenerGroup<L> {
    fn same(a: &Arc<L>, b: &Arc<L>) -> bool {
        Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
    }

    /// 已注册时返回 false
    pub fn add(&mut self, listener: Arc<L>) -> bool {
        if self.listeners.iter().any(|l| Self::same(l, &listener)) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// 未注册时返回 false，不视为错误
    pub fn remove(&mut self, listener: &Arc<L>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Self::same(l, listener));
        self.listeners.len() != before
    }

    pub fn snapshot(&self) -> Vec<Arc<L>> {
        self.listeners.clone()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

use crate::listener::{
    ChatListener, ConnectionListener, ContactListener, GroupListener, MultiDeviceListener,
    PresenceListener, RoomListener, ThreadListener,
};

#[derive(Default)]
struct ListenerGroups {
    connection: ListenerGroup<dyn ConnectionListener>,
    chat: ListenerGroup<dyn ChatListener>,
    contact: ListenerGroup<dyn ContactListener>,
    group: ListenerGroup<dyn GroupListener>,
    room: ListenerGroup<dyn RoomListener>,
    presence: ListenerGroup<dyn PresenceListener>,
    thread: ListenerGroup<dyn ThreadListener>,
    multi_device: ListenerGroup<dyn MultiDeviceListener>,
}

impl ListenerGroups {
    fn count(&self, category: EventCategory) -> usize {
        match category {
            EventCategory::Connection => self.connection.len(),
            EventCategory::Chat => self.chat.len(),
            EventCategory::Contact => self.contact.len(),
            EventCategory::Group => self.group.len(),
            EventCategory::Room => self.room.len(),
            EventCategory::Presence => self.presence.len(),
            EventCategory::Thread => self.thread.len(),
            EventCategory::MultiDevice => self.multi_device.len(),
        }
    }

    fn total(&self) -> usize {
        EventCategory::ALL.iter().map(|c| self.count(*c)).sum()
    }
}

/// 事件统计信息
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    /// 总事件数
    pub total_events: u64,
    /// 按类型分组的事件数
    pub events_by_type: HashMap<String, u64>,
    /// 解码失败而被丢弃的推送数
    pub decode_failures: u64,
    /// 监听器数量
    pub listener_count: usize,
    /// 最后事件时间
    pub last_event_time: Option<i64>,
}

/// 事件分发器
pub struct EventDispatcher {
    groups: RwLock<ListenerGroups>,
    sender: broadcast::Sender<PushEvent>,
    stats: RwLock<EventStats>,
}

impl EventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            groups: RwLock::new(ListenerGroups::default()),
            sender,
            stats: RwLock::new(EventStats::default()),
        }
    }

    /// 注册监听器；同一实例重复注册返回 false
    pub fn subscribe(&self, listener: AnyListener) -> bool {
        let category = listener.category();
        let added = {
            let mut groups = self.groups.write();
            let added = match listener {
                AnyListener::Connection(l) => groups.connection.add(l),
                AnyListener::Chat(l) => groups.chat.add(l),
                AnyListener::Contact(l) => groups.contact.add(l),
                AnyListener::Group(l) => groups.group.add(l),
                AnyListener::Room(l) => groups.room.add(l),
                AnyListener::Presence(l) => groups.presence.add(l),
                AnyListener::Thread(l) => groups.thread.add(l),
                AnyListener::MultiDevice(l) => groups.multi_device.add(l),
            };
            self.stats.write().listener_count = groups.total();
            added
        };
        if added {
            info!("Added {} listener", category);
        } else {
            debug!("{} listener already registered", category);
        }
        added
    }

    /// 移除监听器；未注册时返回 false
    pub fn unsubscribe(&self, listener: &AnyListener) -> bool {
        let mut groups = self.groups.write();
        let removed = match listener {
            AnyListener::Connection(l) => groups.connection.remove(l),
            AnyListener::Chat(l) => groups.chat.remove(l),
            AnyListener::Contact(l) => groups.contact.remove(l),
            AnyListener::Group(l) => groups.group.remove(l),
            AnyListener::Room(l) => groups.room.remove(l),
            AnyListener::Presence(l) => groups.presence.remove(l),
            AnyListener::Thread(l) => groups.thread.remove(l),
            AnyListener::MultiDevice(l) => groups.multi_device.remove(l),
        };
        self.stats.write().listener_count = groups.total();
        removed
    }

    pub fn listener_count(&self, category: EventCategory) -> usize {
        self.groups.read().count(category)
    }

    /// 移除所有监听器
    pub fn clear_listeners(&self) {
        let mut groups = self.groups.write();
        *groups = ListenerGroups::default();
        self.stats.write().listener_count = 0;
        info!("Cleared all event listeners");
    }

    /// 解码并分发一条原始推送，返回被通知的监听器数量
    pub fn dispatch(&self, category: EventCategory, discriminant: &str, payload: Value) -> Result<usize> {
        match PushEvent::decode(category, discriminant, payload) {
            Ok(event) => Ok(self.dispatch_event(event)),
            Err(e) => {
                warn!("Dropping undecodable {} push: {}", category, e);
                self.record_decode_failure();
                Err(e)
            }
        }
    }

    /// 记录一条解码失败被丢弃的推送
    pub(crate) fn record_decode_failure(&self) {
        self.stats.write().decode_failures += 1;
    }

    /// 分发已解码的事件：先快照监听器，锁外按注册顺序逐个通知
    pub fn dispatch_event(&self, event: PushEvent) -> usize {
        let event_type = event.event_type();
        debug!("Dispatching event: {}", event_type);
        {
            let mut stats = self.stats.write();
            stats.total_events += 1;
            *stats.events_by_type.entry(event_type).or_insert(0) += 1;
            stats.last_event_time = Some(now_millis());
        }

        // 无订阅者时 send 失败属正常情况
        if let Err(e) = self.sender.send(event.clone()) {
            debug!("No stream subscribers for event: {}", e);
        }

        match &event {
            PushEvent::Connection(e) => {
                let listeners = self.groups.read().connection.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
            PushEvent::Chat(e) => {
                let listeners = self.groups.read().chat.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
            PushEvent::Contact(e) => {
                let listeners = self.groups.read().contact.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
            PushEvent::Group(e) => {
                let listeners = self.groups.read().group.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
            PushEvent::Room(e) => {
                let listeners = self.groups.read().room.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
            PushEvent::Presence(e) => {
                let listeners = self.groups.read().presence.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
            PushEvent::Thread(e) => {
                let listeners = self.groups.read().thread.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
            PushEvent::MultiDevice(e) => {
                let listeners = self.groups.read().multi_device.snapshot();
                listeners.iter().for_each(|l| e.deliver(l.as_ref()));
                listeners.len()
            }
        }
    }

    /// 订阅事件流
    pub fn subscribe_stream(&self) -> broadcast::Receiver<PushEvent> {
        self.sender.subscribe()
    }

    /// 获取事件统计
    pub fn stats(&self) -> EventStats {
        self.stats.read().clone()
    }
}
