//! 监听器接口
//!
//! 每个类别一个 trait，全部方法都有空的默认实现，只覆盖关心的回调即可。
//! 回调在推送所在线程上同步执行。

use std::collections::HashMap;
use std::sync::Arc;

use crate::events::{
    ChatEvent, ConnectionEvent, ContactEvent, EventCategory, GroupEvent, MultiDeviceEvent,
    PresenceEvent, RoomEvent, ThreadEvent,
};
use crate::model::{
    ChatThreadEvent, ConversationType, Group, GroupReadAck, Message, MessagePinInfo,
    MessageReactionChange, MultiDevicesOperation, Presence, RecallMessageInfo, Room,
};

/// 连接状态监听
#[allow(unused_variables)]
pub trait ConnectionListener: Send + Sync {
    /// 连接成功
    fn on_connected(&self) {}
    /// 连接断开
    fn on_disconnected(&self) {}
    /// token 即将过期
    fn on_token_will_expire(&self) {}
    /// token 已过期
    fn on_token_expired(&self) {}
    /// 账号在其他设备登录
    fn on_logged_other_device(&self, device_name: &str) {}
    fn on_removed_from_server(&self) {}
    fn on_forbid_by_server(&self) {}
    fn on_changed_password(&self) {}
    fn on_login_too_many_device(&self) {}
    fn on_kicked_by_other_device(&self) {}
    fn on_auth_failed(&self) {}
    fn on_app_active_number_reach_limit(&self) {}
}

/// 消息监听
#[allow(unused_variables)]
pub trait ChatListener: Send + Sync {
    /// 收到新消息
    fn on_messages_received(&self, messages: &[Message]) {}
    /// 收到透传消息
    fn on_cmd_messages_received(&self, messages: &[Message]) {}
    /// 收到已读回执
    fn on_messages_read(&self, messages: &[Message]) {}
    /// 收到送达回执
    fn on_messages_delivered(&self, messages: &[Message]) {}
    /// 消息被撤回
    fn on_messages_recalled(&self, recalls: &[RecallMessageInfo]) {}
    fn on_read_ack_for_group_message_updated(&self) {}
    /// 群消息已读回执
    fn on_group_message_read(&self, acks: &[GroupReadAck]) {}
    /// 会话列表有变化
    fn on_conversations_updated(&self) {}
    /// 对方已读整个会话
    fn on_conversation_read(&self, from: &str, to: &str) {}
    /// 消息表情回复变化
    fn on_reaction_changed(&self, changes: &[MessageReactionChange]) {}
    /// 消息内容被修改
    fn on_message_content_changed(&self, message: &Message, operator_id: &str, operation_time: i64) {}
    /// 消息置顶状态变化
    fn on_message_pin_changed(
        &self,
        message_id: &str,
        conversation_id: &str,
        is_pinned: bool,
        pin_info: &MessagePinInfo,
    ) {
    }
}

/// 联系人监听
#[allow(unused_variables)]
pub trait ContactListener: Send + Sync {
    fn on_contact_added(&self, user_id: &str) {}
    fn on_contact_deleted(&self, user_id: &str) {}
    /// 收到好友申请
    fn on_contact_invited(&self, user_id: &str, reason: &str) {}
    fn on_friend_request_accepted(&self, user_id: &str) {}
    fn on_friend_request_declined(&self, user_id: &str) {}
}

/// 群组监听
#[allow(unused_variables)]
pub trait GroupListener: Send + Sync {
    fn on_invitation_received(&self, group_id: &str, group_name: &str, inviter: &str, reason: &str) {}
    fn on_request_to_join_received(
        &self,
        group_id: &str,
        group_name: &str,
        applicant: &str,
        reason: &str,
    ) {
    }
    fn on_request_to_join_accepted(&self, group_id: &str, group_name: &str, accepter: &str) {}
    fn on_request_to_join_declined(
        &self,
        group_id: &str,
        group_name: &str,
        decliner: &str,
        reason: &str,
    ) {
    }
    fn on_invitation_accepted(&self, group_id: &str, invitee: &str, reason: &str) {}
    fn on_invitation_declined(&self, group_id: &str, invitee: &str, reason: &str) {}
    /// 当前用户被移出群组
    fn on_user_removed(&self, group_id: &str, group_name: &str) {}
    fn on_group_destroyed(&self, group_id: &str, group_name: &str) {}
    fn on_auto_accept_invitation(&self, group_id: &str, inviter: &str, invite_message: &str) {}
    /// `mute_expire` 为毫秒时间戳
    fn on_mute_list_added(&self, group_id: &str, mutes: &[String], mute_expire: i64) {}
    fn on_mute_list_removed(&self, group_id: &str, mutes: &[String]) {}
    fn on_admin_added(&self, group_id: &str, admin: &str) {}
    fn on_admin_removed(&self, group_id: &str, admin: &str) {}
    fn on_owner_changed(&self, group_id: &str, new_owner: &str, old_owner: &str) {}
    fn on_member_joined(&self, group_id: &str, member: &str) {}
    fn on_member_exited(&self, group_id: &str, member: &str) {}
    fn on_announcement_changed(&self, group_id: &str, announcement: &str) {}
    fn on_allow_list_added(&self, group_id: &str, members: &[String]) {}
    fn on_allow_list_removed(&self, group_id: &str, members: &[String]) {}
    fn on_all_member_mute_changed(&self, group_id: &str, is_all_muted: bool) {}
    fn on_specification_changed(&self, group: &Group) {}
    fn on_disabled_state_changed(&self, group_id: &str, is_disabled: bool) {}
}

/// 聊天室监听
#[allow(unused_variables)]
pub trait RoomListener: Send + Sync {
    fn on_room_destroyed(&self, room_id: &str, room_name: &str) {}
    fn on_member_joined(&self, room_id: &str, member: &str) {}
    fn on_member_exited(&self, room_id: &str, room_name: &str, member: &str) {}
    /// 当前用户被移出聊天室
    fn on_removed_from_room(&self, room_id: &str, room_name: &str, reason: &str) {}
    fn on_mute_list_added(&self, room_id: &str, mutes: &[String], expire_time: i64) {}
    fn on_mute_list_removed(&self, room_id: &str, mutes: &[String]) {}
    fn on_admin_added(&self, room_id: &str, admin: &str) {}
    fn on_admin_removed(&self, room_id: &str, admin: &str) {}
    fn on_owner_changed(&self, room_id: &str, new_owner: &str, old_owner: &str) {}
    fn on_announcement_changed(&self, room_id: &str, announcement: &str) {}
    fn on_allow_list_added(&self, room_id: &str, members: &[String]) {}
    fn on_allow_list_removed(&self, room_id: &str, members: &[String]) {}
    fn on_all_member_mute_changed(&self, room_id: &str, is_all_muted: bool) {}
    fn on_specification_changed(&self, room: &Room) {}
    fn on_attributes_changed(&self, room_id: &str, attributes: &HashMap<String, String>, from: &str) {}
    fn on_attributes_removed(&self, room_id: &str, keys: &[String], from: &str) {}
}

/// 在线状态监听
#[allow(unused_variables)]
pub trait PresenceListener: Send + Sync {
    fn on_presence_updated(&self, presences: &[Presence]) {}
}

/// 子区监听
#[allow(unused_variables)]
pub trait ThreadListener: Send + Sync {
    fn on_thread_created(&self, event: &ChatThreadEvent) {}
    fn on_thread_updated(&self, event: &ChatThreadEvent) {}
    fn on_thread_destroyed(&self, event: &ChatThreadEvent) {}
    /// 当前用户被踢出子区
    fn on_user_kicked(&self, event: &ChatThreadEvent) {}
}

/// 多设备同步监听
#[allow(unused_variables)]
pub trait MultiDeviceListener: Send + Sync {
    fn on_contact_event(&self, operation: MultiDevicesOperation, target: &str, ext: &str) {}
    fn on_group_event(&self, operation: MultiDevicesOperation, target: &str, usernames: &[String]) {}
    fn on_thread_event(&self, operation: MultiDevicesOperation, target: &str, usernames: &[String]) {}
    fn on_conversation_event(
        &self,
        operation: MultiDevicesOperation,
        conversation_id: &str,
        conv_type: ConversationType,
    ) {
    }
    /// 其他设备删除了漫游消息
    fn on_roam_message_removed(&self, conversation_id: &str, device_id: &str) {}
}

/// 任意类别的监听器
#[derive(Clone)]
pub enum AnyListener {
    Connection(Arc<dyn ConnectionListener>),
    Chat(Arc<dyn ChatListener>),
    Contact(Arc<dyn ContactListener>),
    Group(Arc<dyn GroupListener>),
    Room(Arc<dyn RoomListener>),
    Presence(Arc<dyn PresenceListener>),
    Thread(Arc<dyn ThreadListener>),
    MultiDevice(Arc<dyn MultiDeviceListener>),
}

impl AnyListener {
    pub fn category(&self) -> EventCategory {
        match self {
            AnyListener::Connection(_) => EventCategory::Connection,
            AnyListener::Chat(_) => EventCategory::Chat,
            AnyListener::Contact(_) => EventCategory::Contact,
            AnyListener::Group(_) => EventCategory::Group,
            AnyListener::Room(_) => EventCategory::Room,
            AnyListener::Presence(_) => EventCategory::Presence,
            AnyListener::Thread(_) => EventCategory::Thread,
            AnyListener::MultiDevice(_) => EventCategory::MultiDevice,
        }
    }
}

impl std::fmt::Debug for AnyListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AnyListener({})", self.category())
    }
}

impl ConnectionEvent {
    pub(crate) fn deliver(&self, l: &dyn ConnectionListener) {
        match self {
            ConnectionEvent::Connected => l.on_connected(),
            ConnectionEvent::Disconnected => l.on_disconnected(),
            ConnectionEvent::TokenWillExpire => l.on_token_will_expire(),
            ConnectionEvent::TokenExpired => l.on_token_expired(),
            ConnectionEvent::LoggedOtherDevice { device_name } => l.on_logged_other_device(device_name),
            ConnectionEvent::RemovedFromServer => l.on_removed_from_server(),
            ConnectionEvent::ForbidByServer => l.on_forbid_by_server(),
            ConnectionEvent::ChangedPassword => l.on_changed_password(),
            ConnectionEvent::LoginTooManyDevice => l.on_login_too_many_device(),
            ConnectionEvent::KickedByOtherDevice => l.on_kicked_by_other_device(),
            ConnectionEvent::AuthFailed => l.on_auth_failed(),
            ConnectionEvent::AppActiveNumberReachLimit => l.on_app_active_number_reach_limit(),
        }
    }
}

impl ChatEvent {
    pub(crate) fn deliver(&self, l: &dyn ChatListener) {
        match self {
            ChatEvent::MessagesReceived(m) => l.on_messages_received(m),
            ChatEvent::CmdMessagesReceived(m) => l.on_cmd_messages_received(m),
            ChatEvent::MessagesRead(m) => l.on_messages_read(m),
            ChatEvent::MessagesDelivered(m) => l.on_messages_delivered(m),
            ChatEvent::MessagesRecalled(r) => l.on_messages_recalled(r),
            ChatEvent::ReadAckForGroupMessageUpdated => l.on_read_ack_for_group_message_updated(),
            ChatEvent::GroupMessageRead(acks) => l.on_group_message_read(acks),
            ChatEvent::ConversationsUpdated => l.on_conversations_updated(),
            ChatEvent::ConversationRead { from, to } => l.on_conversation_read(from, to),
            ChatEvent::ReactionChanged(c) => l.on_reaction_changed(c),
            ChatEvent::MessageContentChanged {
                message,
                operator_id,
                operation_time,
            } => l.on_message_content_changed(message, operator_id, *operation_time),
            ChatEvent::MessagePinChanged {
                message_id,
                conversation_id,
                is_pinned,
                pin_info,
            } => l.on_message_pin_changed(message_id, conversation_id, *is_pinned, pin_info),
        }
    }
}

impl ContactEvent {
    pub(crate) fn deliver(&self, l: &dyn ContactListener) {
        match self {
            ContactEvent::ContactAdded { user_id } => l.on_contact_added(user_id),
            ContactEvent::ContactDeleted { user_id } => l.on_contact_deleted(user_id),
            ContactEvent::ContactInvited { user_id, reason } => l.on_contact_invited(user_id, reason),
            ContactEvent::FriendRequestAccepted { user_id } => l.on_friend_request_accepted(user_id),
            ContactEvent::FriendRequestDeclined { user_id } => l.on_friend_request_declined(user_id),
        }
    }
}

impl GroupEvent {
    pub(crate) fn deliver(&self, l: &dyn GroupListener) {
        match self {
            GroupEvent::InvitationReceived {
                group_id,
                group_name,
                inviter,
                reason,
            } => l.on_invitation_received(group_id, group_name, inviter, reason),
            GroupEvent::RequestToJoinReceived {
                group_id,
                group_name,
                applicant,
                reason,
            } => l.on_request_to_join_received(group_id, group_name, applicant, reason),
            GroupEvent::RequestToJoinAccepted {
                group_id,
                group_name,
                accepter,
            } => l.on_request_to_join_accepted(group_id, group_name, accepter),
            GroupEvent::RequestToJoinDeclined {
                group_id,
                group_name,
                decliner,
                reason,
            } => l.on_request_to_join_declined(group_id, group_name, decliner, reason),
            GroupEvent::InvitationAccepted {
                group_id,
                invitee,
                reason,
            } => l.on_invitation_accepted(group_id, invitee, reason),
            GroupEvent::InvitationDeclined {
                group_id,
                invitee,
                reason,
            } => l.on_invitation_declined(group_id, invitee, reason),
            GroupEvent::UserRemoved {
                group_id,
                group_name,
            } => l.on_user_removed(group_id, group_name),
            GroupEvent::GroupDestroyed {
                group_id,
                group_name,
            } => l.on_group_destroyed(group_id, group_name),
            GroupEvent::AutoAcceptInvitation {
                group_id,
                inviter,
                invite_message,
            } => l.on_auto_accept_invitation(group_id, inviter, invite_message),
            GroupEvent::MuteListAdded {
                group_id,
                mutes,
                mute_expire,
            } => l.on_mute_list_added(group_id, mutes, *mute_expire),
            GroupEvent::MuteListRemoved { group_id, mutes } => l.on_mute_list_removed(group_id, mutes),
            GroupEvent::AdminAdded { group_id, admin } => l.on_admin_added(group_id, admin),
            GroupEvent::AdminRemoved { group_id, admin } => l.on_admin_removed(group_id, admin),
            GroupEvent::OwnerChanged {
                group_id,
                new_owner,
                old_owner,
            } => l.on_owner_changed(group_id, new_owner, old_owner),
            GroupEvent::MemberJoined { group_id, member } => l.on_member_joined(group_id, member),
            GroupEvent::MemberExited { group_id, member } => l.on_member_exited(group_id, member),
            GroupEvent::AnnouncementChanged {
                group_id,
                announcement,
            } => l.on_announcement_changed(group_id, announcement),
            GroupEvent::AllowListAdded { group_id, members } => l.on_allow_list_added(group_id, members),
            GroupEvent::AllowListRemoved { group_id, members } => {
                l.on_allow_list_removed(group_id, members)
            }
            GroupEvent::AllMemberMuteChanged {
                group_id,
                is_all_muted,
            } => l.on_all_member_mute_changed(group_id, *is_all_muted),
            GroupEvent::SpecificationChanged(group) => l.on_specification_changed(group),
            GroupEvent::DisabledStateChanged {
                group_id,
                is_disabled,
            } => l.on_disabled_state_changed(group_id, *is_disabled),
        }
    }
}

impl RoomEvent {
    pub(crate) fn deliver(&self, l: &dyn RoomListener) {
        match self {
            RoomEvent::Destroyed { room_id, room_name } => l.on_room_destroyed(room_id, room_name),
            RoomEvent::MemberJoined { room_id, member } => l.on_member_joined(room_id, member),
            RoomEvent::MemberExited {
                room_id,
                room_name,
                member,
            } => l.on_member_exited(room_id, room_name, member),
            RoomEvent::RemovedFromRoom {
                room_id,
                room_name,
                reason,
            } => l.on_removed_from_room(room_id, room_name, reason),
            RoomEvent::MuteListAdded {
                room_id,
                mutes,
                expire_time,
            } => l.on_mute_list_added(room_id, mutes, *expire_time),
            RoomEvent::MuteListRemoved { room_id, mutes } => l.on_mute_list_removed(room_id, mutes),
            RoomEvent::AdminAdded { room_id, admin } => l.on_admin_added(room_id, admin),
            RoomEvent::AdminRemoved { room_id, admin } => l.on_admin_removed(room_id, admin),
            RoomEvent::OwnerChanged {
                room_id,
                new_owner,
                old_owner,
            } => l.on_owner_changed(room_id, new_owner, old_owner),
            RoomEvent::AnnouncementChanged {
                room_id,
                announcement,
            } => l.on_announcement_changed(room_id, announcement),
            RoomEvent::AllowListAdded { room_id, members } => l.on_allow_list_added(room_id, members),
            RoomEvent::AllowListRemoved { room_id, members } => l.on_allow_list_removed(room_id, members),
            RoomEvent::AllMemberMuteChanged {
                room_id,
                is_all_muted,
            } => l.on_all_member_mute_changed(room_id, *is_all_muted),
            RoomEvent::SpecificationChanged(room) => l.on_specification_changed(room),
            RoomEvent::AttributesChanged {
                room_id,
                attributes,
                from,
            } => l.on_attributes_changed(room_id, attributes, from),
            RoomEvent::AttributesRemoved { room_id, keys, from } => {
                l.on_attributes_removed(room_id, keys, from)
            }
        }
    }
}

impl PresenceEvent {
    pub(crate) fn deliver(&self, l: &dyn PresenceListener) {
        match self {
            PresenceEvent::PresenceUpdated(list) => l.on_presence_updated(list),
        }
    }
}

impl ThreadEvent {
    pub(crate) fn deliver(&self, l: &dyn ThreadListener) {
        match self {
            ThreadEvent::ThreadCreated(e) => l.on_thread_created(e),
            ThreadEvent::ThreadUpdated(e) => l.on_thread_updated(e),
            ThreadEvent::ThreadDestroyed(e) => l.on_thread_destroyed(e),
            ThreadEvent::UserKicked(e) => l.on_user_kicked(e),
        }
    }
}

impl MultiDeviceEvent {
    pub(crate) fn deliver(&self, l: &dyn MultiDeviceListener) {
        match self {
            MultiDeviceEvent::ContactEvent {
                operation,
                target,
                ext,
            } => l.on_contact_event(*operation, target, ext),
            MultiDeviceEvent::GroupEvent {
                operation,
                target,
                usernames,
            } => l.on_group_event(*operation, target, usernames),
            MultiDeviceEvent::ThreadEvent {
                operation,
                target,
                usernames,
            } => l.on_thread_event(*operation, target, usernames),
            MultiDeviceEvent::ConversationEvent {
                operation,
                conversation_id,
                conv_type,
            } => l.on_conversation_event(*operation, conversation_id, *conv_type),
            MultiDeviceEvent::RoamMessageRemoved {
                conversation_id,
                device_id,
            } => l.on_roam_message_removed(conversation_id, device_id),
        }
    }
}
