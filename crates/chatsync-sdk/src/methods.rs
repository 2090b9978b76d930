//! 传输层方法名
//!
//! 格式统一为 `类别.动作`，宿主按方法名路由到具体协议实现。

// 客户端
pub const LOGIN: &str = "client.login";
pub const LOGOUT: &str = "client.logout";
pub const CURRENT_USER: &str = "client.current_user";

// 消息与会话
pub const SEND_MESSAGE: &str = "chat.send_message";
pub const ACK_MESSAGE_READ: &str = "chat.ack_message_read";
pub const ACK_GROUP_MESSAGE_READ: &str = "chat.ack_group_message_read";
pub const ACK_CONVERSATION_READ: &str = "chat.ack_conversation_read";
pub const RECALL_MESSAGE: &str = "chat.recall_message";
pub const MODIFY_MESSAGE: &str = "chat.modify_message";
pub const REPORT_MESSAGE: &str = "chat.report_message";
pub const PIN_MESSAGE: &str = "chat.pin_message";
pub const UNPIN_MESSAGE: &str = "chat.unpin_message";
pub const FETCH_PINNED_MESSAGES: &str = "chat.fetch_pinned_messages";
pub const DELETE_CONVERSATION_FROM_SERVER: &str = "chat.delete_conversation_from_server";
pub const DELETE_MESSAGES_FROM_SERVER: &str = "chat.delete_messages_from_server";
pub const PIN_CONVERSATION: &str = "chat.pin_conversation";
pub const ADD_REACTION: &str = "chat.add_reaction";
pub const REMOVE_REACTION: &str = "chat.remove_reaction";
pub const FETCH_REACTION_LIST: &str = "chat.fetch_reaction_list";
pub const FETCH_HISTORY_MESSAGES: &str = "chat.fetch_history_messages";
pub const FETCH_CONVERSATIONS: &str = "chat.fetch_conversations";
pub const FETCH_PINNED_CONVERSATIONS: &str = "chat.fetch_pinned_conversations";
pub const FETCH_GROUP_READ_ACKS: &str = "chat.fetch_group_read_acks";
pub const FETCH_REACTION_DETAIL: &str = "chat.fetch_reaction_detail";
pub const DELETE_ALL_MESSAGES_AND_CONVERSATIONS: &str = "chat.delete_all_messages_and_conversations";
pub const TRANSLATE_MESSAGE: &str = "chat.translate_message";
pub const FETCH_SUPPORT_LANGUAGES: &str = "chat.fetch_support_languages";
pub const FETCH_COMBINE_MESSAGE_DETAIL: &str = "chat.fetch_combine_message_detail";

// 联系人
pub const ADD_CONTACT: &str = "contact.add_contact";
pub const DELETE_CONTACT: &str = "contact.delete_contact";
pub const ACCEPT_CONTACT_INVITATION: &str = "contact.accept_invitation";
pub const DECLINE_CONTACT_INVITATION: &str = "contact.decline_invitation";
pub const FETCH_ALL_CONTACT_IDS: &str = "contact.fetch_all_contact_ids";
pub const FETCH_CONTACTS: &str = "contact.fetch_contacts";
pub const SET_CONTACT_REMARK: &str = "contact.set_contact_remark";
pub const ADD_USER_TO_BLOCK_LIST: &str = "contact.add_user_to_block_list";
pub const REMOVE_USER_FROM_BLOCK_LIST: &str = "contact.remove_user_from_block_list";
pub const FETCH_CONTACT_BLOCK_LIST: &str = "contact.fetch_block_list";
pub const SELF_IDS_ON_OTHER_PLATFORM: &str = "contact.self_ids_on_other_platform";

// 群组
pub const CREATE_GROUP: &str = "group.create_group";
pub const DESTROY_GROUP: &str = "group.destroy_group";
pub const LEAVE_GROUP: &str = "group.leave_group";
pub const JOIN_PUBLIC_GROUP: &str = "group.join_public_group";
pub const APPLY_JOIN_TO_GROUP: &str = "group.apply_join_to_group";
pub const ACCEPT_JOIN_APPLICATION: &str = "group.accept_join_application";
pub const DECLINE_JOIN_APPLICATION: &str = "group.decline_join_application";
pub const ACCEPT_GROUP_INVITATION: &str = "group.accept_invitation";
pub const DECLINE_GROUP_INVITATION: &str = "group.decline_invitation";
pub const ADD_GROUP_MEMBERS: &str = "group.add_members";
pub const REMOVE_GROUP_MEMBERS: &str = "group.remove_members";
pub const ADD_GROUP_ADMIN: &str = "group.add_admin";
pub const REMOVE_GROUP_ADMIN: &str = "group.remove_admin";
pub const CHANGE_GROUP_OWNER: &str = "group.change_owner";
pub const CHANGE_GROUP_NAME: &str = "group.change_name";
pub const CHANGE_GROUP_DESCRIPTION: &str = "group.change_description";
pub const UPDATE_GROUP_ANNOUNCEMENT: &str = "group.update_announcement";
pub const FETCH_GROUP_ANNOUNCEMENT: &str = "group.fetch_announcement";
pub const UPDATE_GROUP_EXT: &str = "group.update_ext";
pub const MUTE_GROUP_MEMBERS: &str = "group.mute_members";
pub const UNMUTE_GROUP_MEMBERS: &str = "group.unmute_members";
pub const MUTE_ALL_GROUP_MEMBERS: &str = "group.mute_all";
pub const UNMUTE_ALL_GROUP_MEMBERS: &str = "group.unmute_all";
pub const BLOCK_GROUP_MEMBERS: &str = "group.block_members";
pub const UNBLOCK_GROUP_MEMBERS: &str = "group.unblock_members";
pub const ADD_GROUP_ALLOW_LIST: &str = "group.add_allow_list";
pub const REMOVE_GROUP_ALLOW_LIST: &str = "group.remove_allow_list";
pub const BLOCK_GROUP: &str = "group.block_group";
pub const UNBLOCK_GROUP: &str = "group.unblock_group";
pub const FETCH_GROUP_SPECIFICATION: &str = "group.fetch_specification";
pub const GET_GROUP: &str = "group.get_group";
pub const FETCH_GROUP_MEMBERS: &str = "group.fetch_members";
pub const FETCH_PUBLIC_GROUPS: &str = "group.fetch_public_groups";
pub const FETCH_JOINED_GROUPS: &str = "group.fetch_joined_groups";
pub const FETCH_GROUP_BLOCK_LIST: &str = "group.fetch_block_list";
pub const FETCH_GROUP_MUTE_LIST: &str = "group.fetch_mute_list";
pub const FETCH_GROUP_ALLOW_LIST: &str = "group.fetch_allow_list";
pub const CHECK_IN_GROUP_ALLOW_LIST: &str = "group.check_in_allow_list";
pub const CHECK_IN_GROUP_MUTE_LIST: &str = "group.check_in_mute_list";
pub const SET_GROUP_MEMBER_ATTRIBUTES: &str = "group.set_member_attributes";
pub const FETCH_GROUP_MEMBER_ATTRIBUTES: &str = "group.fetch_member_attributes";
pub const FETCH_MY_GROUPS_COUNT: &str = "group.fetch_my_groups_count";
pub const FETCH_GROUP_SHARED_FILES: &str = "group.fetch_shared_files";
pub const DELETE_GROUP_SHARED_FILE: &str = "group.delete_shared_file";

// 聊天室
pub const CREATE_ROOM: &str = "room.create_room";
pub const DESTROY_ROOM: &str = "room.destroy_room";
pub const JOIN_ROOM: &str = "room.join_room";
pub const LEAVE_ROOM: &str = "room.leave_room";
pub const FETCH_ROOM_INFO: &str = "room.fetch_info";
pub const CHANGE_ROOM_NAME: &str = "room.change_name";
pub const CHANGE_ROOM_DESCRIPTION: &str = "room.change_description";
pub const CHANGE_ROOM_OWNER: &str = "room.change_owner";
pub const ADD_ROOM_ADMIN: &str = "room.add_admin";
pub const REMOVE_ROOM_ADMIN: &str = "room.remove_admin";
pub const UPDATE_ROOM_ANNOUNCEMENT: &str = "room.update_announcement";
pub const FETCH_ROOM_ANNOUNCEMENT: &str = "room.fetch_announcement";
pub const REMOVE_ROOM_MEMBERS: &str = "room.remove_members";
pub const MUTE_ROOM_MEMBERS: &str = "room.mute_members";
pub const UNMUTE_ROOM_MEMBERS: &str = "room.unmute_members";
pub const MUTE_ALL_ROOM_MEMBERS: &str = "room.mute_all";
pub const UNMUTE_ALL_ROOM_MEMBERS: &str = "room.unmute_all";
pub const BLOCK_ROOM_MEMBERS: &str = "room.block_members";
pub const UNBLOCK_ROOM_MEMBERS: &str = "room.unblock_members";
pub const FETCH_ROOM_MEMBERS: &str = "room.fetch_members";
pub const FETCH_PUBLIC_ROOMS: &str = "room.fetch_public_rooms";
pub const FETCH_ROOM_BLOCK_LIST: &str = "room.fetch_block_list";
pub const FETCH_ROOM_MUTE_LIST: &str = "room.fetch_mute_list";
pub const ADD_ROOM_ALLOW_LIST: &str = "room.add_allow_list";
pub const REMOVE_ROOM_ALLOW_LIST: &str = "room.remove_allow_list";
pub const CHECK_IN_ROOM_ALLOW_LIST: &str = "room.check_in_allow_list";
pub const CHECK_IN_ROOM_MUTE_LIST: &str = "room.check_in_mute_list";
pub const ADD_ROOM_ATTRIBUTES: &str = "room.add_attributes";
pub const REMOVE_ROOM_ATTRIBUTES: &str = "room.remove_attributes";
pub const FETCH_ROOM_ATTRIBUTES: &str = "room.fetch_attributes";

// 在线状态
pub const PUBLISH_PRESENCE: &str = "presence.publish";
pub const SUBSCRIBE_PRESENCES: &str = "presence.subscribe";
pub const UNSUBSCRIBE_PRESENCES: &str = "presence.unsubscribe";
pub const FETCH_PRESENCE_STATUS: &str = "presence.fetch_status";
pub const FETCH_SUBSCRIBED_PRESENCES: &str = "presence.fetch_subscribed_members";

// 子区
pub const CREATE_THREAD: &str = "thread.create_thread";
pub const JOIN_THREAD: &str = "thread.join_thread";
pub const LEAVE_THREAD: &str = "thread.leave_thread";
pub const DESTROY_THREAD: &str = "thread.destroy_thread";
pub const CHANGE_THREAD_NAME: &str = "thread.change_name";
pub const REMOVE_THREAD_MEMBER: &str = "thread.remove_member";
pub const FETCH_THREAD_DETAIL: &str = "thread.fetch_detail";
pub const FETCH_THREAD_LAST_MESSAGES: &str = "thread.fetch_last_messages";
pub const FETCH_THREAD_MEMBERS: &str = "thread.fetch_members";
pub const FETCH_GROUP_THREADS: &str = "thread.fetch_group_threads";
pub const FETCH_JOINED_THREADS: &str = "thread.fetch_joined_threads";

// 用户属性
pub const UPDATE_OWN_USER_INFO: &str = "user.update_own_info";
pub const FETCH_USER_INFO: &str = "user.fetch_info";
