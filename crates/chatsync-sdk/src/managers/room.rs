//! 聊天室管理器

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::callback::{CallBack, ValueCallBack};
use crate::client::ClientCore;
use crate::error::Result;
use crate::invoker::decode_json;
use crate::methods;
use crate::model::{ConversationKey, CursorPage, PageResult, Room};
use crate::pagination::{NumberedResource, PagedResource};

#[derive(Clone)]
pub struct RoomManager {
    core: Arc<ClientCore>,
}

impl RoomManager {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    fn unit(&self, method: &str, params: Value, callback: CallBack) {
        self.core.invoker.invoke_unit(method, params, callback);
    }

    /// 成功后按 `delete_messages_as_exit_room` 清理本地会话
    fn exit(&self, method: &str, room_id: &str, callback: CallBack) {
        let core = self.core.clone();
        let key = ConversationKey::room(room_id);
        let callback = callback.before_success(move || core.drop_conversation_on_exit(&key));
        self.unit(method, json!({ "room_id": room_id }), callback);
    }

    pub fn create_room(
        &self,
        name: &str,
        description: &str,
        welcome: &str,
        members: &[String],
        max_users: u32,
        callback: ValueCallBack<Room>,
    ) {
        self.core.invoker.invoke_value(
            methods::CREATE_ROOM,
            json!({
                "name": name,
                "description": description,
                "welcome": welcome,
                "members": members,
                "max_users": max_users,
            }),
            callback,
        );
    }

    pub fn join_room(&self, room_id: &str, callback: ValueCallBack<Room>) {
        self.core
            .invoker
            .invoke_value(methods::JOIN_ROOM, json!({ "room_id": room_id }), callback);
    }

    pub fn leave_room(&self, room_id: &str, callback: CallBack) {
        self.exit(methods::LEAVE_ROOM, room_id, callback);
    }

    pub fn destroy_room(&self, room_id: &str, callback: CallBack) {
        self.exit(methods::DESTROY_ROOM, room_id, callback);
    }

    pub fn fetch_room_info(&self, room_id: &str, fetch_members: bool, callback: ValueCallBack<Room>) {
        self.core.invoker.invoke_value(
            methods::FETCH_ROOM_INFO,
            json!({ "room_id": room_id, "fetch_members": fetch_members }),
            callback,
        );
    }

    pub fn change_name(&self, room_id: &str, name: &str, callback: CallBack) {
        self.unit(methods::CHANGE_ROOM_NAME, json!({ "room_id": room_id, "name": name }), callback);
    }

    pub fn change_description(&self, room_id: &str, description: &str, callback: CallBack) {
        self.unit(
            methods::CHANGE_ROOM_DESCRIPTION,
            json!({ "room_id": room_id, "description": description }),
            callback,
        );
    }

    pub fn change_owner(&self, room_id: &str, new_owner: &str, callback: CallBack) {
        self.unit(
            methods::CHANGE_ROOM_OWNER,
            json!({ "room_id": room_id, "new_owner": new_owner }),
            callback,
        );
    }

    pub fn add_admin(&self, room_id: &str, admin: &str, callback: CallBack) {
        self.unit(methods::ADD_ROOM_ADMIN, json!({ "room_id": room_id, "admin": admin }), callback);
    }

    pub fn remove_admin(&self, room_id: &str, admin: &str, callback: CallBack) {
        self.unit(
            methods::REMOVE_ROOM_ADMIN,
            json!({ "room_id": room_id, "admin": admin }),
            callback,
        );
    }

    pub fn update_announcement(&self, room_id: &str, announcement: &str, callback: CallBack) {
        self.unit(
            methods::UPDATE_ROOM_ANNOUNCEMENT,
            json!({ "room_id": room_id, "announcement": announcement }),
            callback,
        );
    }

    pub fn fetch_announcement(&self, room_id: &str, callback: ValueCallBack<String>) {
        self.core.invoker.invoke_value(
            methods::FETCH_ROOM_ANNOUNCEMENT,
            json!({ "room_id": room_id }),
            callback,
        );
    }

    pub fn remove_members(&self, room_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::REMOVE_ROOM_MEMBERS,
            json!({ "room_id": room_id, "members": members }),
            callback,
        );
    }

    /// 禁言成员，`duration_ms` 为 -1 表示永久
    pub fn mute_members(&self, room_id: &str, members: &[String], duration_ms: i64, callback: CallBack) {
        self.unit(
            methods::MUTE_ROOM_MEMBERS,
            json!({ "room_id": room_id, "members": members, "duration": duration_ms }),
            callback,
        );
    }

    pub fn unmute_members(&self, room_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::UNMUTE_ROOM_MEMBERS,
            json!({ "room_id": room_id, "members": members }),
            callback,
        );
    }

    pub fn mute_all_members(&self, room_id: &str, callback: CallBack) {
        self.unit(methods::MUTE_ALL_ROOM_MEMBERS, json!({ "room_id": room_id }), callback);
    }

    pub fn unmute_all_members(&self, room_id: &str, callback: CallBack) {
        self.unit(methods::UNMUTE_ALL_ROOM_MEMBERS, json!({ "room_id": room_id }), callback);
    }

    pub fn block_members(&self, room_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::BLOCK_ROOM_MEMBERS,
            json!({ "room_id": room_id, "members": members }),
            callback,
        );
    }

    pub fn unblock_members(&self, room_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::UNBLOCK_ROOM_MEMBERS,
            json!({ "room_id": room_id, "members": members }),
            callback,
        );
    }

    pub fn add_allow_list(&self, room_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::ADD_ROOM_ALLOW_LIST,
            json!({ "room_id": room_id, "members": members }),
            callback,
        );
    }

    pub fn remove_allow_list(&self, room_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::REMOVE_ROOM_ALLOW_LIST,
            json!({ "room_id": room_id, "members": members }),
            callback,
        );
    }

    /// 当前用户是否在聊天室白名单中
    pub fn check_if_in_allow_list(&self, room_id: &str, callback: ValueCallBack<bool>) {
        self.core.invoker.invoke_value(
            methods::CHECK_IN_ROOM_ALLOW_LIST,
            json!({ "room_id": room_id }),
            callback,
        );
    }

    pub fn check_if_in_mute_list(&self, room_id: &str, callback: ValueCallBack<bool>) {
        self.core.invoker.invoke_value(
            methods::CHECK_IN_ROOM_MUTE_LIST,
            json!({ "room_id": room_id }),
            callback,
        );
    }

    // ========== 自定义属性 ==========

    /// 设置聊天室属性，结果为设置失败的 `键 -> 错误码`，全部成功时为空
    ///
    /// `delete_when_exit` 为 true 时属性在设置者离开后自动删除；
    /// `forced` 为 true 时覆盖他人设置的同名属性。
    pub fn add_attributes(
        &self,
        room_id: &str,
        attributes: &HashMap<String, String>,
        delete_when_exit: bool,
        forced: bool,
        callback: ValueCallBack<HashMap<String, i32>>,
    ) {
        self.core.invoker.invoke_value(
            methods::ADD_ROOM_ATTRIBUTES,
            json!({
                "room_id": room_id,
                "attributes": attributes,
                "delete_when_exit": delete_when_exit,
                "forced": forced,
            }),
            callback,
        );
    }

    pub fn remove_attributes(
        &self,
        room_id: &str,
        keys: &[String],
        forced: bool,
        callback: ValueCallBack<HashMap<String, i32>>,
    ) {
        self.core.invoker.invoke_value(
            methods::REMOVE_ROOM_ATTRIBUTES,
            json!({ "room_id": room_id, "keys": keys, "forced": forced }),
            callback,
        );
    }

    /// `keys` 为空时拉取全部属性
    pub fn fetch_attributes(
        &self,
        room_id: &str,
        keys: &[String],
        callback: ValueCallBack<HashMap<String, String>>,
    ) {
        self.core.invoker.invoke_value(
            methods::FETCH_ROOM_ATTRIBUTES,
            json!({ "room_id": room_id, "keys": keys }),
            callback,
        );
    }

    // ========== 分页 ==========

    /// 公开聊天室，`page_number` 从 1 开始
    pub fn fetch_public_rooms(
        &self,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<Room>>,
    ) -> Result<()> {
        self.core.pagination.fetch_numbered(
            &NumberedResource::PublicRooms,
            page_number,
            page_size,
            decode_json::<Room>,
            callback,
        )
    }

    pub fn fetch_members(
        &self,
        room_id: &str,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<String>>,
    ) -> Result<()> {
        let resource = PagedResource::RoomMembers {
            room_id: room_id.to_string(),
        };
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<String>, callback)
    }

    pub fn fetch_block_list(
        &self,
        room_id: &str,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<String>>,
    ) -> Result<()> {
        let resource = NumberedResource::RoomBlockList {
            room_id: room_id.to_string(),
        };
        self.core
            .pagination
            .fetch_numbered(&resource, page_number, page_size, decode_json::<String>, callback)
    }

    pub fn fetch_mute_list(
        &self,
        room_id: &str,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<String>>,
    ) -> Result<()> {
        let resource = NumberedResource::RoomMuteList {
            room_id: room_id.to_string(),
        };
        self.core
            .pagination
            .fetch_numbered(&resource, page_number, page_size, decode_json::<String>, callback)
    }
}
