//! 群组管理器

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::callback::{CallBack, ValueCallBack};
use crate::client::ClientCore;
use crate::error::Result;
use crate::invoker::decode_json;
use crate::methods;
use crate::model::{
    ConversationKey, CursorPage, Group, GroupInfo, GroupOptions, GroupSharedFile, PageResult,
};
use crate::pagination::{NumberedResource, PagedResource};

#[derive(Clone)]
pub struct GroupManager {
    core: Arc<ClientCore>,
}

impl GroupManager {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    fn unit(&self, method: &str, params: Value, callback: CallBack) {
        self.core.invoker.invoke_unit(method, params, callback);
    }

    /// 成功后按 `delete_messages_as_exit_group` 清理本地会话
    fn exit(&self, method: &str, group_id: &str, callback: CallBack) {
        let core = self.core.clone();
        let key = ConversationKey::group(group_id);
        let callback = callback.before_success(move || core.drop_conversation_on_exit(&key));
        self.unit(method, json!({ "group_id": group_id }), callback);
    }

    // ========== 创建与退出 ==========

    pub fn create_group(
        &self,
        name: &str,
        description: &str,
        invitees: &[String],
        reason: &str,
        options: GroupOptions,
        callback: ValueCallBack<Group>,
    ) {
        self.core.invoker.invoke_value(
            methods::CREATE_GROUP,
            json!({
                "name": name,
                "description": description,
                "invitees": invitees,
                "reason": reason,
                "options": options,
            }),
            callback,
        );
    }

    /// 解散群组（仅群主）
    pub fn destroy_group(&self, group_id: &str, callback: CallBack) {
        self.exit(methods::DESTROY_GROUP, group_id, callback);
    }

    pub fn leave_group(&self, group_id: &str, callback: CallBack) {
        self.exit(methods::LEAVE_GROUP, group_id, callback);
    }

    pub fn join_public_group(&self, group_id: &str, callback: CallBack) {
        self.unit(methods::JOIN_PUBLIC_GROUP, json!({ "group_id": group_id }), callback);
    }

    pub fn apply_join_to_group(&self, group_id: &str, reason: &str, callback: CallBack) {
        self.unit(
            methods::APPLY_JOIN_TO_GROUP,
            json!({ "group_id": group_id, "reason": reason }),
            callback,
        );
    }

    pub fn accept_join_application(&self, group_id: &str, user_id: &str, callback: CallBack) {
        self.unit(
            methods::ACCEPT_JOIN_APPLICATION,
            json!({ "group_id": group_id, "user_id": user_id }),
            callback,
        );
    }

    pub fn decline_join_application(&self, group_id: &str, user_id: &str, reason: &str, callback: CallBack) {
        self.unit(
            methods::DECLINE_JOIN_APPLICATION,
            json!({ "group_id": group_id, "user_id": user_id, "reason": reason }),
            callback,
        );
    }

    pub fn accept_invitation(&self, group_id: &str, inviter: &str, callback: ValueCallBack<Group>) {
        self.core.invoker.invoke_value(
            methods::ACCEPT_GROUP_INVITATION,
            json!({ "group_id": group_id, "inviter": inviter }),
            callback,
        );
    }

    pub fn decline_invitation(&self, group_id: &str, inviter: &str, reason: &str, callback: CallBack) {
        self.unit(
            methods::DECLINE_GROUP_INVITATION,
            json!({ "group_id": group_id, "inviter": inviter, "reason": reason }),
            callback,
        );
    }

    // ========== 成员与权限 ==========

    pub fn add_members(&self, group_id: &str, members: &[String], welcome: &str, callback: CallBack) {
        self.unit(
            methods::ADD_GROUP_MEMBERS,
            json!({ "group_id": group_id, "members": members, "welcome": welcome }),
            callback,
        );
    }

    pub fn remove_members(&self, group_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::REMOVE_GROUP_MEMBERS,
            json!({ "group_id": group_id, "members": members }),
            callback,
        );
    }

    pub fn add_admin(&self, group_id: &str, admin: &str, callback: CallBack) {
        self.unit(
            methods::ADD_GROUP_ADMIN,
            json!({ "group_id": group_id, "admin": admin }),
            callback,
        );
    }

    pub fn remove_admin(&self, group_id: &str, admin: &str, callback: CallBack) {
        self.unit(
            methods::REMOVE_GROUP_ADMIN,
            json!({ "group_id": group_id, "admin": admin }),
            callback,
        );
    }

    pub fn change_owner(&self, group_id: &str, new_owner: &str, callback: CallBack) {
        self.unit(
            methods::CHANGE_GROUP_OWNER,
            json!({ "group_id": group_id, "new_owner": new_owner }),
            callback,
        );
    }

    /// 禁言成员，`duration_ms` 为 0 表示永久
    pub fn mute_members(&self, group_id: &str, members: &[String], duration_ms: i64, callback: CallBack) {
        self.unit(
            methods::MUTE_GROUP_MEMBERS,
            json!({ "group_id": group_id, "members": members, "duration": duration_ms }),
            callback,
        );
    }

    pub fn unmute_members(&self, group_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::UNMUTE_GROUP_MEMBERS,
            json!({ "group_id": group_id, "members": members }),
            callback,
        );
    }

    pub fn mute_all_members(&self, group_id: &str, callback: CallBack) {
        self.unit(methods::MUTE_ALL_GROUP_MEMBERS, json!({ "group_id": group_id }), callback);
    }

    pub fn unmute_all_members(&self, group_id: &str, callback: CallBack) {
        self.unit(methods::UNMUTE_ALL_GROUP_MEMBERS, json!({ "group_id": group_id }), callback);
    }

    pub fn block_members(&self, group_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::BLOCK_GROUP_MEMBERS,
            json!({ "group_id": group_id, "members": members }),
            callback,
        );
    }

    pub fn unblock_members(&self, group_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::UNBLOCK_GROUP_MEMBERS,
            json!({ "group_id": group_id, "members": members }),
            callback,
        );
    }

    pub fn add_allow_list(&self, group_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::ADD_GROUP_ALLOW_LIST,
            json!({ "group_id": group_id, "members": members }),
            callback,
        );
    }

    pub fn remove_allow_list(&self, group_id: &str, members: &[String], callback: CallBack) {
        self.unit(
            methods::REMOVE_GROUP_ALLOW_LIST,
            json!({ "group_id": group_id, "members": members }),
            callback,
        );
    }

    /// 屏蔽群消息
    pub fn block_group(&self, group_id: &str, callback: CallBack) {
        self.unit(methods::BLOCK_GROUP, json!({ "group_id": group_id }), callback);
    }

    pub fn unblock_group(&self, group_id: &str, callback: CallBack) {
        self.unit(methods::UNBLOCK_GROUP, json!({ "group_id": group_id }), callback);
    }

    /// 当前用户是否在群白名单中
    pub fn check_if_in_allow_list(&self, group_id: &str, callback: ValueCallBack<bool>) {
        self.core.invoker.invoke_value(
            methods::CHECK_IN_GROUP_ALLOW_LIST,
            json!({ "group_id": group_id }),
            callback,
        );
    }

    pub fn check_if_in_mute_list(&self, group_id: &str, callback: ValueCallBack<bool>) {
        self.core.invoker.invoke_value(
            methods::CHECK_IN_GROUP_MUTE_LIST,
            json!({ "group_id": group_id }),
            callback,
        );
    }

    // ========== 成员属性 ==========

    /// 设置群成员的自定义属性，值为空字符串表示删除该键
    pub fn set_member_attributes(
        &self,
        group_id: &str,
        user_id: &str,
        attributes: &HashMap<String, String>,
        callback: CallBack,
    ) {
        self.unit(
            methods::SET_GROUP_MEMBER_ATTRIBUTES,
            json!({ "group_id": group_id, "user_id": user_id, "attributes": attributes }),
            callback,
        );
    }

    /// 批量拉取成员属性，结果为 `用户 ID -> (键 -> 值)`；`keys` 为空时返回全部属性
    pub fn fetch_member_attributes(
        &self,
        group_id: &str,
        user_ids: &[String],
        keys: &[String],
        callback: ValueCallBack<HashMap<String, HashMap<String, String>>>,
    ) {
        self.core.invoker.invoke_value(
            methods::FETCH_GROUP_MEMBER_ATTRIBUTES,
            json!({ "group_id": group_id, "user_ids": user_ids, "keys": keys }),
            callback,
        );
    }

    /// 当前用户加入的群组总数
    pub fn fetch_my_groups_count(&self, callback: ValueCallBack<u32>) {
        self.core
            .invoker
            .invoke_value(methods::FETCH_MY_GROUPS_COUNT, Value::Null, callback);
    }

    // ========== 群信息 ==========

    pub fn change_name(&self, group_id: &str, name: &str, callback: CallBack) {
        self.unit(
            methods::CHANGE_GROUP_NAME,
            json!({ "group_id": group_id, "name": name }),
            callback,
        );
    }

    pub fn change_description(&self, group_id: &str, description: &str, callback: CallBack) {
        self.unit(
            methods::CHANGE_GROUP_DESCRIPTION,
            json!({ "group_id": group_id, "description": description }),
            callback,
        );
    }

    pub fn update_announcement(&self, group_id: &str, announcement: &str, callback: CallBack) {
        self.unit(
            methods::UPDATE_GROUP_ANNOUNCEMENT,
            json!({ "group_id": group_id, "announcement": announcement }),
            callback,
        );
    }

    pub fn fetch_announcement(&self, group_id: &str, callback: ValueCallBack<String>) {
        self.core.invoker.invoke_value(
            methods::FETCH_GROUP_ANNOUNCEMENT,
            json!({ "group_id": group_id }),
            callback,
        );
    }

    pub fn update_ext(&self, group_id: &str, ext: &str, callback: CallBack) {
        self.unit(
            methods::UPDATE_GROUP_EXT,
            json!({ "group_id": group_id, "ext": ext }),
            callback,
        );
    }

    /// 从服务端获取群详情
    pub fn fetch_specification(&self, group_id: &str, fetch_members: bool, callback: ValueCallBack<Group>) {
        self.core.invoker.invoke_value(
            methods::FETCH_GROUP_SPECIFICATION,
            json!({ "group_id": group_id, "fetch_members": fetch_members }),
            callback,
        );
    }

    /// 传输层本地已知的群信息
    pub fn get_group(&self, group_id: &str) -> Option<Group> {
        match self
            .core
            .invoker
            .call_sync::<Option<Group>>(methods::GET_GROUP, json!({ "group_id": group_id }))
        {
            Ok(group) => group,
            Err(e) => {
                debug!("get_group {} failed: {}", group_id, e);
                None
            }
        }
    }

    // ========== 分页 ==========

    pub fn fetch_members(
        &self,
        group_id: &str,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<String>>,
    ) -> Result<()> {
        let resource = PagedResource::GroupMembers {
            group_id: group_id.to_string(),
        };
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<String>, callback)
    }

    pub fn fetch_public_groups(
        &self,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<GroupInfo>>,
    ) -> Result<()> {
        self.core.pagination.fetch(
            &PagedResource::PublicGroups,
            cursor,
            page_size,
            decode_json::<GroupInfo>,
            callback,
        )
    }

    /// 已加入的群组，`page_number` 从 1 开始，每页最多 20
    pub fn fetch_joined_groups(
        &self,
        page_number: u32,
        page_size: u32,
        need_member_count: bool,
        need_role: bool,
        callback: ValueCallBack<PageResult<Group>>,
    ) -> Result<()> {
        let resource = NumberedResource::JoinedGroups {
            need_member_count,
            need_role,
        };
        self.core.pagination.fetch_numbered(
            &resource,
            page_number,
            page_size,
            decode_json::<Group>,
            callback,
        )
    }

    pub fn fetch_block_list(
        &self,
        group_id: &str,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<String>>,
    ) -> Result<()> {
        let resource = NumberedResource::GroupBlockList {
            group_id: group_id.to_string(),
        };
        self.core
            .pagination
            .fetch_numbered(&resource, page_number, page_size, decode_json::<String>, callback)
    }

    pub fn fetch_mute_list(
        &self,
        group_id: &str,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<String>>,
    ) -> Result<()> {
        let resource = NumberedResource::GroupMuteList {
            group_id: group_id.to_string(),
        };
        self.core
            .pagination
            .fetch_numbered(&resource, page_number, page_size, decode_json::<String>, callback)
    }

    pub fn fetch_allow_list(
        &self,
        group_id: &str,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<String>>,
    ) -> Result<()> {
        let resource = NumberedResource::GroupAllowList {
            group_id: group_id.to_string(),
        };
        self.core
            .pagination
            .fetch_numbered(&resource, page_number, page_size, decode_json::<String>, callback)
    }

    /// 群共享文件列表，`page_number` 从 1 开始
    pub fn fetch_shared_files(
        &self,
        group_id: &str,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<GroupSharedFile>>,
    ) -> Result<()> {
        let resource = NumberedResource::GroupSharedFiles {
            group_id: group_id.to_string(),
        };
        self.core.pagination.fetch_numbered(
            &resource,
            page_number,
            page_size,
            decode_json::<GroupSharedFile>,
            callback,
        )
    }

    pub fn delete_shared_file(&self, group_id: &str, file_id: &str, callback: CallBack) {
        self.unit(
            methods::DELETE_GROUP_SHARED_FILE,
            json!({ "group_id": group_id, "file_id": file_id }),
            callback,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::*;
    use crate::config::ChatSyncConfig;
    use crate::error::ChatSyncError;
    use parking_lot::Mutex;

    #[test]
    fn test_leave_group_respects_delete_flag() {
        let (client, transport) = scripted_client();
        let key = ConversationKey::group("g1");
        client.cache().get_or_create(&key, true);
        client.group_manager().leave_group("g1", CallBack::new());
        assert!(client.cache().conversation(&key).is_some());
        respond_last(&client, &transport, Value::Null);
        assert!(client.cache().conversation(&key).is_none());

        let (client, transport) = scripted_client_with(
            ChatSyncConfig::builder()
                .app_key("k")
                .delete_messages_as_exit_group(false),
        );
        client.cache().get_or_create(&key, true);
        client.group_manager().destroy_group("g1", CallBack::new());
        respond_last(&client, &transport, Value::Null);
        assert!(client.cache().conversation(&key).is_some());
    }

    #[test]
    fn test_member_attributes_keyed_by_user() {
        let (client, transport) = scripted_client();
        let got = Arc::new(Mutex::new(HashMap::new()));
        let g = got.clone();
        client.group_manager().fetch_member_attributes(
            "g1",
            &["u1".to_string(), "u2".to_string()],
            &["nickname".to_string()],
            ValueCallBack::new().on_success(move |attrs| *g.lock() = attrs),
        );
        let call = transport.last_call().unwrap();
        assert_eq!(call.method, methods::FETCH_GROUP_MEMBER_ATTRIBUTES);
        assert_eq!(call.params["keys"][0], "nickname");

        respond_last(
            &client,
            &transport,
            json!({"u1": {"nickname": "A"}, "u2": {}}),
        );
        let attrs = got.lock();
        assert_eq!(attrs["u1"]["nickname"], "A");
        assert!(attrs["u2"].is_empty());
    }

    #[test]
    fn test_list_checks_and_groups_count() {
        let (client, transport) = scripted_client();
        let muted = Arc::new(Mutex::new(None));
        let m = muted.clone();
        client.group_manager().check_if_in_mute_list(
            "g1",
            ValueCallBack::new().on_success(move |v| *m.lock() = Some(v)),
        );
        assert_eq!(transport.last_call().unwrap().method, methods::CHECK_IN_GROUP_MUTE_LIST);
        respond_last(&client, &transport, json!(true));
        assert_eq!(*muted.lock(), Some(true));

        let count = Arc::new(Mutex::new(0u32));
        let c = count.clone();
        client
            .group_manager()
            .fetch_my_groups_count(ValueCallBack::new().on_success(move |n| *c.lock() = n));
        respond_last(&client, &transport, json!(12));
        assert_eq!(*count.lock(), 12);

        let mut attrs = HashMap::new();
        attrs.insert("nickname".to_string(), String::new());
        client
            .group_manager()
            .set_member_attributes("g1", "u1", &attrs, CallBack::new());
        assert_eq!(transport.last_call().unwrap().params["attributes"]["nickname"], "");
    }

    #[test]
    fn test_shared_files_page() {
        let (client, transport) = scripted_client();
        let got = Arc::new(Mutex::new(None));
        let g = got.clone();
        client
            .group_manager()
            .fetch_shared_files(
                "g1",
                1,
                20,
                ValueCallBack::new().on_success(move |page| *g.lock() = Some(page)),
            )
            .unwrap();
        let call = transport.last_call().unwrap();
        assert_eq!(call.method, methods::FETCH_GROUP_SHARED_FILES);
        assert_eq!(call.params["group_id"], "g1");
        assert_eq!(call.params["page_number"], 1);

        respond_last(
            &client,
            &transport,
            json!({"count": 1, "list": [{"file_id": "f1", "file_name": "notes.txt", "file_size": 12}]}),
        );
        let page: PageResult<GroupSharedFile> = got.lock().take().unwrap();
        assert_eq!(page.data[0].file_name, "notes.txt");
        assert_eq!(page.data[0].file_size, 12);
        assert!(page.is_last_page(20));
    }

    #[test]
    fn test_joined_groups_page_size_limit() {
        let (client, transport) = scripted_client();
        let err = client
            .group_manager()
            .fetch_joined_groups(1, 21, false, false, ValueCallBack::new())
            .unwrap_err();
        assert!(matches!(err, ChatSyncError::Validation(_)));
        let err = client
            .group_manager()
            .fetch_joined_groups(0, 20, false, false, ValueCallBack::new())
            .unwrap_err();
        assert!(matches!(err, ChatSyncError::Validation(_)));
        assert!(transport.calls().is_empty());

        let got = Arc::new(Mutex::new(None));
        let g = got.clone();
        client
            .group_manager()
            .fetch_joined_groups(
                1,
                20,
                true,
                false,
                ValueCallBack::new().on_success(move |page| *g.lock() = Some(page)),
            )
            .unwrap();
        let call = transport.last_call().unwrap();
        assert_eq!(call.params["need_member_count"], true);
        respond_last(
            &client,
            &transport,
            json!({"list": [{"group_id": "g1", "name": "team"}]}),
        );
        let page: PageResult<Group> = got.lock().take().unwrap();
        assert_eq!(page.page_count, 1);
        assert_eq!(page.data[0].name, "team");
        assert!(page.is_last_page(20));
    }

    #[test]
    fn test_member_pages_allow_large_sizes() {
        let (client, transport) = scripted_client();
        client
            .group_manager()
            .fetch_members("g1", "", 200, ValueCallBack::new())
            .unwrap();
        assert_eq!(transport.last_call().unwrap().params["group_id"], "g1");
        assert!(client
            .group_manager()
            .fetch_members("g1", "", 201, ValueCallBack::new())
            .is_err());
    }

    #[test]
    fn test_get_group_reads_transport_state() {
        let (client, transport) = scripted_client();
        assert!(client.group_manager().get_group("g1").is_none());
        transport.set_sync_reply(methods::GET_GROUP, json!({"group_id": "g1", "owner": "alice"}));
        assert_eq!(client.group_manager().get_group("g1").unwrap().owner, "alice");
    }
}
