//! 子区管理器

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::callback::{CallBack, ValueCallBack};
use crate::client::ClientCore;
use crate::error::Result;
use crate::invoker::decode_json;
use crate::methods;
use crate::model::{ChatThread, ConversationKey, CursorPage, Message};
use crate::pagination::PagedResource;

#[derive(Clone)]
pub struct ThreadManager {
    core: Arc<ClientCore>,
}

impl ThreadManager {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    fn unit(&self, method: &str, params: Value, callback: CallBack) {
        self.core.invoker.invoke_unit(method, params, callback);
    }

    /// 基于群组中的一条消息创建子区
    pub fn create_thread(
        &self,
        name: &str,
        msg_id: &str,
        parent_id: &str,
        callback: ValueCallBack<ChatThread>,
    ) {
        self.core.invoker.invoke_value(
            methods::CREATE_THREAD,
            json!({ "name": name, "msg_id": msg_id, "parent_id": parent_id }),
            callback,
        );
    }

    pub fn join_thread(&self, thread_id: &str, callback: ValueCallBack<ChatThread>) {
        self.core.invoker.invoke_value(
            methods::JOIN_THREAD,
            json!({ "thread_id": thread_id }),
            callback,
        );
    }

    pub fn leave_thread(&self, thread_id: &str, callback: CallBack) {
        self.unit(methods::LEAVE_THREAD, json!({ "thread_id": thread_id }), callback);
    }

    /// 解散子区，成功后删除本地子区会话
    pub fn destroy_thread(&self, thread_id: &str, callback: CallBack) {
        let cache = self.core.cache.clone();
        let key = ConversationKey::thread(thread_id);
        let callback = callback.before_success(move || {
            cache.delete_conversation(&key, true);
        });
        self.unit(methods::DESTROY_THREAD, json!({ "thread_id": thread_id }), callback);
    }

    pub fn change_thread_name(&self, thread_id: &str, name: &str, callback: CallBack) {
        self.unit(
            methods::CHANGE_THREAD_NAME,
            json!({ "thread_id": thread_id, "name": name }),
            callback,
        );
    }

    pub fn remove_thread_member(&self, thread_id: &str, user_id: &str, callback: CallBack) {
        self.unit(
            methods::REMOVE_THREAD_MEMBER,
            json!({ "thread_id": thread_id, "user_id": user_id }),
            callback,
        );
    }

    pub fn fetch_thread_detail(&self, thread_id: &str, callback: ValueCallBack<ChatThread>) {
        self.core.invoker.invoke_value(
            methods::FETCH_THREAD_DETAIL,
            json!({ "thread_id": thread_id }),
            callback,
        );
    }

    /// 批量拉取子区最后一条消息，结果以子区 ID 为键
    pub fn fetch_last_messages(
        &self,
        thread_ids: &[String],
        callback: ValueCallBack<HashMap<String, Message>>,
    ) {
        self.core.invoker.invoke_value(
            methods::FETCH_THREAD_LAST_MESSAGES,
            json!({ "thread_ids": thread_ids }),
            callback,
        );
    }

    // ========== 游标分页 ==========

    pub fn fetch_thread_members(
        &self,
        thread_id: &str,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<String>>,
    ) -> Result<()> {
        let resource = PagedResource::ThreadMembers {
            thread_id: thread_id.to_string(),
        };
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<String>, callback)
    }

    /// 当前用户加入的子区；`group_id` 为 None 时跨所有群组
    pub fn fetch_joined_threads(
        &self,
        group_id: Option<&str>,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<ChatThread>>,
    ) -> Result<()> {
        let resource = PagedResource::JoinedThreads {
            group_id: group_id.map(str::to_string),
        };
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<ChatThread>, callback)
    }

    pub fn fetch_group_threads(
        &self,
        group_id: &str,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<ChatThread>>,
    ) -> Result<()> {
        let resource = PagedResource::GroupThreads {
            group_id: group_id.to_string(),
        };
        self.core
            .pagination
            .fetch(&resource, cursor, page_size, decode_json::<ChatThread>, callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::*;
    use crate::model::MessageBody;
    use parking_lot::Mutex;

    #[test]
    fn test_destroy_thread_removes_thread_conversation() {
        let (client, transport) = scripted_client();
        let thread_key = ConversationKey::thread("t1");
        let group_key = ConversationKey::group("t1");
        client.cache().get_or_create(&thread_key, true);
        client.cache().get_or_create(&group_key, true);

        client.thread_manager().destroy_thread("t1", CallBack::new());
        respond_last(&client, &transport, Value::Null);

        assert!(client.cache().conversation(&thread_key).is_none());
        assert!(client.cache().conversation(&group_key).is_some());
    }

    #[test]
    fn test_joined_threads_without_group() {
        let (client, transport) = scripted_client();
        let got = Arc::new(Mutex::new(None));
        let g = got.clone();
        client
            .thread_manager()
            .fetch_joined_threads(
                None,
                "",
                20,
                ValueCallBack::new().on_success(move |page| *g.lock() = Some(page)),
            )
            .unwrap();
        let call = transport.last_call().unwrap();
        assert_eq!(call.method, methods::FETCH_JOINED_THREADS);
        assert!(call.params["group_id"].is_null());

        respond_last(
            &client,
            &transport,
            json!({"cursor": "", "list": [{"thread_id": "t1", "name": "topic", "parent_id": "g1"}]}),
        );
        let page: CursorPage<ChatThread> = got.lock().take().unwrap();
        assert_eq!(page.data[0].parent_id, "g1");
        assert!(page.is_end_of_stream(""));
    }

    #[test]
    fn test_thread_members_page_size_limit() {
        let (client, transport) = scripted_client();
        let result = client
            .thread_manager()
            .fetch_thread_members("t1", "", 51, ValueCallBack::new());
        assert!(result.is_err());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_fetch_last_messages_keyed_by_thread() {
        let (client, transport) = scripted_client();
        let got = Arc::new(Mutex::new(HashMap::new()));
        let g = got.clone();
        client.thread_manager().fetch_last_messages(
            &["t1".to_string()],
            ValueCallBack::new().on_success(move |map| *g.lock() = map),
        );
        let reply = Message::create_text_send_message("t1", "last");
        respond_last(&client, &transport, json!({ "t1": reply }));

        let map = got.lock();
        match &map["t1"].body {
            MessageBody::Text(body) => assert_eq!(body.text, "last"),
            other => panic!("unexpected body {:?}", other),
        }
    }
}
