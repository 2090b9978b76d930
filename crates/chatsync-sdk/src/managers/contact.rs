//! 联系人管理器

use serde_json::json;
use std::sync::Arc;

use crate::callback::{CallBack, ValueCallBack};
use crate::client::ClientCore;
use crate::error::Result;
use crate::invoker::decode_json;
use crate::methods;
use crate::model::{Contact, ConversationKey, CursorPage};
use crate::pagination::PagedResource;

#[derive(Clone)]
pub struct ContactManager {
    core: Arc<ClientCore>,
}

impl ContactManager {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    /// 发送好友申请
    pub fn add_contact(&self, user_id: &str, reason: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::ADD_CONTACT,
            json!({ "user_id": user_id, "reason": reason }),
            callback,
        );
    }

    /// 删除好友；`keep_conversation` 为 false 时同时删除本地会话和消息
    pub fn delete_contact(&self, user_id: &str, keep_conversation: bool, callback: CallBack) {
        let cache = self.core.cache.clone();
        let key = ConversationKey::direct(user_id);
        let callback = callback.before_success(move || {
            if !keep_conversation {
                cache.delete_conversation(&key, true);
            }
        });
        self.core.invoker.invoke_unit(
            methods::DELETE_CONTACT,
            json!({ "user_id": user_id, "keep_conversation": keep_conversation }),
            callback,
        );
    }

    pub fn accept_invitation(&self, user_id: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::ACCEPT_CONTACT_INVITATION,
            json!({ "user_id": user_id }),
            callback,
        );
    }

    pub fn decline_invitation(&self, user_id: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::DECLINE_CONTACT_INVITATION,
            json!({ "user_id": user_id }),
            callback,
        );
    }

    pub fn fetch_all_contact_ids(&self, callback: ValueCallBack<Vec<String>>) {
        self.core
            .invoker
            .invoke_value(methods::FETCH_ALL_CONTACT_IDS, json!({}), callback);
    }

    /// 游标分页拉取联系人（带备注）
    pub fn fetch_contacts(
        &self,
        cursor: &str,
        page_size: u32,
        callback: ValueCallBack<CursorPage<Contact>>,
    ) -> Result<()> {
        self.core.pagination.fetch(
            &PagedResource::Contacts,
            cursor,
            page_size,
            decode_json::<Contact>,
            callback,
        )
    }

    pub fn set_contact_remark(&self, user_id: &str, remark: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::SET_CONTACT_REMARK,
            json!({ "user_id": user_id, "remark": remark }),
            callback,
        );
    }

    pub fn add_user_to_block_list(&self, user_id: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::ADD_USER_TO_BLOCK_LIST,
            json!({ "user_id": user_id }),
            callback,
        );
    }

    pub fn remove_user_from_block_list(&self, user_id: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::REMOVE_USER_FROM_BLOCK_LIST,
            json!({ "user_id": user_id }),
            callback,
        );
    }

    pub fn fetch_block_list(&self, callback: ValueCallBack<Vec<String>>) {
        self.core
            .invoker
            .invoke_value(methods::FETCH_CONTACT_BLOCK_LIST, json!({}), callback);
    }

    /// 当前账号在其他平台登录时使用的 ID
    pub fn self_ids_on_other_platform(&self, callback: ValueCallBack<Vec<String>>) {
        self.core
            .invoker
            .invoke_value(methods::SELF_IDS_ON_OTHER_PLATFORM, json!({}), callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::*;
    use parking_lot::Mutex;
    use serde_json::Value;

    #[test]
    fn test_delete_contact_drops_conversation() {
        let (client, transport) = scripted_client();
        let key = ConversationKey::direct("bob");
        client.cache().get_or_create(&key, true);

        client
            .contact_manager()
            .delete_contact("bob", true, CallBack::new());
        respond_last(&client, &transport, Value::Null);
        assert!(client.cache().conversation(&key).is_some());

        client
            .contact_manager()
            .delete_contact("bob", false, CallBack::new());
        respond_last(&client, &transport, Value::Null);
        assert!(client.cache().conversation(&key).is_none());
    }

    #[test]
    fn test_fetch_contacts_page() {
        let (client, transport) = scripted_client();
        let got = Arc::new(Mutex::new(None));
        let g = got.clone();
        client
            .contact_manager()
            .fetch_contacts(
                "",
                20,
                ValueCallBack::new().on_success(move |page| *g.lock() = Some(page)),
            )
            .unwrap();
        let call = transport.last_call().unwrap();
        assert_eq!(call.method, methods::FETCH_CONTACTS);
        assert_eq!(call.params["page_size"], 20);

        respond_last(
            &client,
            &transport,
            json!({"cursor": "c2", "list": [{"user_id": "bob", "remark": "Bobby"}, {"user_id": "eve"}]}),
        );
        let page: CursorPage<Contact> = got.lock().take().unwrap();
        assert_eq!(page.cursor, "c2");
        assert_eq!(page.data[0].remark, "Bobby");
        assert_eq!(page.data[1].remark, "");
    }

    #[test]
    fn test_fetch_all_contact_ids_decodes_list() {
        let (client, transport) = scripted_client();
        let got = Arc::new(Mutex::new(Vec::new()));
        let g = got.clone();
        client
            .contact_manager()
            .fetch_all_contact_ids(ValueCallBack::new().on_success(move |ids| *g.lock() = ids));
        respond_last(&client, &transport, json!(["a", "b"]));
        assert_eq!(*got.lock(), vec!["a".to_string(), "b".to_string()]);
    }
}
