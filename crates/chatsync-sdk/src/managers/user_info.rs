//! 用户属性管理器

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::callback::ValueCallBack;
use crate::client::ClientCore;
use crate::methods;
use crate::model::UserInfo;

#[derive(Clone)]
pub struct UserInfoManager {
    core: Arc<ClientCore>,
}

impl UserInfoManager {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    /// 更新当前用户属性，成功后服务端返回的结果写入本地缓存
    pub fn update_own_user_info(&self, info: UserInfo, callback: ValueCallBack<UserInfo>) {
        let user_infos = self.core.user_infos.clone();
        let callback = callback.before_success(move |updated: &UserInfo| {
            user_infos
                .write()
                .insert(updated.user_id.clone(), updated.clone());
        });
        self.core
            .invoker
            .invoke_value(methods::UPDATE_OWN_USER_INFO, json!({ "info": info }), callback);
    }

    /// 批量拉取用户属性，结果以用户 ID 为键
    pub fn fetch_user_info(
        &self,
        user_ids: &[String],
        callback: ValueCallBack<HashMap<String, UserInfo>>,
    ) {
        let user_infos = self.core.user_infos.clone();
        let callback = callback.before_success(move |fetched: &HashMap<String, UserInfo>| {
            let mut cache = user_infos.write();
            for (user_id, info) in fetched {
                cache.insert(user_id.clone(), info.clone());
            }
        });
        self.core.invoker.invoke_value(
            methods::FETCH_USER_INFO,
            json!({ "user_ids": user_ids }),
            callback,
        );
    }

    pub fn cached_user_info(&self, user_id: &str) -> Option<UserInfo> {
        self.core.user_infos.read().get(user_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CallBack;
    use crate::client::test_support::*;
    use serde_json::Value;

    #[test]
    fn test_fetch_user_info_caches_result() {
        let (client, transport) = scripted_client();
        let manager = client.user_info_manager();
        manager.fetch_user_info(&["u1".to_string()], ValueCallBack::new());
        assert_eq!(transport.last_call().unwrap().params["user_ids"][0], "u1");

        respond_last(
            &client,
            &transport,
            json!({"u1": {"user_id": "u1", "nick_name": "Alice", "gender": 2}}),
        );
        let cached = manager.cached_user_info("u1").unwrap();
        assert_eq!(cached.nick_name, "Alice");
        assert_eq!(cached.gender, 2);
        assert!(manager.cached_user_info("u2").is_none());
    }

    #[test]
    fn test_update_own_user_info_failure_not_cached() {
        let (client, transport) = scripted_client();
        let manager = client.user_info_manager();
        let info = UserInfo {
            user_id: "me".into(),
            nick_name: "Me".into(),
            ..Default::default()
        };
        manager.update_own_user_info(info, ValueCallBack::new());
        fail_last(&client, &transport, 400);
        assert!(manager.cached_user_info("me").is_none());
    }

    #[test]
    fn test_logout_clears_user_infos() {
        let (client, transport) = scripted_client();
        let manager = client.user_info_manager();
        manager.fetch_user_info(&["u1".to_string()], ValueCallBack::new());
        respond_last(&client, &transport, json!({"u1": {"user_id": "u1"}}));
        assert!(manager.cached_user_info("u1").is_some());

        client.logout(false, CallBack::new());
        respond_last(&client, &transport, Value::Null);
        assert!(manager.cached_user_info("u1").is_none());
    }
}
