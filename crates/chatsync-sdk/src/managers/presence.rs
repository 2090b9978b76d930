//! 在线状态管理器
//!
//! 订阅成功的用户会写入本地 `PresenceCache`，之后的推送更新同一份缓存。

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::callback::{CallBack, ValueCallBack};
use crate::client::ClientCore;
use crate::error::Result;
use crate::invoker::decode_json;
use crate::methods;
use crate::model::{PageResult, Presence};
use crate::pagination::NumberedResource;
use crate::storage::PresenceCacheStats;

#[derive(Clone)]
pub struct PresenceManager {
    core: Arc<ClientCore>,
}

impl PresenceManager {
    pub(crate) fn new(core: Arc<ClientCore>) -> Self {
        Self { core }
    }

    /// 发布当前用户的自定义状态描述
    pub fn publish_presence(&self, description: &str, callback: CallBack) {
        self.core.invoker.invoke_unit(
            methods::PUBLISH_PRESENCE,
            json!({ "description": description }),
            callback,
        );
    }

    /// 订阅用户在线状态，`expiry_secs` 为订阅时长
    ///
    /// 成功时返回这些用户的当前状态，并写入缓存。
    pub fn subscribe(
        &self,
        members: &[String],
        expiry_secs: i64,
        callback: ValueCallBack<Vec<Presence>>,
    ) {
        let presence = self.core.presence.clone();
        let subscribed = members.to_vec();
        let callback = callback.before_success(move |list: &Vec<Presence>| {
            presence.add_subscription(&subscribed);
            presence.update(list);
            debug!("📡 subscribed {} presences", subscribed.len());
        });
        self.core.invoker.invoke_value(
            methods::SUBSCRIBE_PRESENCES,
            json!({ "members": members, "expiry": expiry_secs }),
            callback,
        );
    }

    pub fn unsubscribe(&self, members: &[String], callback: CallBack) {
        let presence = self.core.presence.clone();
        let unsubscribed = members.to_vec();
        let callback = callback.before_success(move || presence.remove_subscription(&unsubscribed));
        self.core.invoker.invoke_unit(
            methods::UNSUBSCRIBE_PRESENCES,
            json!({ "members": members }),
            callback,
        );
    }

    /// 分页拉取已订阅的用户 ID，`page_number` 从 1 开始
    pub fn fetch_subscribed_members(
        &self,
        page_number: u32,
        page_size: u32,
        callback: ValueCallBack<PageResult<String>>,
    ) -> Result<()> {
        self.core.pagination.fetch_numbered(
            &NumberedResource::SubscribedPresences,
            page_number,
            page_size,
            decode_json::<String>,
            callback,
        )
    }

    /// 拉取指定用户的最新状态（不订阅），结果同样刷新缓存
    pub fn fetch_presence_status(&self, members: &[String], callback: ValueCallBack<Vec<Presence>>) {
        let presence = self.core.presence.clone();
        let callback = callback.before_success(move |list: &Vec<Presence>| presence.update(list));
        self.core.invoker.invoke_value(
            methods::FETCH_PRESENCE_STATUS,
            json!({ "members": members }),
            callback,
        );
    }

    /// 读缓存；过期或从未缓存时返回 None
    pub fn cached_presence(&self, user_id: &str) -> Option<Presence> {
        self.core.presence.get(user_id)
    }

    pub fn cached_presences(&self, user_ids: &[String]) -> HashMap<String, Presence> {
        self.core.presence.batch_get(user_ids)
    }

    pub fn subscribed_users(&self) -> Vec<String> {
        self.core.presence.subscribed_users()
    }

    pub fn purge_expired(&self) -> usize {
        self.core.presence.purge_expired()
    }

    pub fn cache_stats(&self) -> PresenceCacheStats {
        self.core.presence.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::*;
    use crate::events::EventCategory;
    use serde_json::Value;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_subscribe_fills_cache() {
        let (client, transport) = scripted_client();
        let manager = client.presence_manager();
        manager.subscribe(&ids(&["u1", "u2"]), 3600, ValueCallBack::new());

        let call = transport.last_call().unwrap();
        assert_eq!(call.method, methods::SUBSCRIBE_PRESENCES);
        assert_eq!(call.params["expiry"], 3600);

        respond_last(
            &client,
            &transport,
            json!([{"publisher": "u1", "status_list": [{"device_id": "ios", "status": 1}]}]),
        );
        assert_eq!(manager.subscribed_users(), ids(&["u1", "u2"]));
        assert!(manager.cached_presence("u1").unwrap().is_online());
        assert!(manager.cached_presence("u2").is_none());
        assert_eq!(manager.cache_stats().cached_users, 1);
    }

    #[test]
    fn test_failed_subscribe_leaves_cache_untouched() {
        let (client, transport) = scripted_client();
        let manager = client.presence_manager();
        manager.subscribe(&ids(&["u1"]), 60, ValueCallBack::new());
        fail_last(&client, &transport, 300);
        assert!(manager.subscribed_users().is_empty());
    }

    #[test]
    fn test_unsubscribe_drops_status() {
        let (client, transport) = scripted_client();
        let manager = client.presence_manager();
        manager.subscribe(&ids(&["u1"]), 60, ValueCallBack::new());
        respond_last(&client, &transport, json!([{"publisher": "u1"}]));
        assert!(manager.cached_presence("u1").is_some());

        manager.unsubscribe(&ids(&["u1"]), CallBack::new());
        respond_last(&client, &transport, Value::Null);
        assert!(manager.cached_presence("u1").is_none());
        assert!(manager.subscribed_users().is_empty());
    }

    #[test]
    fn test_push_updates_cached_presence() {
        let (client, _transport) = scripted_client();
        client
            .handle_push(
                EventCategory::Presence,
                "presence_updated",
                json!([{"publisher": "u9", "status_description": "busy"}]),
            )
            .unwrap();
        let cached = client.presence_manager().cached_presence("u9").unwrap();
        assert_eq!(cached.status_description, "busy");
    }

    #[test]
    fn test_fetch_subscribed_members_rejects_page_zero() {
        let (client, transport) = scripted_client();
        let result = client
            .presence_manager()
            .fetch_subscribed_members(0, 20, ValueCallBack::new());
        assert!(result.is_err());
        assert!(transport.calls().is_empty());
    }
}
