//! 在线状态缓存
//!
//! 功能包括：
//! - 记录当前订阅的用户
//! - 缓存在线状态（查询结果与服务端推送）
//! - 按 TTL 过期、按容量淘汰最早写入的条目

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::PresenceCacheConfig;
use crate::model::Presence;
use crate::utils::now_millis;

#[derive(Debug, Clone)]
struct CachedPresence {
    presence: Presence,
    cached_at: i64,
}

#[derive(Default)]
struct PresenceInner {
    statuses: HashMap<String, CachedPresence>,
    subscribed: HashSet<String>,
}

/// 在线状态缓存
pub struct PresenceCache {
    inner: RwLock<PresenceInner>,
    config: PresenceCacheConfig,
}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceCacheStats {
    /// 已缓存的用户数
    pub cached_users: usize,
    /// 已订阅的用户数
    pub subscribed_users: usize,
    /// 最大缓存大小
    pub max_entries: usize,
    /// 缓存TTL（秒）
    pub ttl_secs: u64,
}

impl PresenceCache {
    pub fn new(config: PresenceCacheConfig) -> Self {
        Self {
            inner: RwLock::new(PresenceInner::default()),
            config,
        }
    }

    fn ttl_millis(&self) -> i64 {
        (self.config.ttl_secs as i64).saturating_mul(1000)
    }

    pub fn add_subscription(&self, user_ids: &[String]) {
        let mut inner = self.inner.write();
        inner.subscribed.extend(user_ids.iter().cloned());
        debug!("Added {} subscriptions, total: {}", user_ids.len(), inner.subscribed.len());
    }

    pub fn remove_subscription(&self, user_ids: &[String]) {
        let mut inner = self.inner.write();
        for user_id in user_ids {
            inner.subscribed.remove(user_id);
            inner.statuses.remove(user_id);
        }
        debug!(
            "Removed {} subscriptions, remaining: {}",
            user_ids.len(),
            inner.subscribed.len()
        );
    }

    pub fn is_subscribed(&self, user_id: &str) -> bool {
        self.inner.read().subscribed.contains(user_id)
    }

    pub fn subscribed_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.inner.read().subscribed.iter().cloned().collect();
        users.sort();
        users
    }

    /// 写入一批状态；容量已满时先淘汰最早写入的条目
    pub fn update(&self, presences: &[Presence]) {
        let now = now_millis();
        let mut inner = self.inner.write();
        for presence in presences {
            if inner.statuses.len() >= self.config.max_entries
                && !inner.statuses.contains_key(&presence.publisher)
            {
                let oldest = inner
                    .statuses
                    .iter()
                    .min_by_key(|(_, cached)| cached.cached_at)
                    .map(|(user_id, _)| user_id.clone());
                match oldest {
                    Some(user_id) => {
                        warn!(
                            "Presence cache limit reached ({}), evicting {}",
                            self.config.max_entries, user_id
                        );
                        inner.statuses.remove(&user_id);
                    }
                    None => break,
                }
            }
            inner.statuses.insert(
                presence.publisher.clone(),
                CachedPresence {
                    presence: presence.clone(),
                    cached_at: now,
                },
            );
        }
        debug!("Updated {} presences, cache size: {}", presences.len(), inner.statuses.len());
    }

    /// 读取缓存；过期条目视为不存在
    pub fn get(&self, user_id: &str) -> Option<Presence> {
        let ttl = self.ttl_millis();
        let now = now_millis();
        self.inner
            .read()
            .statuses
            .get(user_id)
            .filter(|cached| now - cached.cached_at <= ttl)
            .map(|cached| cached.presence.clone())
    }

    pub fn batch_get(&self, user_ids: &[String]) -> HashMap<String, Presence> {
        user_ids
            .iter()
            .filter_map(|id| self.get(id).map(|p| (id.clone(), p)))
            .collect()
    }

    /// 清掉过期条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl_millis();
        let now = now_millis();
        let mut inner = self.inner.write();
        let before = inner.statuses.len();
        inner.statuses.retain(|_, cached| now - cached.cached_at <= ttl);
        before - inner.statuses.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.statuses.clear();
        inner.subscribed.clear();
        info!("Cleared presence cache");
    }

    pub fn stats(&self) -> PresenceCacheStats {
        let inner = self.inner.read();
        PresenceCacheStats {
            cached_users: inner.statuses.len(),
            subscribed_users: inner.subscribed.len(),
            max_entries: self.config.max_entries,
            ttl_secs: self.config.ttl_secs,
        }
    }
}
