use serde::{Deserialize, Serialize};

use crate::error::{ChatSyncError, Result};

/// SDK 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSyncConfig {
    /// 应用标识
    pub app_key: String,
    /// 调试模式（打开更详细的日志）
    pub debug_mode: bool,
    /// 会话内消息按服务端时间排序；关闭后始终按本地时间排序
    pub sort_message_by_server_time: bool,
    /// 导入的消息视为已读
    pub regard_import_msg_as_read: bool,
    /// 退出/被移出群组时删除本地消息
    pub delete_messages_as_exit_group: bool,
    /// 退出/被移出聊天室时删除本地消息
    pub delete_messages_as_exit_room: bool,
    /// 会话列表是否包含没有消息的会话
    pub enable_empty_conversation: bool,
    /// 调用方未指定时的默认分页大小
    pub default_page_size: u32,
    /// 事件广播通道容量
    pub event_buffer_size: usize,
    /// 在线状态缓存
    pub presence_cache: PresenceCacheConfig,
}

/// 在线状态缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceCacheConfig {
    /// 缓存过期时间（秒）
    pub ttl_secs: u64,
    /// 最大缓存条目数
    pub max_entries: usize,
}

impl Default for PresenceCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 1000,
        }
    }
}

impl Default for ChatSyncConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            debug_mode: false,
            sort_message_by_server_time: true,
            regard_import_msg_as_read: false,
            delete_messages_as_exit_group: true,
            delete_messages_as_exit_room: true,
            enable_empty_conversation: false,
            default_page_size: 20,
            event_buffer_size: 1000,
            presence_cache: PresenceCacheConfig::default(),
        }
    }
}

impl ChatSyncConfig {
    pub fn builder() -> ChatSyncConfigBuilder {
        ChatSyncConfigBuilder::new()
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.app_key.trim().is_empty() {
            return Err(ChatSyncError::Validation("app_key must not be empty".into()));
        }
        if self.default_page_size == 0 {
            return Err(ChatSyncError::Validation(
                "default_page_size must be greater than 0".into(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(ChatSyncError::Validation(
                "event_buffer_size must be greater than 0".into(),
            ));
        }
        if self.presence_cache.max_entries == 0 {
            return Err(ChatSyncError::Validation(
                "presence_cache.max_entries must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

pub struct ChatSyncConfigBuilder {
    config: ChatSyncConfig,
}

impl Default for ChatSyncConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSyncConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ChatSyncConfig::default(),
        }
    }

    pub fn app_key<S: Into<String>>(mut self, app_key: S) -> Self {
        self.config.app_key = app_key.into();
        self
    }

    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.config.debug_mode = enabled;
        self
    }

    pub fn sort_message_by_server_time(mut self, enabled: bool) -> Self {
        self.config.sort_message_by_server_time = enabled;
        self
    }

    pub fn regard_import_msg_as_read(mut self, enabled: bool) -> Self {
        self.config.regard_import_msg_as_read = enabled;
        self
    }

    pub fn delete_messages_as_exit_group(mut self, enabled: bool) -> Self {
        self.config.delete_messages_as_exit_group = enabled;
        self
    }

    pub fn delete_messages_as_exit_room(mut self, enabled: bool) -> Self {
        self.config.delete_messages_as_exit_room = enabled;
        self
    }

    pub fn enable_empty_conversation(mut self, enabled: bool) -> Self {
        self.config.enable_empty_conversation = enabled;
        self
    }

    pub fn default_page_size(mut self, size: u32) -> Self {
        self.config.default_page_size = size;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config.event_buffer_size = size;
        self
    }

    pub fn presence_cache(mut self, config: PresenceCacheConfig) -> Self {
        self.config.presence_cache = config;
        self
    }

    /// 构建并校验配置
    pub fn build(self) -> Result<ChatSyncConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
