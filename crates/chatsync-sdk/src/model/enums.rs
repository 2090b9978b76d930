use serde::{Deserialize, Serialize};

/// 会话类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    /// 单聊
    #[serde(alias = "chat")]
    Direct,
    /// 群聊
    Group,
    /// 聊天室
    Room,
}

impl Default for ConversationType {
    fn default() -> Self {
        ConversationType::Direct
    }
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationType::Direct => "direct",
            ConversationType::Group => "group",
            ConversationType::Room => "room",
        }
    }
}

/// 消息方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Send,
    Receive,
}

impl Default for MessageDirection {
    fn default() -> Self {
        MessageDirection::Send
    }
}

/// 消息发送状态
///
/// 只允许前进：Create → Progress → {Success, Fail}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Create,
    Progress,
    Success,
    Fail,
}

impl Default for MessageStatus {
    fn default() -> Self {
        MessageStatus::Create
    }
}

impl MessageStatus {
    fn rank(&self) -> u8 {
        match self {
            MessageStatus::Create => 0,
            MessageStatus::Progress => 1,
            MessageStatus::Success | MessageStatus::Fail => 2,
        }
    }

    /// 检查是否可以从当前状态转换到目标状态（相同状态视为幂等，允许）
    pub fn can_transition_to(&self, target: MessageStatus) -> bool {
        if *self == target {
            return true;
        }
        if self.is_final_state() {
            return false;
        }
        target.rank() > self.rank()
    }

    pub fn is_final_state(&self) -> bool {
        matches!(self, MessageStatus::Success | MessageStatus::Fail)
    }
}

/// 消息体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBodyType {
    Text,
    Image,
    Video,
    Location,
    Voice,
    File,
    Cmd,
    Custom,
    Combine,
}

/// 本地消息加载方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSearchDirection {
    /// 向更早的消息方向加载
    Up,
    /// 向更新的消息方向加载
    Down,
}

impl Default for MessageSearchDirection {
    fn default() -> Self {
        MessageSearchDirection::Up
    }
}

/// 关键字搜索范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSearchScope {
    /// 只搜索消息内容
    Content,
    /// 只搜索扩展属性
    Ext,
    /// 内容和扩展属性
    All,
}

impl Default for MessageSearchScope {
    fn default() -> Self {
        MessageSearchScope::Content
    }
}

/// 附件下载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Downloading,
    Success,
    Failed,
    Pending,
}

impl Default for DownloadStatus {
    fn default() -> Self {
        DownloadStatus::Pending
    }
}

/// 多设备事件操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiDevicesOperation {
    Unknown,
    ContactRemove,
    ContactAccept,
    ContactDecline,
    ContactBan,
    ContactAllow,
    GroupCreate,
    GroupDestroy,
    GroupJoin,
    GroupLeave,
    GroupApply,
    GroupApplyAccept,
    GroupApplyDecline,
    GroupInvite,
    GroupInviteAccept,
    GroupInviteDecline,
    GroupKick,
    GroupBan,
    GroupAllow,
    GroupBlock,
    GroupUnblock,
    GroupAssignOwner,
    GroupAddAdmin,
    GroupRemoveAdmin,
    GroupAddMute,
    GroupRemoveMute,
    ThreadCreate,
    ThreadDestroy,
    ThreadJoin,
    ThreadLeave,
    ThreadUpdate,
    ThreadKick,
    ConversationPinned,
    ConversationUnpinned,
    ConversationDeleted,
}
