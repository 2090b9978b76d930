use serde::{Deserialize, Serialize};

/// 群组类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStyle {
    /// 私有群，仅群主可邀请
    PrivateOnlyOwnerInvite,
    /// 私有群，成员可邀请
    PrivateMemberCanInvite,
    /// 公开群，加入需审批
    PublicJoinNeedApproval,
    /// 公开群，自由加入
    PublicOpenJoin,
}

impl Default for GroupStyle {
    fn default() -> Self {
        GroupStyle::PrivateOnlyOwnerInvite
    }
}

/// 当前用户在群内的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPermissionType {
    Unknown,
    Member,
    Admin,
    Owner,
}

impl Default for GroupPermissionType {
    fn default() -> Self {
        GroupPermissionType::Unknown
    }
}

/// 建群选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOptions {
    #[serde(default)]
    pub style: GroupStyle,
    pub max_count: u32,
    #[serde(default)]
    pub invite_need_confirm: bool,
    #[serde(default)]
    pub ext: String,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            style: GroupStyle::default(),
            max_count: 200,
            invite_need_confirm: false,
            ext: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub group_id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub announcement: String,
    pub member_count: u32,
    pub member_list: Vec<String>,
    pub admin_list: Vec<String>,
    pub block_list: Vec<String>,
    pub mute_list: Vec<String>,
    pub notice_enabled: bool,
    pub message_blocked: bool,
    pub is_all_member_muted: bool,
    pub permission_type: GroupPermissionType,
    pub is_member_only: bool,
    pub is_member_allow_to_invite: bool,
    pub max_user_count: u32,
    pub is_disabled: bool,
    pub ext: String,
}

/// 公开群列表中的简要信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_id: String,
    #[serde(default)]
    pub group_name: String,
}

/// 群共享文件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSharedFile {
    pub file_id: String,
    pub file_name: String,
    pub file_owner: String,
    pub create_time: i64,
    pub file_size: i64,
}

/// 群消息已读回执
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupReadAck {
    pub ack_id: String,
    pub msg_id: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub content: String,
    /// 该消息当前的已读人数
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub timestamp: i64,
}
