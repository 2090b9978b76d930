use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPermissionType {
    Unknown,
    Member,
    Admin,
    Owner,
}

impl Default for RoomPermissionType {
    fn default() -> Self {
        RoomPermissionType::Unknown
    }
}

/// 聊天室
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    pub room_id: String,
    pub name: String,
    pub description: String,
    pub announcement: String,
    pub member_count: u32,
    pub admin_list: Vec<String>,
    pub member_list: Vec<String>,
    pub block_list: Vec<String>,
    pub mute_list: Vec<String>,
    pub max_users: u32,
    pub owner: String,
    pub is_all_member_muted: bool,
    pub permission_type: RoomPermissionType,
    pub create_timestamp: i64,
    pub is_in_allow_list: bool,
    pub mute_until_timestamp: i64,
}
