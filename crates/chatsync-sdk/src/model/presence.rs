use serde::{Deserialize, Serialize};

/// 单个设备的在线状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceDeviceStatus {
    pub device_id: String,
    /// 0 表示离线，其余为在线
    #[serde(default)]
    pub status: i32,
}

/// 用户在线状态
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presence {
    pub publisher: String,
    pub status_list: Vec<PresenceDeviceStatus>,
    pub status_description: String,
    pub latest_time: i64,
    pub expiry_time: i64,
}

impl Presence {
    /// 任一设备在线即视为在线
    pub fn is_online(&self) -> bool {
        self.status_list.iter().any(|d| d.status != 0)
    }
}
