use serde::{Deserialize, Serialize};

/// 联系人
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub user_id: String,
    #[serde(default)]
    pub remark: String,
}

/// 用户属性
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub user_id: String,
    pub nick_name: String,
    pub avatar_url: String,
    pub email: String,
    pub phone_number: String,
    pub signature: String,
    pub birth: String,
    pub ext: String,
    /// 0 未知 1 男 2 女
    pub gender: i32,
}
