//! SDK 版本与构建元信息

/// SDK semver，来自 Cargo.toml
///
/// 禁止手写版本号，必须用 `env!("CARGO_PKG_VERSION")` 与 Cargo.toml 保持同步。
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// build time（由 vergen 在 build.rs 中生成）
pub const BUILD_TIME: &str = match option_env!("VERGEN_BUILD_TIMESTAMP") {
    Some(ts) => ts,
    None => "unknown",
};

/// 形如 `chatsync-sdk/0.1.0 (2026-01-01T00:00:00Z)` 的版本串，登录时上报给传输层
pub fn user_agent() -> String {
    format!("chatsync-sdk/{} ({})", SDK_VERSION, BUILD_TIME)
}
