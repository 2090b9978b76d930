//! 日志初始化

use tracing::Level;

/// 安装全局 fmt 订阅者；`debug_mode` 为 true 时输出 DEBUG 级别
///
/// 已经安装过订阅者时返回 false，不覆盖宿主的设置。
pub fn init_tracing(debug_mode: bool) -> bool {
    let level = if debug_mode { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        init_tracing(true);
        assert!(!init_tracing(false));
    }
}
