//! 编译期生成 BUILD_TIMESTAMP 等元信息（供 version.rs 使用）

use vergen::EmitBuilder;

fn main() {
    // vergen 失败时不影响编译，version.rs 里会回退到 "unknown"
    let _ = EmitBuilder::builder().build_timestamp().emit();
}
