//! 兼容层模块
//!
//! 统一处理 no_std 和 test 环境的类型导入。
//!
//! - `Arc` - 任务入口的共享引用（`copy_tcb` 需要复制入口）
//! - `Vec` - 池和 TCB 快照
//! - `String` - 仅测试中用于捕获输出

#[cfg(not(test))]
pub use alloc::{sync::Arc, vec::Vec};

#[cfg(test)]
pub use std::{string::String, sync::Arc, vec::Vec};
