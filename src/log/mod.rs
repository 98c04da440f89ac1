//! 日志模块，支持在不同环境下的日志打印
//! - QEMU/真实设备（`cortex_m3`）：默认使用 cortex-m-semihosting 的 hprint
//! - 单元测试：默认使用标准库的 print
//! - 其他环境：默认丢弃，可通过 [`set_logger`] 安装自定义输出

use core::fmt::{self, Write};
use core::sync::atomic::{AtomicUsize, Ordering};
use spin::RwLock;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(usize)]
pub enum LogLevel {
    /// 错误级别
    Error = 0,
    /// 警告级别
    Warn = 1,
    /// 信息级别
    Info = 2,
    /// 调试级别
    Debug = 3,
    /// 跟踪级别
    Trace = 4,
}

impl LogLevel {
    fn from_usize(value: usize) -> Self {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// 全局日志级别，默认为Info
static GLOBAL_LOG_LEVEL: AtomicUsize = AtomicUsize::new(LogLevel::Info as usize);

/// 自定义日志输出，None 时使用默认输出
static GLOBAL_LOGGER: RwLock<Option<&'static dyn Logger>> = RwLock::new(None);

/// 设置全局日志级别
pub fn set_log_level(level: LogLevel) {
    GLOBAL_LOG_LEVEL.store(level as usize, Ordering::Relaxed);
}

/// 获取全局日志级别
pub fn get_log_level() -> LogLevel {
    LogLevel::from_usize(GLOBAL_LOG_LEVEL.load(Ordering::Relaxed))
}

/// 日志记录器特征
///
/// 实现者需要能在中断上下文之外被任意任务调用。
pub trait Logger: Sync {
    /// 写入字符串到日志
    fn write_str(&self, s: &str) -> fmt::Result;

    /// 刷新日志
    fn flush(&self) -> fmt::Result {
        Ok(())
    }
}

/// 安装自定义日志输出（例如串口驱动）
pub fn set_logger(logger: &'static dyn Logger) {
    *GLOBAL_LOGGER.write() = Some(logger);
}

/// 恢复默认日志输出
pub fn clear_logger() {
    *GLOBAL_LOGGER.write() = None;
}

/// 写入日志：优先使用安装的 Logger
pub fn log_write(s: &str) -> fmt::Result {
    let logger = *GLOBAL_LOGGER.read();
    match logger {
        Some(logger) => logger.write_str(s),
        None => default_write(s),
    }
}

/// QEMU环境下打印日志
#[cfg(all(feature = "cortex_m3", not(test)))]
#[inline(always)]
fn default_write(s: &str) -> fmt::Result {
    cortex_m_semihosting::hprint!("{}", s);
    Ok(())
}

/// 测试环境和主机环境
#[cfg(any(test, not(feature = "cortex_m3")))]
#[inline(always)]
fn default_write(_s: &str) -> fmt::Result {
    #[cfg(test)]
    print!("{}", _s);
    Ok(())
}

/// 打印日志的宏，根据日志级别打印
#[macro_export]
macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        {
            if $level as usize <= $crate::log::get_log_level() as usize {
                use core::fmt::Write;
                let mut writer = $crate::log::LogWriter;
                let _ = write!(writer, $($arg)*);
            }
        }
    };
}

/// 日志写入器
pub struct LogWriter;

impl Write for LogWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        log_write(s)
    }
}

/// 错误级别日志
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Error, "[ERROR] ");
        $crate::log!($crate::log::LogLevel::Error, $($arg)*);
        $crate::log!($crate::log::LogLevel::Error, "\n");
    };
}

/// 警告级别日志
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Warn, "[WARN] ");
        $crate::log!($crate::log::LogLevel::Warn, $($arg)*);
        $crate::log!($crate::log::LogLevel::Warn, "\n");
    };
}

/// 信息级别日志
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Info, "[INFO] ");
        $crate::log!($crate::log::LogLevel::Info, $($arg)*);
        $crate::log!($crate::log::LogLevel::Info, "\n");
    };
}

/// 调试级别日志
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Debug, "[DEBUG] ");
        $crate::log!($crate::log::LogLevel::Debug, $($arg)*);
        $crate::log!($crate::log::LogLevel::Debug, "\n");
    };
}

/// 跟踪级别日志
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!($crate::log::LogLevel::Trace, "[TRACE] ");
        $crate::log!($crate::log::LogLevel::Trace, $($arg)*);
        $crate::log!($crate::log::LogLevel::Trace, "\n");
    };
}
