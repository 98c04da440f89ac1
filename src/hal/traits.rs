//! 硬件抽象层 Trait 定义

/// 时钟源 trait
///
/// 以固定周期产生 tick。每个 tick 通过 [`Systick::signal_tick`] 交给调度器，
/// 或者由调用者直接调用 [`Scheduler::tick`]。
///
/// [`Systick::signal_tick`]: crate::kernel::time::systick::Systick::signal_tick
/// [`Scheduler::tick`]: crate::kernel::scheduler::Scheduler::tick
pub trait TickSource {
    /// 按 `period_ms` 毫秒的周期启动时钟
    fn start(&mut self, period_ms: u32);

    /// 等待下一个 tick 到来
    ///
    /// 可以提前返回（调度器会检查挂起的 tick 数），但不应忙等很久。
    fn wait_for_tick(&mut self);
}
