use crate::kernel::scheduler::Scheduler;
use crate::kernel::time::systick::Systick;
use crate::utils::contract_violation;

pub struct Delay;

impl Delay {
    /// 当前任务睡眠 `ms` 毫秒（固件中的 sleep_474）
    ///
    /// 不阻塞：只在 TCB 中记录 `sleep_until = now + ticks(ms)` 并立即返回，
    /// 任务体随后应尽快返回。`ms == 0` 等同于 [`Delay::yield_now`]。
    ///
    /// # Panics
    ///
    /// 不在运行中的任务体内调用，或同一次调用中已经请求过睡眠/退出时 panic。
    ///
    /// # 示例
    /// ```rust,ignore
    /// fn blink() {
    ///     led::toggle();
    ///     Delay::sleep(FLASH_DURATION);
    /// }
    /// ```
    pub fn sleep(ms: u32) {
        Scheduler::sleep_current(Systick::ms_to_ticks(ms))
            .unwrap_or_else(|e| contract_violation("sleep", e));
    }

    /// 让出处理器，回到就绪队列尾部
    pub fn yield_now() {
        Self::sleep(0);
    }
}
