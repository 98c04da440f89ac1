//! 系统时钟
//!
//! 单调递增的 tick 计数，以及中断与主循环之间的挂起 tick 计数
//! （固件中 `schedule_sync` 等待的 PENDING/DONE 标志）。
//! 计数器放在临界区里，在没有 64 位原子操作的 MCU 上也能安全访问。

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};
use critical_section::Mutex;

use crate::config::DEFAULT_TICK_PERIOD_MS;

static CURRENT_TIME: Mutex<Cell<u64>> = Mutex::new(Cell::new(0));
static PENDING_TICKS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static TICK_PERIOD_MS: AtomicU32 = AtomicU32::new(DEFAULT_TICK_PERIOD_MS);

pub struct Systick;

impl Systick {
    pub(crate) fn init(period_ms: u32) {
        critical_section::with(|cs| {
            CURRENT_TIME.borrow(cs).set(0);
            PENDING_TICKS.borrow(cs).set(0);
        });
        TICK_PERIOD_MS.store(period_ms, Ordering::Relaxed);
    }

    /// tick 计数加一，返回新的计数
    pub(crate) fn systick_inc() -> u64 {
        critical_section::with(|cs| {
            let time = CURRENT_TIME.borrow(cs);
            let next = time.get() + 1;
            time.set(next);
            next
        })
    }

    pub fn get_current_time() -> u64 {
        critical_section::with(|cs| CURRENT_TIME.borrow(cs).get())
    }

    pub fn tick_period_ms() -> u32 {
        TICK_PERIOD_MS.load(Ordering::Relaxed)
    }

    /// 毫秒换算为 tick 数，向上取整
    pub fn ms_to_ticks(ms: u32) -> u64 {
        let period = Self::tick_period_ms().max(1) as u64;
        (ms as u64).div_ceil(period)
    }

    /// 记录一个挂起的 tick，可以在中断中调用
    pub fn signal_tick() {
        critical_section::with(|cs| {
            let pending = PENDING_TICKS.borrow(cs);
            pending.set(pending.get().saturating_add(1));
        });
    }

    /// 取走一个挂起的 tick
    pub(crate) fn take_pending() -> bool {
        critical_section::with(|cs| {
            let pending = PENDING_TICKS.borrow(cs);
            match pending.get() {
                0 => false,
                n => {
                    pending.set(n - 1);
                    true
                }
            }
        })
    }

    pub fn pending_ticks() -> u32 {
        critical_section::with(|cs| PENDING_TICKS.borrow(cs).get())
    }

    #[cfg(test)]
    pub fn add_current_time(ticks: u64) -> u64 {
        critical_section::with(|cs| {
            let time = CURRENT_TIME.borrow(cs);
            time.set(time.get() + ticks);
            time.get()
        })
    }
}
