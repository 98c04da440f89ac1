//! 主机/测试环境的时钟源
//!
//! 没有硬件定时器，由调用者手动产生 tick。

use super::TickSource;
use crate::kernel::time::systick::Systick;

/// 手动时钟源
#[derive(Debug, Default)]
pub struct ManualTicks {
    period_ms: Option<u32>,
}

impl ManualTicks {
    pub const fn new() -> Self {
        Self { period_ms: None }
    }

    /// 产生 `n` 个 tick（相当于定时器中断触发 `n` 次）
    pub fn fire(&mut self, n: u32) {
        for _ in 0..n {
            Systick::signal_tick();
        }
    }

    /// 启动时配置的周期，尚未启动时为 None
    pub fn period_ms(&self) -> Option<u32> {
        self.period_ms
    }
}

impl TickSource for ManualTicks {
    fn start(&mut self, period_ms: u32) {
        self.period_ms = Some(period_ms);
    }

    fn wait_for_tick(&mut self) {
        core::hint::spin_loop();
    }
}
