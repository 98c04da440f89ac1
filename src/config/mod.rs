use crate::error::{Result, SchedError};

// 任务槽位数量，对应固件中的 NTASKS
pub const MAX_TASKS: usize = 10;
// 任务名最大长度（固件中为 char name[20]，含结尾的 NUL）
pub const MAX_TASK_NAME_LEN: usize = 19;
pub const DEFAULT_TICK_PERIOD_MS: u32 = 1;
pub const HEAP_SIZE: usize = 16 * 1024;

// 内核时钟频率
pub const SYS_CLOCK_HZ: u32 = 12_000_000;
// SysTick 重装载寄存器只有 24 位
pub const SYST_MAX_RELOAD: u32 = 0x00FF_FFFF;

/// 按 `period_ms` 计算 SysTick 重装载值，超出 24 位时返回 None
pub const fn systick_reload(period_ms: u32) -> Option<u32> {
    match (SYS_CLOCK_HZ / 1000).checked_mul(period_ms) {
        Some(cycles) if cycles >= 1 && cycles - 1 <= SYST_MAX_RELOAD => Some(cycles - 1),
        _ => None,
    }
}

/// 内核运行时配置
///
/// `capacity` 决定参与调度的 TCB 槽位数（`0..capacity`），
/// `tick_period_ms` 是时钟源每个 tick 的毫秒数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    pub capacity: usize,
    pub tick_period_ms: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_TASKS,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
        }
    }
}

impl KernelConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_tick_period_ms(mut self, period: u32) -> Self {
        self.tick_period_ms = period;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_TASKS || self.tick_period_ms == 0 {
            return Err(SchedError::InvalidConfig);
        }
        #[cfg(feature = "cortex_m3")]
        if systick_reload(self.tick_period_ms).is_none() {
            return Err(SchedError::InvalidConfig);
        }
        Ok(())
    }
}
