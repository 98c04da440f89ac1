use crate::config::KernelConfig;
use crate::error::{Result, SchedError};
use crate::kernel::scheduler::Scheduler;
use crate::kernel::task::Task;
use crate::kernel::time::systick::Systick;

/// 内核初始化（固件中的 DDSSetup）
///
/// 使用默认配置初始化所有内核子系统：
/// - 内存分配器
/// - TCB 存储（全部槽位进入死亡池）
/// - 调度器
/// - 系统时钟
///
/// # 注意
///
/// 此函数会完全重置所有全局状态，适合在测试开始时调用。
pub fn kernel_init() {
    // 默认配置总是合法的
    let _ = kernel_init_with(KernelConfig::default());
}

/// 使用指定配置初始化内核
pub fn kernel_init_with(config: KernelConfig) -> Result<()> {
    config.validate()?;
    crate::mem::allocator::init_heap();
    Task::init();
    Scheduler::init(config.capacity);
    Systick::init(config.tick_period_ms);
    crate::info!(
        "kernel init: {} task slots, {} ms tick",
        config.capacity,
        config.tick_period_ms
    );
    Ok(())
}

const CONTRACT_RULE: &str = "outside a running task or after a prior sleep/quit request";

/// 任务体违反调用约定
///
/// 在运行中的任务体之外睡眠/退出，或者同一次调用中重复请求。
/// 池划分不变式会因此被破坏，只能停机。
pub(crate) fn contract_violation(op: &str, err: SchedError) -> ! {
    crate::error!("{} called {}: {}", op, CONTRACT_RULE, err);
    panic!("{} called {}: {}", op, CONTRACT_RULE, err);
}
