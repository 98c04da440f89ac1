use super::TickSource;
use crate::config::{SYST_MAX_RELOAD, systick_reload};
use crate::kernel::time::systick::Systick;
use cortex_m::peripheral::SYST;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m_rt::{ExceptionFrame, exception};

/// SysTick 时钟源
pub struct SysTickSource {
    syst: SYST,
}

impl SysTickSource {
    pub fn new(syst: SYST) -> Self {
        Self { syst }
    }
}

impl TickSource for SysTickSource {
    fn start(&mut self, period_ms: u32) {
        // kernel_init_with 已经校验过周期，这里只兜底
        let reload = systick_reload(period_ms).unwrap_or_else(|| {
            crate::warn!("tick period {} ms out of SysTick range, clamped", period_ms);
            SYST_MAX_RELOAD
        });
        self.syst.set_clock_source(SystClkSource::Core);
        self.syst.set_reload(reload);
        self.syst.clear_current();
        self.syst.enable_counter();
        self.syst.enable_interrupt();
        crate::info!("SysTick started, reload {}", reload);
    }

    fn wait_for_tick(&mut self) {
        cortex_m::asm::wfi();
    }
}

#[exception]
fn SysTick() {
    Systick::signal_tick();
}

#[exception]
unsafe fn HardFault(_ef: &ExceptionFrame) -> ! {
    loop {}
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    crate::error!("{}", info);
    loop {
        cortex_m::asm::bkpt();
    }
}
