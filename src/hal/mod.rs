//! 硬件抽象层 (HAL)
//!
//! 调度器只需要一个周期性的时钟源，见 [`TickSource`]。

pub mod traits;
pub mod host;

#[cfg(all(feature = "cortex_m3", not(test), target_arch = "arm"))]
pub mod cortex_m3;

// 重新导出 traits
pub use traits::*;
