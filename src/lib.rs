#![cfg_attr(not(test), no_std)]
#[cfg(test)]
extern crate std;
extern crate alloc;

pub mod config;
pub mod error;
pub mod hal;
pub mod kernel;
pub mod log;
pub mod mem;
pub mod utils;

pub(crate) mod compat;

pub use error::{Result, SchedError};
pub use kernel::scheduler::Scheduler;
pub use kernel::task::{Task, TaskState, copy_tcb, find_dead, load};
pub use kernel::time::delay::Delay;
pub use kernel::time::systick::Systick;
