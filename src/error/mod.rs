mod types;

pub use types::{Result, SchedError};
