#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    // 装载相关
    CapacityExceeded,
    DuplicateName,
    InvalidName,

    // 状态机相关
    InvalidTransition,
    TaskNotFound,

    // 配置相关
    InvalidConfig,
}

impl core::fmt::Display for SchedError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SchedError::CapacityExceeded => write!(f, "No dead task slot available"),
            SchedError::DuplicateName => write!(f, "Task name already bound to a live task"),
            SchedError::InvalidName => write!(f, "Task name is empty or too long"),
            SchedError::InvalidTransition => write!(f, "Invalid task state transition"),
            SchedError::TaskNotFound => write!(f, "Task not found"),
            SchedError::InvalidConfig => write!(f, "Invalid kernel configuration"),
        }
    }
}

pub type Result<T> = core::result::Result<T, SchedError>;
