use crate::compat::{Arc, Vec};
use crate::config::MAX_TASKS;
use crate::error::{Result, SchedError};
use crate::kernel::scheduler::Scheduler;
use crate::kernel::time::systick::Systick;
use crate::utils::contract_violation;
use core::fmt::{self, Debug};

use spin::{Once, RwLock};

// 子模块
pub(crate) mod pool;
pub mod registry;

pub use registry::{copy_tcb, find_dead, load};

static TASK_LIST: Once<RwLock<[TaskControlBlock; MAX_TASKS]>> = Once::new();

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TaskState {
    Ready,
    Running,
    Sleeping,
    Dead,
}

/// 任务入口
///
/// 任务体是无参数的可调用对象，每次被调度时从头执行一遍并尽快返回。
/// 需要跨调用保存的状态放在 TCB 的 `run_count` / `local_time` 中，
/// 或者由闭包自己捕获（原子量等）。
pub trait TaskFunction: Send + Sync + 'static {
    fn call(&self);
}

// 为闭包和函数实现TaskFunction
impl<F> TaskFunction for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn call(&self) {
        (self)();
    }
}

pub type TaskEntry = Arc<dyn TaskFunction>;

/// 任务控制块
#[derive(Clone)]
pub struct TaskControlBlock {
    pub(crate) name: &'static str,
    pub(crate) entry: Option<TaskEntry>,
    pub(crate) taskid: usize,
    pub(crate) run_count: u32,
    pub(crate) sleep_until: u64,
    pub(crate) local_time: u64,
    pub(crate) state: TaskState,
}

impl TaskControlBlock {
    fn empty(taskid: usize) -> Self {
        Self {
            name: "",
            entry: None,
            taskid,
            run_count: 0,
            sleep_until: 0,
            local_time: 0,
            state: TaskState::Dead,
        }
    }

    /// 构造一个刚装载的 TCB（尚未放入任何池）
    pub(crate) fn loaded(taskid: usize, name: &'static str, entry: TaskEntry) -> Self {
        Self {
            name,
            entry: Some(entry),
            taskid,
            run_count: 0,
            sleep_until: 0,
            local_time: 0,
            state: TaskState::Ready,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn id(&self) -> usize {
        self.taskid
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    pub fn sleep_until(&self) -> u64 {
        self.sleep_until
    }

    pub fn local_time(&self) -> u64 {
        self.local_time
    }

    pub fn has_entry(&self) -> bool {
        self.entry.is_some()
    }
}

impl Debug for TaskControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskControlBlock")
            .field("name", &self.name)
            .field("taskid", &self.taskid)
            .field("run_count", &self.run_count)
            .field("sleep_until", &self.sleep_until)
            .field("local_time", &self.local_time)
            .field("state", &self.state)
            .field("has_entry", &self.entry.is_some())
            .finish()
    }
}

// 入口按指针比较
impl PartialEq for TaskControlBlock {
    fn eq(&self, other: &Self) -> bool {
        let same_entry = match (&self.entry, &other.entry) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_entry
            && self.name == other.name
            && self.taskid == other.taskid
            && self.run_count == other.run_count
            && self.sleep_until == other.sleep_until
            && self.local_time == other.local_time
            && self.state == other.state
    }
}

/// 任务句柄，内部是 TCB 槽位下标
///
/// 只能由 [`load`] 等内核接口创建，下标总在 `0..MAX_TASKS` 之内。
#[derive(Clone, PartialEq, Eq, Copy, Debug)]
pub struct Task(pub(crate) usize);

pub(crate) fn get_task_list() -> &'static RwLock<[TaskControlBlock; MAX_TASKS]> {
    TASK_LIST.call_once(|| RwLock::new(core::array::from_fn(TaskControlBlock::empty)))
}

impl Task {
    /// 装载任务，等价于 [`registry::load`]
    pub fn new<F>(name: &'static str, func: F) -> Result<Self>
    where
        F: TaskFunction,
    {
        load(func, name)
    }

    pub fn get_state(&self) -> TaskState {
        get_task_list().read()[self.0].state
    }

    pub fn get_name(&self) -> &'static str {
        get_task_list().read()[self.0].name
    }

    pub fn get_taskid(&self) -> usize {
        get_task_list().read()[self.0].taskid
    }

    /// 已完成的调度次数（首次被调度时为 0）
    pub fn run_count(&self) -> u32 {
        get_task_list().read()[self.0].run_count
    }

    pub fn sleep_until(&self) -> u64 {
        get_task_list().read()[self.0].sleep_until
    }

    /// 该任务上一次完成调度时的 tick
    pub fn local_time(&self) -> u64 {
        get_task_list().read()[self.0].local_time
    }

    /// 距离该任务上一次运行经过的 tick 数
    pub fn elapsed(&self) -> u64 {
        Systick::get_current_time().saturating_sub(self.local_time())
    }

    /// 复制一份当前 TCB 内容
    pub fn snapshot(&self) -> TaskControlBlock {
        get_task_list().read()[self.0].clone()
    }

    /// 在运行中的任务体内调用：结束自己
    ///
    /// 任务返回后 TCB 回到死亡池，名字和入口保留，
    /// 之后可以通过 [`find_dead`] 找到并通过 [`load`] / [`Task::restart`] 复用。
    ///
    /// # Panics
    ///
    /// 不在运行中的任务体内调用，或同一次调用中已经请求过睡眠/退出时 panic。
    pub fn self_quit() {
        Scheduler::quit_current().unwrap_or_else(|e| contract_violation("self_quit", e));
    }

    /// 重新启动一个已死亡的任务，沿用它保留的名字和入口
    pub fn restart(self) -> Result<Self> {
        registry::restart(self)
    }

    /// 按名字查找存活任务
    pub fn find(name: &str) -> Result<Self> {
        Self::live_tasks()
            .find(|t| t.get_name() == name)
            .ok_or(SchedError::TaskNotFound)
    }

    pub(crate) fn init() {
        let mut task_list = get_task_list().write();
        for (i, tcb) in task_list.iter_mut().enumerate() {
            *tcb = TaskControlBlock::empty(i);
        }
    }

    /// 返回参与调度的全部槽位（`0..capacity`）的迭代器
    pub fn iter() -> TaskIter {
        TaskIter::new(Scheduler::capacity())
    }

    /// 返回所有未死亡任务的迭代器
    pub fn live_tasks() -> impl Iterator<Item = Task> {
        Self::iter().filter(|t| t.get_state() != TaskState::Dead)
    }

    /// 所有槽位的快照，按 ID 排序
    pub fn snapshot_all() -> Vec<TaskControlBlock> {
        let capacity = Scheduler::capacity();
        get_task_list().read()[..capacity].to_vec()
    }
}

/// 任务迭代器
pub struct TaskIter {
    current: usize,
    end: usize,
}

impl TaskIter {
    fn new(end: usize) -> Self {
        Self { current: 0, end }
    }
}

impl Iterator for TaskIter {
    type Item = Task;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current < self.end {
            let task = Task(self.current);
            self.current += 1;
            Some(task)
        } else {
            None
        }
    }
}
