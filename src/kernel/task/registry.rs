//! 任务装载
//!
//! 把入口函数和名字绑定到一个从死亡池中取出的 TCB 上，并放入就绪队列尾部。
//! 死亡的任务保留名字和入口，同名再次装载时优先复用原来的槽位。

use super::{get_task_list, Task, TaskControlBlock, TaskEntry, TaskFunction, TaskState};
use crate::compat::Arc;
use crate::config::MAX_TASK_NAME_LEN;
use crate::error::{Result, SchedError};
use crate::kernel::scheduler::{Scheduler, SchedulerInner};
use crate::info;

/// 装载任务
///
/// # 返回值
/// - `Ok(Task)`: 新任务已处于就绪状态，排在就绪队列尾部
/// - `Err(SchedError::InvalidName)`: 名字为空或超过 `MAX_TASK_NAME_LEN`
/// - `Err(SchedError::DuplicateName)`: 已有同名的存活任务
/// - `Err(SchedError::CapacityExceeded)`: 死亡池为空
///
/// 失败时不会修改任何 TCB。
///
/// # 示例
/// ```rust
/// use coop_rtos::kernel::task::{load, TaskState};
/// use coop_rtos::utils::kernel_init;
///
/// kernel_init();
/// let blink = load(|| { /* 翻转 LED */ }, "blink").unwrap();
/// assert_eq!(blink.get_state(), TaskState::Ready);
/// ```
pub fn load<F>(entry: F, name: &'static str) -> Result<Task>
where
    F: TaskFunction,
{
    validate_name(name)?;
    let entry: TaskEntry = Arc::new(entry);
    Scheduler::with_inner(|inner| {
        ensure_unique(inner, name)?;
        let slot = find_dead_in(inner, name)
            .or_else(|| inner.dead_pool.peek())
            .ok_or(SchedError::CapacityExceeded)?;
        install(inner, slot, name, entry);
        Ok(Task(slot))
    })
}

/// 按名字查找死亡池中的 TCB（按死亡池顺序取第一个）
///
/// 只匹配装载过的槽位，从未使用的槽位没有名字。
/// 没有找到返回 `None`，这不是错误。
pub fn find_dead(name: &str) -> Option<Task> {
    Scheduler::with_inner(|inner| find_dead_in(inner, name)).map(Task)
}

/// 把 `src` 的全部字段（包括状态）复制到 `dst`
///
/// 不改变任何池的成员关系，调用者负责把 `dst` 放入正确的池。
pub fn copy_tcb(dst: &mut TaskControlBlock, src: &TaskControlBlock) {
    dst.clone_from(src);
}

/// 用保留的名字和入口重新装载一个死亡任务（固件中的 task_start）
pub(crate) fn restart(task: Task) -> Result<Task> {
    if task.0 >= Scheduler::capacity() {
        return Err(SchedError::TaskNotFound);
    }
    let (name, entry) = {
        let task_list = get_task_list().read();
        let tcb = &task_list[task.0];
        match (&tcb.state, &tcb.entry) {
            (TaskState::Dead, Some(entry)) => (tcb.name, entry.clone()),
            _ => return Err(SchedError::InvalidTransition),
        }
    };
    Scheduler::with_inner(|inner| {
        if !inner.dead_pool.contains(task.0) {
            return Err(SchedError::InvalidTransition);
        }
        ensure_unique(inner, name)?;
        install(inner, task.0, name, entry);
        Ok(task)
    })
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_TASK_NAME_LEN {
        return Err(SchedError::InvalidName);
    }
    Ok(())
}

fn ensure_unique(inner: &SchedulerInner, name: &str) -> Result<()> {
    let task_list = get_task_list().read();
    let taken = task_list[..inner.capacity]
        .iter()
        .any(|tcb| tcb.state != TaskState::Dead && tcb.name == name);
    if taken {
        return Err(SchedError::DuplicateName);
    }
    Ok(())
}

fn find_dead_in(inner: &SchedulerInner, name: &str) -> Option<usize> {
    let task_list = get_task_list().read();
    inner
        .dead_pool
        .iter()
        .find(|&id| task_list[id].entry.is_some() && task_list[id].name == name)
}

// 槽位从死亡池移到就绪队列尾部
fn install(inner: &mut SchedulerInner, slot: usize, name: &'static str, entry: TaskEntry) {
    inner.dead_pool.remove(slot);
    let staged = TaskControlBlock::loaded(slot, name, entry);
    copy_tcb(&mut get_task_list().write()[slot], &staged);
    inner.ready_queue.push(slot);
    info!("task {} loaded into slot {}", name, slot);
}
