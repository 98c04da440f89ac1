use crate::compat::Vec;
use crate::config::MAX_TASKS;
use crate::error::{Result, SchedError};
use crate::hal::TickSource;
use crate::kernel::task::pool::TaskQueue;
use crate::kernel::task::{get_task_list, Task, TaskState};
use crate::kernel::time::systick::Systick;
use crate::{debug, trace};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use spin::{Mutex, Once};

/// 调度器内部状态
///
/// 三个池加上唯一的运行槽位把 `0..capacity` 的全部 TCB 划分为互不相交的集合：
/// - `dead_pool`: 未使用或已退出的槽位
/// - `ready_queue`: 等待调度的任务，轮转顺序
/// - `sleep_set`: 睡眠中的任务，按进入睡眠的顺序
/// - `current`: 正在执行任务体的任务
pub(crate) struct SchedulerInner {
    pub(crate) dead_pool: TaskQueue,
    pub(crate) ready_queue: TaskQueue,
    pub(crate) sleep_set: TaskQueue,
    pub(crate) current: Option<usize>,
    pub(crate) capacity: usize,
}

impl SchedulerInner {
    const fn new() -> Self {
        Self {
            dead_pool: TaskQueue::new(),
            ready_queue: TaskQueue::new(),
            sleep_set: TaskQueue::new(),
            current: None,
            capacity: MAX_TASKS,
        }
    }

    /// 唤醒所有到期的睡眠任务
    ///
    /// 同时到期的任务按进入睡眠集合的顺序进入就绪队列尾部。
    fn wake_expired(&mut self, now: u64) {
        let mut task_list = get_task_list().write();
        for _ in 0..self.sleep_set.len() {
            let Some(id) = self.sleep_set.pop() else {
                break;
            };
            let tcb = &mut task_list[id];
            if now >= tcb.sleep_until {
                tcb.state = TaskState::Ready;
                self.ready_queue.push(id);
                debug!("task {} woke at tick {}", tcb.name, now);
            } else {
                self.sleep_set.push(id);
            }
        }
    }

    /// 任务体返回后，根据它在本次调用中留下的状态放回对应的池
    fn reclassify(&mut self, id: usize, now: u64) {
        let mut task_list = get_task_list().write();
        let tcb = &mut task_list[id];
        tcb.run_count = tcb.run_count.wrapping_add(1);
        tcb.local_time = now;
        if tcb.state == TaskState::Running {
            tcb.state = TaskState::Ready;
        }
        match tcb.state {
            TaskState::Ready | TaskState::Running => {
                self.ready_queue.push(id);
            }
            TaskState::Sleeping => {
                self.sleep_set.push(id);
            }
            TaskState::Dead => {
                self.dead_pool.push(id);
                debug!("task {} quit at tick {}", tcb.name, now);
            }
        }
    }
}

/// 全局调度器状态
static SCHEDULER_INNER: Once<Mutex<SchedulerInner>> = Once::new();
static SCHEDULER_RUNNING: AtomicBool = AtomicBool::new(false);

/// 当前容量（原子变量，用于快速访问）
static CAPACITY: AtomicUsize = AtomicUsize::new(MAX_TASKS);

fn get_scheduler_inner() -> &'static Mutex<SchedulerInner> {
    SCHEDULER_INNER.call_once(|| Mutex::new(SchedulerInner::new()))
}

pub struct Scheduler;

impl Scheduler {
    pub(crate) fn init(capacity: usize) {
        {
            let mut inner = get_scheduler_inner().lock();
            *inner = SchedulerInner::new();
            inner.capacity = capacity;
            for id in 0..capacity {
                inner.dead_pool.push(id);
            }
        }
        CAPACITY.store(capacity, Ordering::Release);
        SCHEDULER_RUNNING.store(false, Ordering::Release);
    }

    pub(crate) fn with_inner<R>(f: impl FnOnce(&mut SchedulerInner) -> R) -> R {
        f(&mut get_scheduler_inner().lock())
    }

    /// 参与调度的槽位数
    pub fn capacity() -> usize {
        CAPACITY.load(Ordering::Acquire)
    }

    /// 开始分派任务
    ///
    /// 未启动时 tick 仍会推进时间并唤醒睡眠任务，但不会调用任务体。
    pub fn start() {
        SCHEDULER_RUNNING.store(true, Ordering::Release);
    }

    /// 停止分派任务
    pub fn stop() {
        SCHEDULER_RUNNING.store(false, Ordering::Release);
    }

    /// 检查调度器是否正在运行
    pub fn is_running() -> bool {
        SCHEDULER_RUNNING.load(Ordering::Acquire)
    }

    /// 时钟 tick 处理
    ///
    /// 1. tick 计数加一
    /// 2. 唤醒 `now >= sleep_until` 的睡眠任务（FIFO）
    /// 3. 取出就绪队列头部的任务，标记为运行并调用任务体（不持有任何锁）
    /// 4. 任务体返回后按其状态放回就绪队列尾部、睡眠集合或死亡池
    ///
    /// 如果在任务体内部调用（有任务正在运行），不做抢占：
    /// 这个 tick 交还给时钟源作为挂起 tick，等任务返回后由 [`Scheduler::schedule_sync`] 处理。
    ///
    /// # 返回值
    /// 本次被调度的任务，没有分派时返回 `None`
    pub fn tick() -> Option<Task> {
        let mut inner = get_scheduler_inner().lock();
        if let Some(running) = inner.current {
            drop(inner);
            crate::warn!("tick while task {} is running, deferred", running);
            Systick::signal_tick();
            return None;
        }

        let now = Systick::systick_inc();
        inner.wake_expired(now);

        if !Self::is_running() {
            return None;
        }
        let id = inner.ready_queue.pop()?;
        let entry = {
            let mut task_list = get_task_list().write();
            let tcb = &mut task_list[id];
            tcb.state = TaskState::Running;
            trace!("tick {}: dispatch {}", now, tcb.name);
            tcb.entry.clone()
        };
        inner.current = Some(id);
        drop(inner);

        if let Some(entry) = entry {
            entry.call();
        }

        let mut inner = get_scheduler_inner().lock();
        inner.current = None;
        inner.reclassify(id, now);
        Some(Task(id))
    }

    /// 处理一个挂起的 tick（中断模式）
    ///
    /// 中断只调用 [`Systick::signal_tick`] 记录挂起 tick，
    /// 主循环反复调用本函数直到返回 `false`。
    pub fn schedule_sync() -> bool {
        if !Systick::take_pending() {
            return false;
        }
        Self::tick();
        true
    }

    /// 固件主循环：启动时钟源，等待并处理 tick，永不返回
    pub fn run<S: TickSource>(source: &mut S) -> ! {
        source.start(Systick::tick_period_ms());
        Self::start();
        loop {
            source.wait_for_tick();
            while Self::schedule_sync() {}
        }
    }

    /// 获取当前正在运行的任务
    pub fn get_current_task() -> Option<Task> {
        get_scheduler_inner().lock().current.map(Task)
    }

    /// 当前任务请求睡眠 `ticks` 个 tick，0 表示让出到就绪队列尾部
    pub(crate) fn sleep_current(ticks: u64) -> Result<()> {
        let inner = get_scheduler_inner().lock();
        let id = inner.current.ok_or(SchedError::InvalidTransition)?;
        let mut task_list = get_task_list().write();
        let tcb = &mut task_list[id];
        if tcb.state != TaskState::Running {
            return Err(SchedError::InvalidTransition);
        }
        if ticks == 0 {
            tcb.state = TaskState::Ready;
        } else {
            tcb.sleep_until = Systick::get_current_time() + ticks;
            tcb.state = TaskState::Sleeping;
            debug!("task {} sleeps until tick {}", tcb.name, tcb.sleep_until);
        }
        Ok(())
    }

    /// 当前任务请求退出
    pub(crate) fn quit_current() -> Result<()> {
        let inner = get_scheduler_inner().lock();
        let id = inner.current.ok_or(SchedError::InvalidTransition)?;
        let mut task_list = get_task_list().write();
        let tcb = &mut task_list[id];
        if tcb.state != TaskState::Running {
            return Err(SchedError::InvalidTransition);
        }
        tcb.state = TaskState::Dead;
        Ok(())
    }

    /// 就绪队列，按调度顺序
    pub fn ready_tasks() -> Vec<Task> {
        get_scheduler_inner().lock().ready_queue.iter().map(Task).collect()
    }

    /// 睡眠集合，按进入睡眠的顺序
    pub fn sleeping_tasks() -> Vec<Task> {
        get_scheduler_inner().lock().sleep_set.iter().map(Task).collect()
    }

    /// 死亡池，按回收顺序
    pub fn dead_tasks() -> Vec<Task> {
        get_scheduler_inner().lock().dead_pool.iter().map(Task).collect()
    }

    /// 各池的任务数量
    pub fn stats() -> PoolStats {
        let inner = get_scheduler_inner().lock();
        PoolStats {
            dead: inner.dead_pool.len(),
            ready: inner.ready_queue.len(),
            sleeping: inner.sleep_set.len(),
            running: inner.current.is_some(),
        }
    }

    /// 检查池划分不变式
    ///
    /// `0..capacity` 的每个 TCB 恰好属于一个池（或是唯一的运行任务），
    /// 且池与 TCB 状态一致。只应在任务体之外调用。
    pub fn check_invariants() -> bool {
        let inner = get_scheduler_inner().lock();
        let task_list = get_task_list().read();
        let mut seen = [0usize; MAX_TASKS];

        let pools = [
            (&inner.dead_pool, TaskState::Dead),
            (&inner.ready_queue, TaskState::Ready),
            (&inner.sleep_set, TaskState::Sleeping),
        ];
        for (pool, state) in pools {
            for id in pool.iter() {
                if id >= inner.capacity || task_list[id].state != state {
                    return false;
                }
                seen[id] += 1;
            }
        }
        if let Some(id) = inner.current {
            if id >= inner.capacity {
                return false;
            }
            seen[id] += 1;
        }
        seen[..inner.capacity].iter().all(|&n| n == 1)
    }
}

/// 池统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub dead: usize,
    pub ready: usize,
    pub sleeping: usize,
    pub running: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::{Arc, Vec};
    use crate::config::KernelConfig;
    use crate::kernel::task::{find_dead, load};
    use crate::kernel::time::delay::Delay;
    use crate::utils::{kernel_init, kernel_init_with};
    use serial_test::serial;
    use spin::Mutex as SpinMutex;

    fn noop() {}

    fn dispatch_names(ticks: usize) -> Vec<&'static str> {
        (0..ticks)
            .filter_map(|_| Scheduler::tick())
            .map(|t| t.get_name())
            .collect()
    }

    #[test]
    #[serial]
    fn test_not_started_does_not_dispatch() {
        kernel_init();
        let task = load(noop, "idle").unwrap();
        assert_eq!(Scheduler::tick(), None);
        assert_eq!(Systick::get_current_time(), 1);
        assert_eq!(task.run_count(), 0);
        Scheduler::start();
        assert_eq!(Scheduler::tick(), Some(task));
        Scheduler::stop();
        assert!(!Scheduler::is_running());
        assert_eq!(Scheduler::tick(), None);
    }

    #[test]
    #[serial]
    fn test_empty_ready_queue_idles() {
        kernel_init();
        Scheduler::start();
        assert_eq!(Scheduler::tick(), None);
        assert_eq!(Scheduler::tick(), None);
        assert_eq!(Systick::get_current_time(), 2);
        assert!(Scheduler::check_invariants());
    }

    #[test]
    #[serial]
    fn test_round_robin_order() {
        kernel_init();
        load(noop, "a").unwrap();
        load(noop, "b").unwrap();
        load(noop, "c").unwrap();
        Scheduler::start();
        assert_eq!(dispatch_names(7), ["a", "b", "c", "a", "b", "c", "a"]);
        assert!(Scheduler::check_invariants());
    }

    #[test]
    #[serial]
    fn test_running_state_visible_inside_body() {
        kernel_init();
        let seen = Arc::new(SpinMutex::new(None));
        let seen_in_task = seen.clone();
        let task = load(
            move || {
                let current = Scheduler::get_current_task().unwrap();
                *seen_in_task.lock() = Some((current.get_state(), current.run_count()));
            },
            "observer",
        )
        .unwrap();
        Scheduler::start();
        Scheduler::tick();
        assert_eq!(*seen.lock(), Some((TaskState::Running, 0)));
        assert_eq!(task.get_state(), TaskState::Ready);
        assert_eq!(task.run_count(), 1);
        assert_eq!(Scheduler::get_current_task(), None);
    }

    #[test]
    #[serial]
    fn test_sleep_zero_yields_to_tail() {
        kernel_init();
        load(Delay::yield_now, "yielder").unwrap();
        load(noop, "other").unwrap();
        Scheduler::start();
        assert_eq!(dispatch_names(4), ["yielder", "other", "yielder", "other"]);
        assert_eq!(Scheduler::stats().sleeping, 0);
        assert!(Scheduler::check_invariants());
    }

    #[test]
    #[serial]
    fn test_simultaneous_wake_is_fifo() {
        kernel_init();
        // 两个任务在同一个 tick 到期，先入睡的先进入就绪队列
        let b = load(|| Delay::sleep(3), "b").unwrap();
        let a = load(|| Delay::sleep(2), "a").unwrap();
        Scheduler::start();
        assert_eq!(Scheduler::tick(), Some(b)); // tick 1, b 睡到 4
        assert_eq!(Scheduler::tick(), Some(a)); // tick 2, a 睡到 4
        assert_eq!(Scheduler::sleeping_tasks(), [b, a]);
        assert_eq!(Scheduler::tick(), None); // tick 3
        assert_eq!(Scheduler::tick(), Some(b)); // tick 4, 两者都醒来
        assert_eq!(Scheduler::ready_tasks(), [a]);
        assert!(Scheduler::check_invariants());
    }

    #[test]
    #[serial]
    fn test_tick_inside_body_is_deferred() {
        kernel_init();
        load(
            || {
                Scheduler::tick();
            },
            "nested",
        )
        .unwrap();
        Scheduler::start();
        Scheduler::tick();
        assert_eq!(Systick::get_current_time(), 1);
        assert_eq!(Systick::pending_ticks(), 1);
        // 挂起的 tick 在任务返回后处理
        assert!(Scheduler::schedule_sync());
        assert_eq!(Systick::get_current_time(), 2);
    }

    #[test]
    #[serial]
    fn test_schedule_sync_drains_pending_ticks() {
        kernel_init();
        let task = load(noop, "sync").unwrap();
        Scheduler::start();
        assert!(!Scheduler::schedule_sync());
        Systick::signal_tick();
        Systick::signal_tick();
        Systick::signal_tick();
        let mut processed = 0;
        while Scheduler::schedule_sync() {
            processed += 1;
        }
        assert_eq!(processed, 3);
        assert_eq!(Systick::get_current_time(), 3);
        assert_eq!(task.run_count(), 3);
    }

    #[test]
    #[serial]
    #[should_panic]
    fn test_double_request_panics() {
        kernel_init();
        load(
            || {
                Delay::sleep(10);
                Task::self_quit();
            },
            "greedy",
        )
        .unwrap();
        Scheduler::start();
        Scheduler::tick();
    }

    #[test]
    #[serial]
    fn test_fairness() {
        kernel_init();
        let names = ["t0", "t1", "t2", "t3", "t4"];
        for name in names {
            load(noop, name).unwrap();
        }
        Scheduler::start();
        let n = 23;
        for _ in 0..n {
            Scheduler::tick();
        }
        for task in Task::live_tasks() {
            assert!(task.run_count() as usize >= n / names.len());
        }
    }

    // 容量 2，A 和 B 轮转；A 在第 3 次被调度（tick 100）时睡眠 50
    #[test]
    #[serial]
    fn test_two_task_scenario() {
        kernel_init_with(KernelConfig::default().with_capacity(2)).unwrap();
        let log = Arc::new(SpinMutex::new(Vec::new()));

        let log_a = log.clone();
        let a = load(
            move || {
                let me = Scheduler::get_current_task().unwrap();
                log_a.lock().push("A");
                if me.run_count() == 2 {
                    Delay::sleep(50);
                }
            },
            "A",
        )
        .unwrap();
        let log_b = log.clone();
        let b = load(move || log_b.lock().push("B"), "B").unwrap();

        Scheduler::start();
        for _ in 0..4 {
            Scheduler::tick();
        }
        assert_eq!(*log.lock(), ["A", "B", "A", "B"]);

        // 让 A 的第 3 次调度落在 tick 100
        Systick::add_current_time(95);
        assert_eq!(Scheduler::tick(), Some(a));
        assert_eq!(Systick::get_current_time(), 100);
        assert_eq!(a.get_state(), TaskState::Sleeping);
        assert_eq!(a.sleep_until(), 150);

        while Systick::get_current_time() < 149 {
            assert_eq!(Scheduler::tick(), Some(b));
        }
        assert_eq!(Scheduler::sleeping_tasks(), [a]);

        // tick 150: A 醒来排在 B 之后
        assert_eq!(Scheduler::tick(), Some(b));
        assert_eq!(Systick::get_current_time(), 150);
        assert_eq!(Scheduler::tick(), Some(a));
        assert!(Scheduler::check_invariants());
    }

    #[test]
    #[serial]
    fn test_quit_and_reload_reuses_slot() {
        kernel_init();
        let quitter = load(Task::self_quit, "once").unwrap();
        let other = load(noop, "other").unwrap();
        Scheduler::start();
        assert_eq!(Scheduler::tick(), Some(quitter));
        assert_eq!(quitter.get_state(), TaskState::Dead);
        assert_eq!(Scheduler::dead_tasks().last(), Some(&quitter));
        assert_eq!(find_dead("once"), Some(quitter));

        let reloaded = load(noop, "once").unwrap();
        assert_eq!(reloaded, quitter);
        assert_eq!(reloaded.run_count(), 0);
        assert_eq!(Scheduler::ready_tasks(), [other, reloaded]);
        assert!(Scheduler::check_invariants());
    }
}
