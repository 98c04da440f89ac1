//! TCB 池
//!
//! 死亡池、就绪队列、睡眠集合都是 [`TaskQueue`]：保存任务 ID 的环形缓冲区，
//! 保持插入顺序。任务在池之间移动就是从一个队列弹出再压入另一个队列，
//! 同一个 ID 任何时刻只能出现在一个池中（或者是唯一的运行任务）。

use crate::config::MAX_TASKS;

/// 任务 ID 的 FIFO 队列
///
/// 使用环形缓冲区实现，入队和出队都是 O(1)
#[derive(Debug, Clone)]
pub(crate) struct TaskQueue {
    /// 任务 ID 数组
    tasks: [usize; MAX_TASKS],
    /// 队列头部索引
    head: usize,
    /// 队列尾部索引
    tail: usize,
    /// 队列中的任务数量
    count: usize,
}

impl TaskQueue {
    pub(crate) const fn new() -> Self {
        Self {
            tasks: [0; MAX_TASKS],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// 入队到尾部 - O(1)
    ///
    /// 队列已满时返回 false。所有 ID 都来自 `0..MAX_TASKS` 且互不重复，
    /// 所以正常情况下不会满。
    #[inline]
    pub(crate) fn push(&mut self, task_id: usize) -> bool {
        if self.count >= MAX_TASKS {
            return false;
        }
        self.tasks[self.tail] = task_id;
        self.tail = (self.tail + 1) % MAX_TASKS;
        self.count += 1;
        true
    }

    /// 从头部出队 - O(1)
    #[inline]
    pub(crate) fn pop(&mut self) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let task_id = self.tasks[self.head];
        self.head = (self.head + 1) % MAX_TASKS;
        self.count -= 1;
        Some(task_id)
    }

    /// 查看队首元素 - O(1)
    #[inline]
    pub(crate) fn peek(&self) -> Option<usize> {
        if self.count == 0 {
            None
        } else {
            Some(self.tasks[self.head])
        }
    }

    /// 从队列中移除指定任务，保持其余元素的顺序 - O(n)
    pub(crate) fn remove(&mut self, task_id: usize) -> bool {
        let Some(pos) = self.iter().position(|id| id == task_id) else {
            return false;
        };

        // 将后面的元素前移
        let mut dst = (self.head + pos) % MAX_TASKS;
        let mut src = (dst + 1) % MAX_TASKS;
        for _ in pos..(self.count - 1) {
            self.tasks[dst] = self.tasks[src];
            dst = src;
            src = (src + 1) % MAX_TASKS;
        }
        self.tail = if self.tail == 0 { MAX_TASKS - 1 } else { self.tail - 1 };
        self.count -= 1;
        true
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn contains(&self, task_id: usize) -> bool {
        self.iter().any(|id| id == task_id)
    }

    /// 按队列顺序（从头到尾）遍历
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.count).map(move |i| self.tasks[(self.head + i) % MAX_TASKS])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compat::Vec;

    fn collect(queue: &TaskQueue) -> Vec<usize> {
        queue.iter().collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = TaskQueue::new();
        assert_eq!(queue.len(), 0);
        queue.push(3);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.peek(), Some(3));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_push_when_full() {
        let mut queue = TaskQueue::new();
        for id in 0..MAX_TASKS {
            assert!(queue.push(id));
        }
        assert!(!queue.push(0));
        assert_eq!(queue.len(), MAX_TASKS);
    }

    #[test]
    fn test_remove_keeps_order_across_wrap() {
        let mut queue = TaskQueue::new();
        // 让 head 移动到缓冲区中间，制造回绕
        for id in 0..MAX_TASKS - 2 {
            queue.push(id);
            queue.pop();
        }
        for id in [4, 7, 1, 9] {
            queue.push(id);
        }
        assert!(queue.remove(7));
        assert_eq!(collect(&queue), [4, 1, 9]);
        assert!(!queue.remove(7));
        assert!(queue.remove(9));
        assert_eq!(collect(&queue), [4, 1]);
        queue.push(5);
        assert_eq!(collect(&queue), [4, 1, 5]);
        assert!(queue.contains(5));
        assert!(!queue.contains(9));
    }
}
