use crate::types::Task;
use std::collections::VecDeque;

/// FIFO queue of tasks owned by a single reasoning engine.
///
/// Decomposition appends at the back, execution pops from the front.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
        }
    }

    /// Append a task.
    pub fn push(&mut self, task: Task) {
        self.tasks.push_back(task);
    }

    /// Remove and return the front task, or `None` when empty.
    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    /// The task `pop` would return next.
    pub fn peek(&self) -> Option<&Task> {
        self.tasks.front()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Queued tasks, front first.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }
}

impl Extend<Task> for TaskQueue {
    fn extend<I: IntoIterator<Item = Task>>(&mut self, iter: I) {
        self.tasks.extend(iter);
    }
}
