//=========================================================================
// Task Queue
//=========================================================================
//
// Cancellable deferred tasks driven by the frame tick.
//
// Architecture:
//   owner → schedule(delay, task) → TaskHandle
//   owner → advance(dt) → due tasks (FIFO by deadline, then insertion)
//   owner → cancel(handle) / cancel_all() on reset
//
// The queue is owned by the mechanic or effect that schedules into it,
// so dropping or resetting the owner drops every pending callback with it.
// No closure is stored; tasks are plain values the owner interprets.
//
//=========================================================================

//=== TaskHandle ==========================================================

/// Handle returned by [`TaskQueue::schedule`], used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

//=== TaskQueue ===========================================================

struct Pending<T> {
    handle: TaskHandle,
    remaining: f32,
    task: T,
}

/// Deferred task list advanced by elapsed seconds.
pub struct TaskQueue<T> {
    pending: Vec<Pending<T>>,
    next_handle: u64,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_handle: 0,
        }
    }

    /// Schedules `task` to become due after `delay` seconds.
    ///
    /// A non-positive delay makes the task due on the next `advance`.
    pub fn schedule(&mut self, delay: f32, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(Pending {
            handle,
            remaining: delay.max(0.0),
            task,
        });
        handle
    }

    /// Cancels a pending task. Returns `false` if it already ran or was
    /// cancelled before.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.handle != handle);
        before != self.pending.len()
    }

    /// Cancels every pending task.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|p| p.handle == handle)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Advances time and returns the tasks that became due, ordered by
    /// remaining time (earliest first), ties in scheduling order.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        for pending in &mut self.pending {
            pending.remaining -= dt;
        }

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].remaining <= 0.0 {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }

        // Stable sort keeps insertion order for equal deadlines
        due.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));
        due.into_iter().map(|p| p.task).collect()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Open,
        Close,
    }

    #[test]
    fn task_fires_after_delay() {
        let mut queue = TaskQueue::new();
        queue.schedule(0.5, Step::Open);

        assert!(queue.advance(0.25).is_empty());
        assert_eq!(queue.advance(0.25), vec![Step::Open]);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut queue = TaskQueue::new();
        let handle = queue.schedule(0.1, Step::Close);

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle), "Second cancel should report nothing removed");
        assert!(queue.advance(1.0).is_empty());
    }

    #[test]
    fn cancel_all_clears_pending() {
        let mut queue = TaskQueue::new();
        queue.schedule(0.1, Step::Open);
        queue.schedule(0.2, Step::Close);

        queue.cancel_all();
        assert!(queue.advance(1.0).is_empty());
    }

    #[test]
    fn due_tasks_are_ordered_by_deadline() {
        let mut queue = TaskQueue::new();
        queue.schedule(0.3, Step::Close);
        queue.schedule(0.1, Step::Open);

        assert_eq!(queue.advance(1.0), vec![Step::Open, Step::Close]);
    }

    #[test]
    fn zero_delay_is_due_next_advance() {
        let mut queue = TaskQueue::new();
        let handle = queue.schedule(0.0, Step::Open);
        assert!(queue.is_pending(handle));
        assert_eq!(queue.advance(0.0), vec![Step::Open]);
    }
}
