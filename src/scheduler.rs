//! Virtual-clock task scheduler
//!
//! Stands in for `setTimeout`. Deferred work is queued as a [`Task`] with a
//! due time; owners keep the returned [`TaskId`] and cancel it on teardown so
//! nothing fires against a component that is gone. Time only moves when the
//! application context advances the clock.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::trace;

use crate::dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Deferred work understood by the application context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Move focus to a node if it is still attached
    Focus(NodeId),
    /// Remove a node (announcers, expired toasts)
    RemoveNode(NodeId),
    /// Start a toast's exit animation, then remove it
    ExpireNotification(NodeId),
    /// Reload the page after a successful delete
    Reload,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<TaskId, (Duration, Task)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let due = self.now + delay;
        trace!(task_id = id.0, due_ms = due.as_millis() as u64, ?task, "scheduled task");
        self.pending.insert(id, (due, task));
        id
    }

    /// Returns false if the task already ran or was cancelled
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let cancelled = self.pending.remove(&id).is_some();
        if cancelled {
            trace!(task_id = id.0, "cancelled task");
        }
        cancelled
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pop the earliest task due at or before `until`, moving the clock to its
    /// due time. Ties run in scheduling order. Returns `None` once nothing is
    /// due, leaving the clock at `until`.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskId, Task)> {
        let next = self
            .pending
            .iter()
            .filter(|(_, (due, _))| *due <= until)
            .min_by_key(|(id, (due, _))| (*due, **id))
            .map(|(id, (due, task))| (*id, *due, *task));

        match next {
            Some((id, due, task)) => {
                self.pending.remove(&id);
                self.now = self.now.max(due);
                Some((id, task))
            }
            None => {
                self.now = self.now.max(until);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_tasks_run_in_due_order() {
        let mut scheduler = Scheduler::new();
        let late = scheduler.schedule(ms(300), Task::Reload);
        let body = Document::new().body();
        let early = scheduler.schedule(ms(100), Task::Focus(body));

        assert_eq!(scheduler.pop_due(ms(1000)), Some((early, Task::Focus(body))));
        assert_eq!(scheduler.now(), ms(100));
        assert_eq!(scheduler.pop_due(ms(1000)), Some((late, Task::Reload)));
        assert_eq!(scheduler.pop_due(ms(1000)), None);
        assert_eq!(scheduler.now(), ms(1000));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(ms(50), Task::Reload);
        assert!(scheduler.is_pending(id));
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert_eq!(scheduler.pop_due(ms(100)), None);
    }

    #[test]
    fn test_not_due_yet() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(500), Task::Reload);
        assert_eq!(scheduler.pop_due(ms(499)), None);
        assert_eq!(scheduler.pending_count(), 1);
        assert!(scheduler.pop_due(ms(500)).is_some());
    }

    #[test]
    fn test_ties_run_in_schedule_order() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule(ms(10), Task::Reload);
        let second = scheduler.schedule(ms(10), Task::Reload);
        assert_eq!(scheduler.pop_due(ms(10)).map(|(id, _)| id), Some(first));
        assert_eq!(scheduler.pop_due(ms(10)).map(|(id, _)| id), Some(second));
    }
}
