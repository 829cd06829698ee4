// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Explicit repeating-task handles.
//!
//! Components that need a timer ask a [`Scheduler`] for a [`TaskHandle`] and
//! cancel it themselves; there are no ambient intervals. The host runs its
//! event loop, asks [`ManualScheduler::due`] which tasks fire, and forwards
//! each handle to [`Session::on_task`](crate::session::Session::on_task).

use std::collections::BTreeMap;

/// Identifies one scheduled repeating task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Start/cancel lifecycle for repeating tasks.
pub trait Scheduler {
    /// Start a task firing every `period_ms`, first at `now_ms + period_ms`.
    fn start_repeating(&mut self, label: &'static str, period_ms: u64, now_ms: u64) -> TaskHandle;

    /// Stop a task. Cancelling an unknown or finished task is a no-op.
    fn cancel(&mut self, handle: TaskHandle);

    fn is_active(&self, handle: TaskHandle) -> bool;
}

#[derive(Debug, Clone)]
struct Task {
    label: &'static str,
    period_ms: u64,
    next_due: u64,
}

/// Scheduler driven by the host's own clock.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    tasks: BTreeMap<TaskHandle, Task>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Handles due at `now_ms`, in start order.
    ///
    /// A task that missed several periods fires once and is rescheduled
    /// relative to `now_ms`.
    pub fn due(&mut self, now_ms: u64) -> Vec<TaskHandle> {
        let mut fired = Vec::new();
        for (handle, task) in self.tasks.iter_mut() {
            if task.next_due <= now_ms {
                fired.push(*handle);
                task.next_due = now_ms + task.period_ms.max(1);
            }
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn start_repeating(&mut self, label: &'static str, period_ms: u64, now_ms: u64) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        self.tasks.insert(
            handle,
            Task {
                label,
                period_ms,
                next_due: now_ms + period_ms.max(1),
            },
        );
        log::debug!("Started task '{}' ({}ms)", label, period_ms);
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            log::debug!("Cancelled task '{}'", task.label);
        }
    }

    fn is_active(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_on_period() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.start_repeating("a", 100, 0);
        let b = scheduler.start_repeating("b", 250, 0);

        assert!(scheduler.due(50).is_empty());
        assert_eq!(scheduler.due(100), vec![a]);
        assert_eq!(scheduler.due(250), vec![a, b]);
        assert!(scheduler.due(300).is_empty());
    }

    #[test]
    fn test_missed_periods_fire_once() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.start_repeating("a", 10, 0);
        assert_eq!(scheduler.due(1000), vec![a]);
        assert!(scheduler.due(1005).is_empty());
        assert_eq!(scheduler.due(1010), vec![a]);
    }

    #[test]
    fn test_cancel_stops_task() {
        let mut scheduler = ManualScheduler::new();
        let a = scheduler.start_repeating("poll", 10, 0);
        assert!(scheduler.is_active(a));
        scheduler.cancel(a);
        scheduler.cancel(a);
        assert!(!scheduler.is_active(a));
        assert!(scheduler.due(100).is_empty());
        assert_eq!(scheduler.active_count(), 0);
    }
}
