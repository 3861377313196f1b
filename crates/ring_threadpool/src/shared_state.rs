use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::job::Job;

/// Everything guarded by the pool's single mutex: the pending queue plus
/// the bookkeeping needed to know when the pool is idle.
pub(crate) struct Queue {
    pub(crate) pending: VecDeque<Job>,
    pub(crate) active: usize,
    pub(crate) spawned: usize,
    pub(crate) idle: usize,
    pub(crate) shutting_down: bool,
}

/// State shared between the `ThreadPool` handle and every worker thread.
///
/// A single mutex covers the queue and all the counters that decide
/// whether a new worker needs to be spawned. Two condition variables hang
/// off it: `not_empty` wakes a parked worker when a job arrives or when
/// shutdown is signalled, `all_done` wakes `wait_all_work_done` when the
/// pool drains.
pub(crate) struct SharedState {
    pub(crate) queue: Mutex<Queue>,
    pub(crate) not_empty: Condvar,
    pub(crate) all_done: Condvar,
    pub(crate) name: String,
    pub(crate) max_threads: usize,
    pub(crate) max_pending: usize,
}

impl SharedState {
    pub(crate) fn new(name: String, max_threads: usize, max_pending: usize) -> Self {
        Self {
            queue: Mutex::new(Queue {
                pending: VecDeque::new(),
                active: 0,
                spawned: 0,
                idle: 0,
                shutting_down: false,
            }),
            not_empty: Condvar::new(),
            all_done: Condvar::new(),
            name,
            max_threads,
            max_pending,
        }
    }
}
