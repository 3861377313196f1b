use std::sync::Arc;

use crate::shared_state::SharedState;

/// A worker's main loop: pop a job and run it, or park on `not_empty`.
///
/// Workers are spawned lazily (one per `ThreadPool::try_queue_work` call
/// that finds every existing worker busy, up to `max_threads`) and exit
/// for good once `shutting_down` is observed and the queue is empty.
pub(crate) fn run(state: Arc<SharedState>) {
    loop {
        let mut guard = state.queue.lock().unwrap();
        let job = loop {
            if let Some(job) = guard.pending.pop_front() {
                break Some(job);
            }
            if guard.shutting_down {
                break None;
            }
            guard.idle += 1;
            guard = state.not_empty.wait(guard).unwrap();
            guard.idle -= 1;
        };

        let Some(job) = job else {
            guard.spawned -= 1;
            if guard.spawned == 0 {
                state.all_done.notify_all();
            }
            return;
        };

        guard.active += 1;
        drop(guard);

        job.run();

        let mut guard = state.queue.lock().unwrap();
        guard.active -= 1;
        if guard.active == 0 && guard.pending.is_empty() {
            state.all_done.notify_all();
        }
    }
}
