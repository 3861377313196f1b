use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::job::Job;
use crate::shared_state::SharedState;
use crate::worker;

/// Configuration for [`ThreadPool::new`].
///
/// Mirrors the attributes a caller hands to the ring at init time: a name
/// (used as the worker thread name prefix), a bound on live worker
/// threads, and a bound on queued-but-not-yet-running jobs.
#[derive(Debug, Clone)]
pub struct ThreadPoolAttr {
    pub name: String,
    pub min_threads: usize,
    pub max_threads: usize,
    pub max_pending_works: usize,
}

impl Default for ThreadPoolAttr {
    fn default() -> Self {
        Self {
            name: "io-wq".to_string(),
            min_threads: 1,
            max_threads: 64,
            max_pending_works: 4096,
        }
    }
}

/// Why `try_queue_work` could not accept a job.
///
/// The caller keeps ownership of the `Job` it tried to submit (see
/// [`ThreadPool::try_queue_work`]); dropping it runs the job's cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// `max_pending_works` jobs are already queued.
    Full,
    /// `destroy` has been called; the pool accepts no more work.
    ShuttingDown,
}

/// A bounded pool of worker threads draining a bounded queue of [`Job`]s.
///
/// Threads are created lazily: `min_threads` are spawned up front, and one
/// more is spawned per `try_queue_work` call that finds no idle worker,
/// up to `max_threads`. `try_queue_work` never blocks — a full queue or a
/// pool mid-shutdown is reported back to the caller rather than waited on.
pub struct ThreadPool {
    state: Arc<SharedState>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    pub fn new(attr: ThreadPoolAttr) -> Self {
        let state = Arc::new(SharedState::new(
            attr.name,
            attr.max_threads.max(1),
            attr.max_pending_works,
        ));
        let mut handles = Vec::with_capacity(attr.min_threads.max(1));
        {
            let mut guard = state.queue.lock().unwrap();
            for _ in 0..attr.min_threads.max(1).min(state.max_threads) {
                guard.spawned += 1;
                handles.push(spawn_worker(&state, guard.spawned));
            }
        }
        eprintln!(
            "{}: pool up — {} worker(s), max_threads={}, max_pending={}",
            state.name,
            handles.len(),
            state.max_threads,
            state.max_pending
        );
        Self {
            state,
            handles: Mutex::new(handles),
        }
    }

    /// Enqueue `job` without blocking.
    ///
    /// On any non-`Ok` return, `job` is handed back to the caller inside
    /// the error so it can be dropped — running its cleanup — instead of
    /// the pool silently discarding it.
    pub fn try_queue_work(&self, job: Job) -> Result<(), (Job, QueueError)> {
        let mut guard = self.state.queue.lock().unwrap();
        if guard.shutting_down {
            return Err((job, QueueError::ShuttingDown));
        }
        if guard.pending.len() >= self.state.max_pending {
            return Err((job, QueueError::Full));
        }
        guard.pending.push_back(job);
        if guard.idle == 0 && guard.spawned < self.state.max_threads {
            guard.spawned += 1;
            let id = guard.spawned;
            drop(guard);
            self.handles.lock().unwrap().push(spawn_worker(&self.state, id));
        } else {
            drop(guard);
        }
        self.state.not_empty.notify_one();
        Ok(())
    }

    /// Block until no job is running or queued.
    pub fn wait_all_work_done(&self) {
        let guard = self.state.queue.lock().unwrap();
        let _guard = self
            .state
            .all_done
            .wait_while(guard, |q| q.active > 0 || !q.pending.is_empty())
            .unwrap();
    }

    /// Signal shutdown, wake every worker, drain queued jobs (running
    /// their cleanup via `Drop` rather than their body), join threads.
    ///
    /// Takes `&self` rather than consuming the pool so it can be called
    /// through a shared handle (e.g. an `Arc`) without requiring unique
    /// ownership; calling it twice is harmless (the second call joins an
    /// empty handle list).
    pub fn destroy(&self) {
        {
            let mut guard = self.state.queue.lock().unwrap();
            guard.shutting_down = true;
            // Draining here — rather than leaving it to each worker — means
            // cleanup runs even for jobs no worker ever gets around to.
            guard.pending.clear();
        }
        self.state.not_empty.notify_all();
        for handle in self.handles.lock().unwrap().drain(..) {
            let _ = handle.join();
        }
        eprintln!("{}: pool shut down cleanly", self.state.name);
    }
}

fn spawn_worker(state: &Arc<SharedState>, worker_id: usize) -> JoinHandle<()> {
    let state = Arc::clone(state);
    thread::Builder::new()
        .name(format!("{}-{}", state.name, worker_id))
        .spawn(move || worker::run(state))
        .expect("failed to spawn worker thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn runs_queued_work() {
        let pool = ThreadPool::new(ThreadPoolAttr {
            name: "test".into(),
            min_threads: 1,
            max_threads: 4,
            max_pending_works: 16,
        });
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.try_queue_work(Job::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        pool.wait_all_work_done();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
        pool.destroy();
    }

    #[test]
    fn rejects_when_queue_full() {
        let pool = ThreadPool::new(ThreadPoolAttr {
            name: "test".into(),
            min_threads: 0,
            max_threads: 0,
            max_pending_works: 1,
        });
        pool.try_queue_work(Job::new(|| {})).unwrap();
        let err = pool.try_queue_work(Job::new(|| {})).unwrap_err();
        assert_eq!(err.1, QueueError::Full);
        pool.destroy();
    }

    #[test]
    fn cleanup_runs_on_drop_when_discarded() {
        let flag = Arc::new(AtomicUsize::new(0));
        struct DropMark(Arc<AtomicUsize>);
        impl Drop for DropMark {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let pool = ThreadPool::new(ThreadPoolAttr {
            name: "test".into(),
            min_threads: 0,
            max_threads: 0,
            max_pending_works: 1,
        });
        let mark = DropMark(Arc::clone(&flag));
        let job = Job::new(move || {
            let _mark = mark;
        });
        let (job, err) = pool.try_queue_work(job).unwrap_err();
        assert_eq!(err, QueueError::Full);
        drop(job);
        assert_eq!(flag.load(Ordering::SeqCst), 1);
        pool.destroy();
    }

    #[test]
    fn destroy_drains_pending_cleanup() {
        let flag = Arc::new(AtomicUsize::new(0));
        struct DropMark(Arc<AtomicUsize>);
        impl Drop for DropMark {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let pool = ThreadPool::new(ThreadPoolAttr {
            name: "test".into(),
            min_threads: 0,
            max_threads: 1,
            max_pending_works: 4,
        });
        // Keep the single worker busy so the next jobs stay queued.
        pool.try_queue_work(Job::new(|| thread_sleep_ms(200))).unwrap();
        for _ in 0..2 {
            let mark = DropMark(Arc::clone(&flag));
            pool.try_queue_work(Job::new(move || {
                let _mark = mark;
            }))
            .unwrap();
        }
        pool.destroy();
        assert_eq!(flag.load(Ordering::SeqCst), 2);
    }

    fn thread_sleep_ms(ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
