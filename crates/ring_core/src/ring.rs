use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use ring_threadpool::{Job, QueueError, ThreadPool, ThreadPoolAttr};

use crate::cqe::Cqe;
use crate::error::{Result, RingError};
use crate::opcode::{HandlerFn, OpRegistry, OP_NOP};
use crate::sqe::Sqe;

fn next_pow2(n: u32) -> u32 {
    let n = n.max(2);
    n.next_power_of_two()
}

struct SqState {
    sqes: Vec<Sqe>,
    head: u32,
    tail: u32,
}

struct CqState {
    head: u32,
    tail: u32,
    post_waiters: usize,
    wait_waiters: usize,
}

/// The two circular buffers plus their synchronization state and the
/// worker pool used to dispatch both SQE handlers and overflow completion
/// posts.
///
/// `sq_lock` and `cq_lock` are never held at the same time; see the
/// submission and completion paths below. The CQ slot array lives outside
/// either mutex (see the `Sync` impl) so [`Ring::for_each_cqe`] can walk it
/// without taking `cq_lock`, under the single-consumer assumption the
/// ring's iteration contract requires.
struct RingInner {
    sq: Mutex<SqState>,
    cq: Mutex<CqState>,
    cqes: UnsafeCell<Box<[Cqe]>>,
    sq_mask: u32,
    cq_mask: u32,
    sq_cap: u32,
    cq_cap: u32,
    post_cqe_cond: Condvar,
    wait_cqe_cond: Condvar,
    should_stop: AtomicBool,
    pool: ThreadPool,
    ops: OpRegistry,
}

// Safety: `cqes` is written only while `cq.lock()` is held, and only into
// slots the writer has just confirmed are free (occupancy < cq_cap). The
// lock-free reader in `for_each_cqe` only ever reads slots in
// `[cq_head, cq_tail)` as snapshotted under the same lock, and the single-
// consumer contract in the ring's iteration API means no other reader
// walks the same range concurrently. A slot is not reused until the
// consumer has advanced `cq_head` past it via `cq_advance`.
unsafe impl Sync for RingInner {}

/// A handle to the ring. Cheap to clone — cloning shares the same
/// underlying buffers, locks, and worker pool via `Arc`.
///
/// Handlers receive a `Ring` clone so they can call [`Ring::post_cqe`]
/// from a worker thread once their operation completes.
#[derive(Clone)]
pub struct Ring {
    inner: Arc<RingInner>,
}

/// Configuration for [`Ring::init`]: requested SQ depth plus the opcode
/// handlers to register (in opcode-assignment order, starting at 1).
pub struct RingBuilder {
    entries: u32,
    handlers: Vec<Arc<HandlerFn>>,
    pool_attr: ThreadPoolAttr,
}

impl RingBuilder {
    pub fn new(entries: u32) -> Self {
        Self {
            entries,
            handlers: Vec::new(),
            pool_attr: ThreadPoolAttr {
                name: "io-wq".to_string(),
                min_threads: 1,
                max_threads: 64,
                max_pending_works: 4096,
            },
        }
    }

    /// Register a handler; its opcode is `1 + (handlers registered before it)`.
    pub fn register<F>(mut self, handler: F) -> Self
    where
        F: Fn(Sqe, Ring) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn pool_attr(mut self, attr: ThreadPoolAttr) -> Self {
        self.pool_attr = attr;
        self
    }

    pub fn build(self) -> Ring {
        Ring::init(self.entries, self.handlers, self.pool_attr)
    }
}

impl Ring {
    fn init(entries: u32, handlers: Vec<Arc<HandlerFn>>, pool_attr: ThreadPoolAttr) -> Self {
        let sq_cap = next_pow2(entries);
        let cq_cap = sq_cap * 2;

        let inner = RingInner {
            sq: Mutex::new(SqState {
                sqes: vec![Sqe::empty(); sq_cap as usize],
                head: 0,
                tail: 0,
            }),
            cq: Mutex::new(CqState {
                head: 0,
                tail: 0,
                post_waiters: 0,
                wait_waiters: 0,
            }),
            cqes: UnsafeCell::new(vec![Cqe::empty(); cq_cap as usize].into_boxed_slice()),
            sq_mask: sq_cap - 1,
            cq_mask: cq_cap - 1,
            sq_cap,
            cq_cap,
            post_cqe_cond: Condvar::new(),
            wait_cqe_cond: Condvar::new(),
            should_stop: AtomicBool::new(false),
            pool: ThreadPool::new(pool_attr),
            ops: OpRegistry::new(handlers),
        };

        Ring {
            inner: Arc::new(inner),
        }
    }

    pub fn sq_cap(&self) -> u32 {
        self.inner.sq_cap
    }

    pub fn cq_cap(&self) -> u32 {
        self.inner.cq_cap
    }

    /// Signal shutdown, wake every parked waiter, wait for the pool to
    /// drain, and consume the ring. Any in-flight handler will observe
    /// `should_stop` only if it checks explicitly; already-dispatched work
    /// still runs to completion or is discarded via `Job`'s drop glue.
    pub fn destroy(self) {
        self.inner.should_stop.store(true, Ordering::SeqCst);
        {
            let _guard = self.inner.cq.lock().unwrap();
            self.inner.post_cqe_cond.notify_all();
            self.inner.wait_cqe_cond.notify_all();
        }
        self.inner.pool.wait_all_work_done();
        self.inner.pool.destroy();
        eprintln!("ring: destroyed (sq_cap={}, cq_cap={})", self.inner.sq_cap, self.inner.cq_cap);
    }

    // --- submission path -------------------------------------------------

    /// Reserve a slot, or `Err(NoSqe)` if the SQ is full.
    pub fn get_sqe(&self) -> Result<SqeHandle> {
        let mut guard = self.inner.sq.lock().unwrap();
        if guard.tail.wrapping_sub(guard.head) >= self.inner.sq_cap {
            return Err(RingError::NoSqe);
        }
        let idx = guard.tail;
        guard.tail = guard.tail.wrapping_add(1);
        Ok(SqeHandle {
            ring: self.clone(),
            idx,
        })
    }

    /// Reserve a slot, draining pending SQEs first if the SQ is full so
    /// the reservation always succeeds.
    pub fn get_sqe_nf(&self) -> SqeHandle {
        loop {
            if let Ok(handle) = self.get_sqe() {
                return handle;
            }
            match self.submit() {
                Ok(_) => {}
                // The SQ is full and can't be drained because the ring is
                // tearing down: there is no slot to hand back and no
                // progress to make by spinning, so this is a programming
                // error in the caller rather than a condition to retry.
                Err(RingError::OwnerDead) => {
                    panic!("ring: get_sqe_nf called while ring is shutting down")
                }
            }
        }
    }

    fn sqe_at(guard: &SqState, mask: u32, idx: u32) -> Sqe {
        guard.sqes[(idx & mask) as usize]
    }

    fn sqe_at_mut(guard: &mut SqState, mask: u32, idx: u32) -> &mut Sqe {
        &mut guard.sqes[(idx & mask) as usize]
    }

    /// Dispatch every SQE between `sq_head` and `sq_tail`, advancing
    /// `sq_head` past each one regardless of dispatch outcome. Returns the
    /// count of entries for which dispatch *accepted* the work (posted
    /// inline or handed to the pool), or `Err(OwnerDead)` if `should_stop`
    /// is observed before the loop finishes.
    pub fn submit(&self) -> Result<u32> {
        let mut guard = self.inner.sq.lock().unwrap();
        let mut dispatched = 0u32;
        while guard.head != guard.tail {
            if self.inner.should_stop.load(Ordering::SeqCst) {
                return Err(RingError::OwnerDead);
            }
            let sqe = Self::sqe_at(&guard, self.inner.sq_mask, guard.head);
            guard.head = guard.head.wrapping_add(1);
            // Dispatch without holding sq_lock: issuing may itself call
            // post_cqe (cq_lock) or enqueue to the pool, and the two
            // ring locks must never be held together.
            drop(guard);
            if self.issue(sqe) {
                dispatched += 1;
            }
            guard = self.inner.sq.lock().unwrap();
        }
        Ok(dispatched)
    }

    /// Closed opcode dispatch. Returns whether the SQE's work was
    /// accepted — inline-completed or handed to the pool (possibly as a
    /// synthetic failure completion) — not whether it has finished.
    fn issue(&self, sqe: Sqe) -> bool {
        if sqe.op == OP_NOP {
            return self.post_cqe(0, sqe.user_data);
        }
        match self.inner.ops.lookup(sqe.op) {
            Some(handler) => {
                let handler = Arc::clone(handler);
                let ring = self.clone();
                let job = Job::new(move || handler(sqe, ring));
                match self.inner.pool.try_queue_work(job) {
                    Ok(()) => true,
                    Err((_job, QueueError::Full)) | Err((_job, QueueError::ShuttingDown)) => {
                        // Resource exhaustion: prefer a synthetic failure
                        // completion over silently dropping the SQE.
                        self.post_cqe(-1, sqe.user_data)
                    }
                }
            }
            None => {
                panic!(
                    "ring: unknown opcode {} reached dispatch (op_last={})",
                    sqe.op,
                    self.inner.ops.op_last()
                );
            }
        }
    }

    // --- completion path --------------------------------------------------

    /// Write `(res, user_data)` directly if the CQ has space; otherwise
    /// queue it on the worker pool to be written once space frees up
    /// (`iowq_post_cqe`). Returns whether the completion was accepted by
    /// either path.
    pub fn post_cqe(&self, res: i64, user_data: u64) -> bool {
        {
            let mut guard = self.inner.cq.lock().unwrap();
            if guard.tail.wrapping_sub(guard.head) < self.inner.cq_cap {
                self.write_cqe_locked(&mut guard, res, user_data);
                return true;
            }
        }
        let ring = self.clone();
        let job = Job::new(move || ring.iowq_post_cqe(res, user_data));
        self.inner.pool.try_queue_work(job).is_ok()
    }

    fn write_cqe_locked(&self, guard: &mut CqState, res: i64, user_data: u64) {
        let idx = (guard.tail & self.inner.cq_mask) as usize;
        // Safety: this slot is free (occupancy just checked < cq_cap) and
        // cq_lock is held, so no concurrent writer can touch it; the
        // lock-free reader in for_each_cqe only reads [head, tail), which
        // does not yet include this slot until tail is published below.
        unsafe {
            (*self.inner.cqes.get())[idx] = Cqe { res, user_data };
        }
        guard.tail = guard.tail.wrapping_add(1);
        if guard.wait_waiters > 0 {
            self.inner.wait_cqe_cond.notify_all();
        }
    }

    /// Overflow worker body: park on `post_cqe_cond` until the CQ has
    /// space or the ring is being torn down.
    fn iowq_post_cqe(&self, res: i64, user_data: u64) {
        let mut guard = self.inner.cq.lock().unwrap();
        loop {
            if guard.tail.wrapping_sub(guard.head) < self.inner.cq_cap {
                self.write_cqe_locked(&mut guard, res, user_data);
                return;
            }
            if self.inner.should_stop.load(Ordering::SeqCst) {
                return;
            }
            guard.post_waiters += 1;
            guard = self.inner.post_cqe_cond.wait(guard).unwrap();
            guard.post_waiters -= 1;
        }
    }

    /// Release `n` CQ slots, waking any overflow workers parked on space.
    pub fn cq_advance(&self, n: u32) {
        let mut guard = self.inner.cq.lock().unwrap();
        guard.head = guard.head.wrapping_add(n);
        if guard.post_waiters > 0 {
            self.inner.post_cqe_cond.notify_all();
        }
    }

    // --- waiting ----------------------------------------------------------

    /// Block until at least `nr` completions are ready, or shutdown.
    pub fn wait_cqe_nr(&self, nr: u32) -> Result<()> {
        let mut guard = self.inner.cq.lock().unwrap();
        loop {
            if self.inner.should_stop.load(Ordering::SeqCst) {
                return Err(RingError::OwnerDead);
            }
            if guard.tail.wrapping_sub(guard.head) >= nr {
                return Ok(());
            }
            guard.wait_waiters += 1;
            guard = self.inner.wait_cqe_cond.wait(guard).unwrap();
            guard.wait_waiters -= 1;
        }
    }

    pub fn wait_cqe(&self) -> Result<()> {
        self.wait_cqe_nr(1)
    }

    /// Submit pending SQEs, then wait for `wait_nr` completions. The two
    /// phases take `sq_lock` then `cq_lock` in sequence, never together.
    pub fn submit_and_wait(&self, wait_nr: u32) -> Result<u32> {
        let dispatched = self.submit()?;
        self.wait_cqe_nr(wait_nr)?;
        Ok(dispatched)
    }

    // --- iteration ----------------------------------------------------------

    /// Call `f` for every ready CQE, from a snapshot of `cq_head` up to a
    /// snapshot of `cq_tail` taken under `cq_lock`, walking without the
    /// lock held — safe under the single-consumer contract documented on
    /// [`RingInner`]. Does not advance `cq_head`; call [`Ring::cq_advance`]
    /// once afterward.
    pub fn for_each_cqe(&self, mut f: impl FnMut(Cqe)) -> u32 {
        let (head, tail) = {
            let guard = self.inner.cq.lock().unwrap();
            (guard.head, guard.tail)
        };
        let mut idx = head;
        let mut n = 0;
        while idx != tail {
            let slot = (idx & self.inner.cq_mask) as usize;
            // Safety: see the Sync rationale on RingInner.
            let cqe = unsafe { (*self.inner.cqes.get())[slot] };
            f(cqe);
            idx = idx.wrapping_add(1);
            n += 1;
        }
        n
    }
}

/// A reserved, not-yet-submitted submission slot.
///
/// Fill it with `prep_*`/`set_data`, then drop it — filling happens
/// in-place in the SQ buffer, so there is nothing to flush.
pub struct SqeHandle {
    ring: Ring,
    idx: u32,
}

impl SqeHandle {
    pub fn fill(&self, f: impl FnOnce(&mut Sqe)) {
        let mut guard = self.ring.inner.sq.lock().unwrap();
        let mask = self.ring.inner.sq_mask;
        f(Ring::sqe_at_mut(&mut guard, mask, self.idx));
    }
}
