/// A unit of work handed to the pool.
///
/// `Job` wraps a boxed closure. If the job runs, dropping it after `run()`
/// drops whatever the closure already consumed. If the job is discarded
/// without running — queue full, pool shutting down, drained at `destroy`
/// — dropping it runs the same destructors on whatever it captured. That
/// drop glue *is* the cleanup callback: there is no separate cleanup
/// function pointer to remember to call.
pub struct Job {
    body: Box<dyn FnOnce() + Send + 'static>,
}

impl Job {
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            body: Box::new(body),
        }
    }

    pub fn run(self) {
        (self.body)()
    }
}
