mod job;
mod pool;
mod shared_state;
mod worker;

pub use job::Job;
pub use pool::{QueueError, ThreadPool, ThreadPoolAttr};
