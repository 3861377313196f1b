mod cqe;
mod error;
mod opcode;
mod ring;
mod sqe;

pub use cqe::Cqe;
pub use error::{Result, RingError};
pub use opcode::OP_NOP;
pub use ring::{Ring, RingBuilder, SqeHandle};
pub use sqe::Sqe;

pub use ring_threadpool::ThreadPoolAttr;
