//! Operation handlers: the closed set of non-`NOP` opcodes a [`ring_core::Ring`]
//! can dispatch to. Each handler here is the Rust analogue of the source's
//! one concrete adapter (`gw_issue_sqe_tg_get_updates` / `iowq_tg_get_updates`):
//! it unpacks the opaque arguments staged in the SQE, performs a blocking
//! operation, and posts the result back through the ring.

mod read_file;

pub use read_file::{prep_read_file, read_file_handler, OP_READ_FILE};
