use std::sync::Arc;

use crate::ring::Ring;
use crate::sqe::Sqe;

/// Always present, always opcode 0. Handled inline, never dispatched to
/// the worker pool.
pub const OP_NOP: u8 = 0;

/// A registered operation handler.
///
/// Invoked on a worker thread with a copy of the dispatching SQE and a
/// handle back to the ring. The handler is responsible for calling
/// [`Ring::post_cqe`] itself — the ring does not infer a completion from
/// the handler returning.
pub type HandlerFn = dyn Fn(Sqe, Ring) + Send + Sync;

/// The opcode registry: `NOP` plus whatever handlers the caller registered
/// with [`crate::ring::RingBuilder::register`], in registration order.
/// Valid non-`NOP` opcodes are `1..=handlers.len()`; `op_last()` is one
/// past the final valid opcode, mirroring the C sentinel `GW_RING_OP_LAST`.
pub(crate) struct OpRegistry {
    handlers: Vec<Arc<HandlerFn>>,
}

impl OpRegistry {
    pub(crate) fn new(handlers: Vec<Arc<HandlerFn>>) -> Self {
        Self { handlers }
    }

    pub(crate) fn op_last(&self) -> u8 {
        (self.handlers.len() + 1) as u8
    }

    /// `None` for `NOP` (handled inline by the caller) and for opcodes
    /// outside the registered range (the caller treats that as a fatal
    /// unknown-opcode condition, see `Ring::issue`).
    pub(crate) fn lookup(&self, op: u8) -> Option<&Arc<HandlerFn>> {
        if op == OP_NOP || op >= self.op_last() {
            return None;
        }
        self.handlers.get(op as usize - 1)
    }
}
