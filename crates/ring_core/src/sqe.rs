/// A submission queue entry.
///
/// `args` stands in for the C union of six 64-bit slots: each slot is
/// reinterpreted as unsigned, signed, or pointer-sized depending on what
/// the opcode's `prep_*` function and handler agree on.
#[derive(Debug, Clone, Copy)]
pub struct Sqe {
    pub op: u8,
    pub flags: u32,
    pub user_data: u64,
    pub args: [u64; 6],
}

impl Sqe {
    pub(crate) const fn empty() -> Self {
        Self {
            op: 0,
            flags: 0,
            user_data: 0,
            args: [0; 6],
        }
    }

    pub fn set_data(&mut self, user_data: u64) {
        self.user_data = user_data;
    }

    pub fn arg_u64(&self, i: usize) -> u64 {
        self.args[i]
    }

    pub fn arg_s64(&self, i: usize) -> i64 {
        self.args[i] as i64
    }

    pub fn set_arg_u64(&mut self, i: usize, v: u64) {
        self.args[i] = v;
    }

    pub fn set_arg_s64(&mut self, i: usize, v: i64) {
        self.args[i] = v as u64;
    }

    /// Fill this entry as `OP_NOP`; see [`crate::opcode::OP_NOP`].
    pub fn prep_nop(&mut self) {
        self.op = crate::opcode::OP_NOP;
        self.flags = 0;
        self.args = [0; 6];
    }
}
