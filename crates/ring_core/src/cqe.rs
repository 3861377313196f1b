/// A completion queue entry.
///
/// `res` is handler-defined; by convention negative values signal failure,
/// mirroring the errno-as-negative-return convention the handlers below
/// inherit from the operation they adapt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cqe {
    pub res: i64,
    pub user_data: u64,
}

impl Cqe {
    pub(crate) const fn empty() -> Self {
        Self {
            res: 0,
            user_data: 0,
        }
    }
}
