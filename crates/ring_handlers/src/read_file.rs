use std::ffi::CStr;

use ring_core::{Ring, Sqe};

/// Opcode for [`read_file_handler`], assuming it is the first (and only)
/// handler registered with a `RingBuilder`. If more handlers are
/// registered ahead of it, use whatever opcode its registration position
/// assigns instead.
pub const OP_READ_FILE: u8 = 1;

/// Stage a blocking read of `path` into `buf`.
///
/// `path` and `buf` must remain valid until the matching CQE is observed:
/// the handler runs on a worker thread some time after `submit` returns,
/// and it dereferences both raw pointers staged here. This mirrors the
/// source's convention of staging caller-owned pointers into SQE argument
/// slots rather than copying the data itself.
pub fn prep_read_file(sqe: &mut Sqe, path: &CStr, buf: &mut [u8]) {
    sqe.op = OP_READ_FILE;
    sqe.set_arg_u64(0, path.as_ptr() as u64);
    sqe.set_arg_u64(1, buf.as_mut_ptr() as u64);
    sqe.set_arg_u64(2, buf.len() as u64);
}

/// The handler body for [`OP_READ_FILE`]. Register it with
/// `RingBuilder::register` to assign it an opcode.
pub fn read_file_handler(sqe: Sqe, ring: Ring) {
    let path_ptr = sqe.arg_u64(0) as *const libc::c_char;
    let buf_ptr = sqe.arg_u64(1) as *mut u8;
    let buf_len = sqe.arg_u64(2) as usize;

    // Safety: the caller of `prep_read_file` promised both pointers stay
    // valid until this handler runs; the ring never touches SQE memory
    // past dispatch, so there is no aliasing with the ring's own buffers.
    let path = unsafe { CStr::from_ptr(path_ptr) };

    let res = open_and_read(path, buf_ptr, buf_len);
    ring.post_cqe(res, sqe.user_data);
}

fn open_and_read(path: &CStr, buf_ptr: *mut u8, buf_len: usize) -> i64 {
    // Safety: `path` is a valid, nul-terminated C string for the duration
    // of this call (see `read_file_handler`).
    let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDONLY) };
    if fd < 0 {
        return -(std::io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO) as i64);
    }

    // Safety: `buf_ptr` is valid for `buf_len` bytes for the duration of
    // this call (see `read_file_handler`); `read` never writes past that.
    let n = unsafe { libc::read(fd, buf_ptr as *mut libc::c_void, buf_len) };
    let res = if n < 0 {
        -(std::io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO) as i64)
    } else {
        n as i64
    };

    unsafe {
        libc::close(fd);
    }
    res
}
