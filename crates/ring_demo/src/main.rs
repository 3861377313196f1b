//! Demonstrates the ring end to end: register a handler, submit a NOP and
//! a file read, drain completions, tear down. Stands in for the source's
//! `main()` event loop wiring, minus the Telegram-specific bits that live
//! outside the core (see PURPOSE & SCOPE in the spec this repo implements).

use std::env;
use std::ffi::CString;

use ring_core::RingBuilder;
use ring_handlers::{prep_read_file, read_file_handler};

fn main() {
    let ring = RingBuilder::new(8).register(read_file_handler).build();

    let nop_sqe = ring.get_sqe().unwrap();
    nop_sqe.fill(|s| {
        s.prep_nop();
        s.set_data(1);
    });

    let self_path = env::current_exe().expect("current_exe");
    let self_path = CString::new(self_path.to_string_lossy().into_owned()).unwrap();
    let mut buf = vec![0u8; 4096];
    let buf_ptr: *mut [u8] = buf.as_mut_slice();
    let read_sqe = ring.get_sqe().unwrap();
    read_sqe.fill(|s| {
        // Safety: `buf` is not touched again until after `wait_cqe_nr`
        // below observes the matching completion.
        prep_read_file(s, &self_path, unsafe { &mut *buf_ptr });
        s.set_data(2);
    });

    let dispatched = ring.submit_and_wait(2).expect("submit_and_wait");
    println!("dispatched {dispatched} operations");

    ring.for_each_cqe(|cqe| match cqe.user_data {
        1 => println!("nop completed: res={}", cqe.res),
        2 => println!("read completed: res={} bytes", cqe.res),
        other => println!("unexpected completion tag {other}"),
    });
    ring.cq_advance(2);

    ring.destroy();
}
