use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use ring_core::{Cqe, Ring, RingBuilder, RingError};

fn nop_ring(entries: u32) -> Ring {
    RingBuilder::new(entries).build()
}

#[test]
fn single_nop() {
    let ring = nop_ring(2);
    let sqe = ring.get_sqe().unwrap();
    sqe.fill(|s| {
        s.prep_nop();
        s.set_data(0xdead_beef);
    });
    assert_eq!(ring.submit().unwrap(), 1);
    ring.wait_cqe().unwrap();

    let mut seen = Vec::new();
    ring.for_each_cqe(|cqe| seen.push(cqe));
    assert_eq!(
        seen,
        vec![Cqe {
            res: 0,
            user_data: 0xdead_beef
        }]
    );
    ring.cq_advance(1);
    ring.destroy();
}

#[test]
fn two_full_batches_of_nops() {
    let ring = nop_ring(16);
    assert_eq!(ring.sq_cap(), 16);
    assert_eq!(ring.cq_cap(), 32);

    for round in 0..2u64 {
        for i in 0..16u64 {
            let sqe = ring.get_sqe().unwrap();
            sqe.fill(|s| {
                s.prep_nop();
                s.set_data(round * 100 + i);
            });
        }
        assert!(ring.get_sqe().is_err());
        assert_eq!(ring.submit().unwrap(), 16);
    }

    ring.wait_cqe_nr(32).unwrap();
    let mut tags = Vec::new();
    ring.for_each_cqe(|cqe| {
        assert_eq!(cqe.res, 0);
        tags.push(cqe.user_data);
    });
    assert_eq!(tags.len(), 32);
    ring.cq_advance(32);
    ring.destroy();
}

#[test]
fn cq_overflow_delivers_all() {
    let ring = nop_ring(16);
    assert_eq!(ring.cq_cap(), 32);

    for batch in 0..3u64 {
        for i in 0..16u64 {
            let sqe = ring.get_sqe().unwrap();
            sqe.fill(|s| {
                s.prep_nop();
                s.set_data(batch * 16 + i);
            });
        }
        assert_eq!(ring.submit().unwrap(), 16);
    }

    ring.wait_cqe_nr(32).unwrap();
    let mut first = Vec::new();
    ring.for_each_cqe(|cqe| first.push(cqe.user_data));
    assert_eq!(first.len(), 32);
    ring.cq_advance(32);

    ring.wait_cqe_nr(16).unwrap();
    let mut second = Vec::new();
    ring.for_each_cqe(|cqe| second.push(cqe.user_data));
    assert_eq!(second.len(), 16);
    ring.cq_advance(16);

    let mut all: Vec<u64> = first.into_iter().chain(second).collect();
    all.sort_unstable();
    assert_eq!(all, (0..48).collect::<Vec<u64>>());

    ring.destroy();
}

#[test]
fn shutdown_wakes_a_blocked_waiter() {
    let ring = nop_ring(2);
    let waiter = ring.clone();
    let handle = thread::spawn(move || waiter.wait_cqe_nr(1));

    thread::sleep(Duration::from_millis(20));
    ring.destroy();

    assert_eq!(handle.join().unwrap(), Err(RingError::OwnerDead));
}

#[test]
fn never_fail_reservation() {
    let ring = nop_ring(2);
    let first = ring.get_sqe().unwrap();
    first.fill(|s| {
        s.prep_nop();
        s.set_data(1);
    });
    let second = ring.get_sqe().unwrap();
    second.fill(|s| {
        s.prep_nop();
        s.set_data(2);
    });
    assert!(ring.get_sqe().is_err());

    let third = ring.get_sqe_nf();
    third.fill(|s| {
        s.prep_nop();
        s.set_data(3);
    });
    assert_eq!(ring.submit().unwrap(), 1);

    ring.wait_cqe_nr(3).unwrap();
    let mut tags = Vec::new();
    ring.for_each_cqe(|cqe| tags.push(cqe.user_data));
    tags.sort_unstable();
    assert_eq!(tags, vec![1, 2, 3]);
    ring.cq_advance(3);
    ring.destroy();
}

#[test]
fn handler_opcode_round_trips_args() {
    let ring = RingBuilder::new(16)
        .register(|sqe, ring| {
            thread::sleep(Duration::from_millis(5));
            ring.post_cqe(sqe.arg_s64(0), sqe.user_data);
        })
        .build();

    for i in 0..10u64 {
        let sqe = ring.get_sqe().unwrap();
        sqe.fill(|s| {
            s.op = 1;
            s.set_data(i);
            s.set_arg_s64(0, i as i64 * 10);
        });
    }
    assert_eq!(ring.submit().unwrap(), 10);
    ring.wait_cqe_nr(10).unwrap();

    let mut got = HashMap::new();
    ring.for_each_cqe(|cqe| {
        got.insert(cqe.user_data, cqe.res);
    });
    ring.cq_advance(10);
    assert_eq!(got.len(), 10);
    for i in 0..10u64 {
        assert_eq!(got[&i], i as i64 * 10);
    }
    ring.destroy();
}
