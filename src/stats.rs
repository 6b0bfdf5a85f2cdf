//! Process-wide observability counters, gated behind `--features stats`.
//!
//! Five atomic counters, bumped at the points named in the glossary
//! (objects, bytes, containers, references, locks) and read back as one
//! snapshot. Grounded on the `lazy_static!`-backed global state
//! `redox-os-tfs`'s `conc` crate keeps for its hazard-pointer bookkeeping;
//! the counting itself, not any particular profiling policy, is this
//! crate's job — what a caller does with the snapshot (export it to a
//! metrics system, print it) is out of scope.

use std::sync::atomic::{AtomicI64, Ordering};

use lazy_static::lazy_static;

lazy_static! {
    static ref COUNTERS: Counters = Counters::new();
}

struct Counters {
    objects: AtomicI64,
    bytes: AtomicI64,
    containers: AtomicI64,
    references: AtomicI64,
    locks: AtomicI64,
}

impl Counters {
    fn new() -> Counters {
        Counters {
            objects: AtomicI64::new(0),
            bytes: AtomicI64::new(0),
            containers: AtomicI64::new(0),
            references: AtomicI64::new(0),
            locks: AtomicI64::new(0),
        }
    }
}

/// A point-in-time read of the global counters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub objects: i64,
    pub bytes: i64,
    pub containers: i64,
    pub references: i64,
    pub locks: i64,
}

/// Read every counter at once.
pub fn snapshot() -> Snapshot {
    Snapshot {
        objects: COUNTERS.objects.load(Ordering::SeqCst),
        bytes: COUNTERS.bytes.load(Ordering::SeqCst),
        containers: COUNTERS.containers.load(Ordering::SeqCst),
        references: COUNTERS.references.load(Ordering::SeqCst),
        locks: COUNTERS.locks.load(Ordering::SeqCst),
    }
}

pub(crate) fn object_allocated(size_bytes: usize) {
    COUNTERS.objects.fetch_add(1, Ordering::SeqCst);
    COUNTERS.bytes.fetch_add(size_bytes as i64, Ordering::SeqCst);
}

pub(crate) fn object_freed(size_bytes: usize) {
    COUNTERS.objects.fetch_sub(1, Ordering::SeqCst);
    COUNTERS.bytes.fetch_sub(size_bytes as i64, Ordering::SeqCst);
}

pub(crate) fn container_created() {
    COUNTERS.containers.fetch_add(1, Ordering::SeqCst);
}

pub(crate) fn container_destroyed() {
    COUNTERS.containers.fetch_sub(1, Ordering::SeqCst);
}

pub(crate) fn reference_taken() {
    COUNTERS.references.fetch_add(1, Ordering::SeqCst);
}

pub(crate) fn reference_dropped() {
    COUNTERS.references.fetch_sub(1, Ordering::SeqCst);
}

pub(crate) fn lock_acquired() {
    COUNTERS.locks.fetch_add(1, Ordering::SeqCst);
}

pub(crate) fn lock_released() {
    COUNTERS.locks.fetch_sub(1, Ordering::SeqCst);
}
