//! Option and flag types shared across the header, container, and iterator
//! layers.
//!
//! The composable flag groups are implemented with `bitflags`, the same crate
//! the chess-engine example in this retrieval pack reaches for when it needs a
//! small closed set of combinable bits (`Castling`); the mutually exclusive
//! choices (lock kind, duplicate policy, insertion end, scan order) stay plain
//! enums.

use bitflags::bitflags;

/// The lock variant selected at allocation time.
///
/// Immutable once an object is allocated — see the header invariants.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LockKind {
    /// No embedded lock; callers must synchronize externally.
    None,
    /// A single embedded mutex.
    Mutex,
    /// An embedded reader/writer lock.
    RwLock,
}

/// Which mode a reader/writer lock is held (or requested) in.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LockMode {
    /// Shared/read access.
    Read,
    /// Exclusive/write access. Mutex-compatible: a mutex has no weaker mode, so
    /// `LockMode::Write` is reported whenever a mutex (or no lock) is held.
    Write,
}

/// Duplicate-key handling policy for `Link`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DuplicatePolicy {
    /// Insert regardless of existing equal-key entries.
    Allow,
    /// Reject the link if any existing entry compares equal under the sort
    /// function.
    RejectKey,
    /// Reject only if the *same object* (pointer identity) is already linked;
    /// otherwise allow.
    RejectSameObject,
    /// Replace the existing equal-key entry's object with the new one.
    Replace,
}

/// Which end of a bucket new entries are inserted from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InsertEnd {
    /// Insert at the head, scanning tail-to-head for sorted placement.
    Head,
    /// Insert at the tail, scanning head-to-tail for sorted placement.
    Tail,
}

/// Bucket/traversal scan order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Order {
    /// Low-to-high bucket order, head-to-tail node order (the default).
    Ascending,
    /// High-to-low bucket order, tail-to-head node order.
    Descending,
    /// Synonym for `Ascending`, kept alongside it for callers that think in
    /// pre/post-order traversal terms.
    Pre,
    /// Synonym for `Descending`, kept alongside it for callers that think in
    /// pre/post-order traversal terms.
    Post,
}

impl Order {
    /// Does this order scan buckets/nodes in descending direction?
    pub fn is_descending(self) -> bool {
        matches!(self, Order::Descending | Order::Post)
    }
}

impl Default for Order {
    fn default() -> Order {
        Order::Ascending
    }
}

/// Raw allocation-time option byte, as a foreign caller would pass it.
///
/// Bits 0-1 select the lock kind, bits 2-3 select the duplicate policy, bit 4
/// selects the insertion end. Any other bit set is rejected outright with
/// `Error::InvalidOptions` rather than silently falling back to
/// `DuplicatePolicy::Allow`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct RawOptions(pub u8);

const LOCK_KIND_MASK: u8 = 0b0000_0011;
const DUPLICATE_POLICY_MASK: u8 = 0b0000_1100;
const DUPLICATE_POLICY_SHIFT: u8 = 2;
const INSERT_TAIL_BIT: u8 = 0b0001_0000;
const KNOWN_BITS: u8 = LOCK_KIND_MASK | DUPLICATE_POLICY_MASK | INSERT_TAIL_BIT;

impl RawOptions {
    /// Decode into the typed option triple, or reject unknown bits.
    pub fn decode(self) -> Result<(LockKind, DuplicatePolicy, InsertEnd), crate::Error> {
        if self.0 & !KNOWN_BITS != 0 {
            return Err(crate::Error::InvalidOptions(format!(
                "unknown option bits set: {:#010b}",
                self.0 & !KNOWN_BITS
            )));
        }

        let lock = match self.0 & LOCK_KIND_MASK {
            0 => LockKind::None,
            1 => LockKind::Mutex,
            2 => LockKind::RwLock,
            other => {
                return Err(crate::Error::InvalidOptions(format!(
                    "lock selector {} out of range",
                    other
                )))
            }
        };

        let policy = match (self.0 & DUPLICATE_POLICY_MASK) >> DUPLICATE_POLICY_SHIFT {
            0 => DuplicatePolicy::Allow,
            1 => DuplicatePolicy::RejectKey,
            2 => DuplicatePolicy::RejectSameObject,
            3 => DuplicatePolicy::Replace,
            _ => unreachable!("two-bit field"),
        };

        let end = if self.0 & INSERT_TAIL_BIT != 0 {
            InsertEnd::Tail
        } else {
            InsertEnd::Head
        };

        Ok((lock, policy, end))
    }
}

bitflags! {
    /// Flags accepted by `Link`.
    pub struct LinkFlags: u8 {
        /// The caller already holds the container's write lock.
        const NO_LOCK = 0b0000_0001;
    }
}

bitflags! {
    /// Flags composing a `Callback`/`CallbackWithData`/`Find`/`Unlink` search.
    pub struct SearchFlags: u16 {
        /// The search argument is a full object to compare by pointer identity.
        const POINTER  = 0b0000_0000_0001;
        /// The search argument is a key to compare via the sort/compare function.
        const KEY      = 0b0000_0000_0010;
        /// Unlink matched entries as they are found.
        const UNLINK   = 0b0000_0000_0100;
        /// Do not bump the refcount of / return matched objects.
        const NO_DATA  = 0b0000_0000_1000;
        /// Collect every match into a transient container, returned via an
        /// iterator, instead of stopping at the first.
        const MULTIPLE = 0b0000_0001_0000;
        /// After exhausting the hashed start bucket, wrap around and scan every
        /// other bucket too.
        const CONTINUE = 0b0000_0010_0000;
        /// The caller already holds the container's lock at an appropriate
        /// level; adjust rather than acquire fresh.
        const NO_LOCK  = 0b0000_0100_0000;
    }
}

bitflags! {
    /// Flags given to `IteratorInit`.
    pub struct IteratorFlags: u8 {
        /// Iterate in descending (tail-to-head / high-to-low bucket) order.
        const DESCENDING  = 0b0000_0001;
        /// Each `Next` call unlinks the object it returns, transferring
        /// ownership of the reference to the caller.
        const UNLINK_MODE = 0b0000_0010;
        /// The caller already holds the container's lock; `Next`/`Destroy`
        /// adjust rather than acquire.
        const DONT_LOCK   = 0b0000_0100;
        /// Heap-allocate the iterator's cell instead of returning it by value.
        ///
        /// In this crate every `Iterator<T>` is already an owned, heap-backed
        /// value (its pinned node, if any, is an `Arc`), so this flag has no
        /// representational effect; it is kept to preserve the option
        /// enumeration from the external contract and is surfaced on
        /// `Iterator::is_heap_allocated`.
        const MALLOCD     = 0b0000_1000;
    }
}

bitflags! {
    /// Bits a matcher callback returns from visiting one candidate node.
    pub struct MatchFlags: u8 {
        /// The candidate matches and should be processed (counted, collected,
        /// unlinked, as the search flags dictate).
        const MATCH = 0b01;
        /// Stop the traversal after this node, whether or not it matched.
        const STOP  = 0b10;
    }
}
