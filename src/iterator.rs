//! The container iterator.
//!
//! `Iterator<T>` is a cursor over a snapshot of matches — the same
//! transient container a `MULTIPLE` search produces:
//! `Container::traverse` with `SearchFlags::MULTIPLE` collects every match up
//! front (unlinking them too, if `SearchFlags::UNLINK` was given), and this
//! type hands them out one at a time via `next`. The cursor pins whichever
//! handle it last returned so that, in `UNLINK_MODE`, the object stays alive
//! for the caller to inspect even though it has already left the container.

use std::sync::Mutex;

use crate::container::Container;
use crate::error::Error;
use crate::flags::{IteratorFlags, MatchFlags, Order, SearchFlags};
use crate::header::Handle;

pub struct Iterator<T> {
    items: Mutex<std::vec::IntoIter<Handle<T>>>,
    last: Mutex<Option<Handle<T>>>,
    flags: IteratorFlags,
}

impl<T> Iterator<T> {
    /// `IteratorInit` over an already-collected snapshot (the result of a
    /// `MULTIPLE` traversal).
    pub fn from_matches(handles: Vec<Handle<T>>, flags: IteratorFlags) -> Iterator<T> {
        Iterator {
            items: Mutex::new(handles.into_iter()),
            last: Mutex::new(None),
            flags,
        }
    }

    /// `IteratorInit` over an entire container, with no matcher: every live
    /// element becomes part of the snapshot.
    pub fn over_container(
        container: &dyn Container<T>,
        flags: IteratorFlags,
    ) -> Result<Iterator<T>, Error> {
        let order = if flags.contains(IteratorFlags::DESCENDING) {
            Order::Descending
        } else {
            Order::Ascending
        };
        let mut search_flags = SearchFlags::MULTIPLE;
        if flags.contains(IteratorFlags::UNLINK_MODE) {
            search_flags |= SearchFlags::UNLINK;
        }
        let handles = container.traverse(order, search_flags, &mut |_| MatchFlags::MATCH)?;
        Ok(Iterator::from_matches(handles, flags))
    }

    /// `Next`: the next handle in the snapshot, pinning it until the
    /// following call (or until this iterator is dropped).
    pub fn next(&self) -> Option<Handle<T>> {
        let next = self.items.lock().unwrap().next();
        *self.last.lock().unwrap() = next.clone();
        next
    }

    /// Was this iterator created in unlink mode? Each yielded handle already
    /// owns the reference that used to belong to the container.
    pub fn is_unlink_mode(&self) -> bool {
        self.flags.contains(IteratorFlags::UNLINK_MODE)
    }

    /// See `IteratorFlags::MALLOCD` — preserved for contract parity, with no
    /// representational effect in this crate (every iterator is already an
    /// owned heap value).
    pub fn is_heap_allocated(&self) -> bool {
        self.flags.contains(IteratorFlags::MALLOCD)
    }

    /// `IteratorDestroy`/`Cleanup`: release the pinned handle, if any, ahead
    /// of the iterator's own scope ending.
    pub fn destroy(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::LockKind;

    #[test]
    fn yields_every_match_in_order() {
        let handles = vec![
            Handle::allocate(1, None, LockKind::None),
            Handle::allocate(2, None, LockKind::None),
            Handle::allocate(3, None, LockKind::None),
        ];
        let iter = Iterator::from_matches(handles, IteratorFlags::empty());
        assert_eq!(*iter.next().unwrap(), 1);
        assert_eq!(*iter.next().unwrap(), 2);
        assert_eq!(*iter.next().unwrap(), 3);
        assert!(iter.next().is_none());
    }

    #[test]
    fn pins_last_returned_handle() {
        let handles = vec![Handle::allocate(9, None, LockKind::None)];
        let iter = Iterator::from_matches(handles, IteratorFlags::empty());
        let first = iter.next().unwrap();
        assert_eq!(first.strong_count(), 2);
        drop(first);
    }

    #[test]
    fn reports_unlink_mode() {
        let iter: Iterator<i32> = Iterator::from_matches(Vec::new(), IteratorFlags::UNLINK_MODE);
        assert!(iter.is_unlink_mode());
    }
}
