//! The polymorphic container abstraction.
//!
//! `Container<T>` is deliberately small and object-safe: everything a caller
//! can do to any container — link an object in, traverse/find/unlink by a
//! caller-supplied matcher, ask how many elements it holds, check its
//! internal consistency, or log a snapshot of its stats — goes through this
//! trait. `HashContainer<T>` (`hash.rs`) is the one real implementor.
//! `TreeContainer<T>` is kept as an explicit, fully wired-up placeholder: the
//! spec calls out a red-black-tree variant as a real future container that
//! is nonetheless out of scope for this crate, so it gets a type and a trait
//! impl, not a TODO comment.

use slog::Logger;

use crate::error::Error;
use crate::flags::{LinkFlags, MatchFlags, Order, SearchFlags};
use crate::header::Handle;

/// Operations common to every container variant.
///
/// Matchers are `FnMut(&T) -> MatchFlags` rather than a fixed comparison, so
/// callers can express `Callback`, `CallbackWithData`, `Find`, and `Unlink`
/// (the spec's four search-family operations) with one traversal primitive:
/// the combination of `SearchFlags` bits and what the matcher returns decides
/// which of those four the caller actually gets.
pub trait Container<T>: Send + Sync {
    /// `Count`: the number of live (non-tombstone) elements.
    ///
    /// Racy with respect to concurrent `Link`/`Unlink` unless the caller
    /// holds the container's lock externally, exactly as the spec documents.
    fn count(&self) -> Result<usize, Error>;

    /// `Link`: insert `handle`, honoring the container's configured
    /// duplicate policy and insertion end.
    fn link(&self, handle: Handle<T>, flags: LinkFlags) -> Result<(), Error>;

    /// The shared traversal primitive backing `Callback`, `CallbackWithData`,
    /// `Find`, and `Unlink`.
    ///
    /// Visits live elements in `order`, calling `matcher` on each. An element
    /// for which the matcher returns `MatchFlags::MATCH` is collected into
    /// the result (and, if `flags` contains `SearchFlags::UNLINK`, unlinked
    /// first). Traversal stops early once the matcher returns
    /// `MatchFlags::STOP`, or once a single match has been collected unless
    /// `flags` contains `SearchFlags::MULTIPLE`.
    fn traverse(
        &self,
        order: Order,
        flags: SearchFlags,
        matcher: &mut dyn FnMut(&T) -> MatchFlags,
    ) -> Result<Vec<Handle<T>>, Error>;

    /// `Find`: the first live element the matcher marks as a match.
    fn find_one(
        &self,
        order: Order,
        flags: SearchFlags,
        matcher: &mut dyn FnMut(&T) -> MatchFlags,
    ) -> Result<Option<Handle<T>>, Error> {
        Ok(self.traverse(order, flags, matcher)?.into_iter().next())
    }

    /// `Unlink`: remove `handle` from this container by pointer identity,
    /// returning it back to the caller if it was present.
    ///
    /// A thin convenience wrapper over `traverse` with a pointer-equality
    /// matcher and `UNLINK | POINTER`, per spec.md §4.4 — comparing each
    /// candidate's payload address (`&T`, stable for the life of a `Handle`)
    /// against `handle`'s own address stands in for the external contract's
    /// raw pointer-equality comparison.
    fn unlink_object(&self, handle: &Handle<T>) -> Result<Option<Handle<T>>, Error> {
        let target: *const T = &**handle;
        let mut matcher = |candidate: &T| {
            if std::ptr::eq(candidate as *const T, target) {
                MatchFlags::MATCH | MatchFlags::STOP
            } else {
                MatchFlags::empty()
            }
        };
        Ok(self
            .traverse(
                Order::Ascending,
                SearchFlags::UNLINK | SearchFlags::POINTER,
                &mut matcher,
            )?
            .into_iter()
            .next())
    }

    /// A structural self-check: bucket/node invariants, sort order, and
    /// (when compiled with `--features devmode`) bucket occupancy. Intended
    /// for tests and diagnostics, not the hot path.
    fn check(&self) -> Result<(), Error>;

    /// Log a one-line stats snapshot (`Stats`). Under `--features devmode`
    /// this additionally logs per-bucket occupancy; without the feature only
    /// the element count is logged.
    fn log_stats(&self, log: &Logger);
}

/// Placeholder for a red-black-tree-backed container.
///
/// Reserves the name and shape of a future sorted-tree variant without
/// implementing one; every method reports `Error::Unimplemented`.
pub struct TreeContainer<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> TreeContainer<T> {
    pub fn new() -> TreeContainer<T> {
        TreeContainer {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> Default for TreeContainer<T> {
    fn default() -> Self {
        TreeContainer::new()
    }
}

// SAFETY: `TreeContainer<T>` holds no data; it is trivially shareable for any `T`.
unsafe impl<T> Send for TreeContainer<T> {}
unsafe impl<T> Sync for TreeContainer<T> {}

impl<T> Container<T> for TreeContainer<T> {
    fn count(&self) -> Result<usize, Error> {
        Err(Error::Unimplemented)
    }

    fn link(&self, _handle: Handle<T>, _flags: LinkFlags) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn traverse(
        &self,
        _order: Order,
        _flags: SearchFlags,
        _matcher: &mut dyn FnMut(&T) -> MatchFlags,
    ) -> Result<Vec<Handle<T>>, Error> {
        Err(Error::Unimplemented)
    }

    fn check(&self) -> Result<(), Error> {
        Err(Error::Unimplemented)
    }

    fn log_stats(&self, log: &Logger) {
        slog::warn!(log, "stats requested on unimplemented tree container");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::MatchFlags;

    #[test]
    fn tree_container_reports_unimplemented() {
        let tree: TreeContainer<u32> = TreeContainer::new();
        assert!(matches!(tree.count(), Err(Error::Unimplemented)));
        assert!(matches!(tree.check(), Err(Error::Unimplemented)));
        let mut matcher = |_: &u32| MatchFlags::empty();
        assert!(matches!(
            tree.traverse(Order::Ascending, SearchFlags::empty(), &mut matcher),
            Err(Error::Unimplemented)
        ));
    }
}
