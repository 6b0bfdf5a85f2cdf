//! The hash-bucket container.
//!
//! Grounded on `chashmap::Table`: a fixed array of buckets, each a plain
//! collection of entries, picked by a hash mod the bucket count. The
//! difference from `chashmap` is the locking granularity — `chashmap` gives
//! every bucket its own lock so independent buckets can be mutated
//! concurrently; this container instead has exactly one internal lock for
//! the whole table; see the "Representation" note below for why that's the
//! right call here.
//!
//! When no hash function is supplied at construction, every entry lands in
//! bucket zero regardless of the configured bucket count — the container
//! degenerates into a single ordered list, exactly as spec'd.
//!
//! # Representation
//!
//! Buckets are `Vec<Arc<Node<T>>>` rather than an intrusive doubly linked
//! list. `chashmap`'s per-bucket `Bucket<K, V>` enum needs a real linked
//! structure because its buckets are linear-probed slots; this container's
//! buckets are never linear-probed (collisions simply grow the bucket's
//! `Vec`), so there is nothing an intrusive list would buy that `Vec` +
//! `Arc` identity doesn't already give, and the single table-wide lock makes
//! lock-free bucket manipulation unnecessary in the first place.
//!
//! `SearchFlags::NO_LOCK` / `LinkFlags::NO_LOCK` are accepted for contract
//! parity but currently treated as equivalent to ordinary locking: this
//! container does not expose its internal table lock to callers the way the
//! original external contract's explicit lock/unlock pair would, so there is
//! no separate "already locked" state for these flags to opt out of. See
//! DESIGN.md.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;
use slog::{debug, trace, warn, Logger};

use crate::container::Container;
use crate::error::Error;
use crate::flags::{DuplicatePolicy, InsertEnd, LinkFlags, MatchFlags, Order, SearchFlags};
use crate::header::Handle;
use crate::node::Node;

type HashFn<T> = fn(&T) -> u64;
type SortFn<T> = fn(&T, &T) -> CmpOrdering;

pub struct HashContainer<T> {
    buckets: RwLock<Vec<Vec<Arc<Node<T>>>>>,
    hash_fn: Option<HashFn<T>>,
    sort_fn: Option<SortFn<T>>,
    duplicate_policy: DuplicatePolicy,
    insert_end: InsertEnd,
    count: AtomicUsize,
    log: Logger,
}

impl<T> HashContainer<T> {
    /// `Create`. A `bucket_count` of `0` is a "pick one for me" sentinel,
    /// resolved via [`crate::settings::get`]'s
    /// [`Settings::bucket_count_for`](crate::settings::Settings::bucket_count_for)
    /// for the given `duplicate_policy`; any other value is clamped to at
    /// least 1. With `hash_fn == None` the container behaves as a
    /// single-bucket ordered list no matter what `bucket_count` is given.
    pub fn new(
        bucket_count: usize,
        hash_fn: Option<HashFn<T>>,
        sort_fn: Option<SortFn<T>>,
        duplicate_policy: DuplicatePolicy,
        insert_end: InsertEnd,
        log: Logger,
    ) -> HashContainer<T> {
        let requested = if bucket_count == 0 {
            crate::settings::get().bucket_count_for(duplicate_policy)
        } else {
            bucket_count
        };
        let effective_buckets = if hash_fn.is_some() { requested.max(1) } else { 1 };
        HashContainer {
            buckets: RwLock::new((0..effective_buckets).map(|_| Vec::new()).collect()),
            hash_fn,
            sort_fn,
            duplicate_policy,
            insert_end,
            count: AtomicUsize::new(0),
            log,
        }
    }

    /// `AllocateListContainer`: delegates to [`HashContainer::new`] with
    /// `hash_fn = None`, so every element lands in the single bucket
    /// regardless of `bucket_count` — an ordered list, sorted by `sort_fn`
    /// if given.
    pub fn new_list(
        sort_fn: Option<SortFn<T>>,
        duplicate_policy: DuplicatePolicy,
        insert_end: InsertEnd,
        log: Logger,
    ) -> HashContainer<T> {
        HashContainer::new(1, None, sort_fn, duplicate_policy, insert_end, log)
    }

    /// `Create`, taking the raw allocation-style options byte a foreign
    /// caller would pass (lock kind + duplicate policy + insertion end
    /// packed together, see [`crate::flags::RawOptions`]).
    ///
    /// The decoded lock kind is logged but does not change this container's
    /// internal synchronization: the table is always guarded by a real
    /// `RwLock` regardless of what a caller requests, since `None`/`Mutex`
    /// would otherwise require unsafe interior mutability this crate has no
    /// need to take on. See DESIGN.md.
    pub fn create(
        bucket_count: usize,
        hash_fn: Option<HashFn<T>>,
        sort_fn: Option<SortFn<T>>,
        options: crate::flags::RawOptions,
        log: Logger,
    ) -> Result<HashContainer<T>, Error> {
        let (lock_kind, duplicate_policy, insert_end) = match options.decode() {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(log, "create rejected: invalid options"; "error" => %err);
                return Err(err);
            }
        };
        trace!(log, "creating container"; "lock_kind" => ?lock_kind, "buckets" => bucket_count);
        Ok(HashContainer::new(
            bucket_count,
            hash_fn,
            sort_fn,
            duplicate_policy,
            insert_end,
            log,
        ))
    }

    fn bucket_index(&self, hash: u64, bucket_count: usize) -> usize {
        match self.hash_fn {
            Some(_) => (hash % bucket_count as u64) as usize,
            None => 0,
        }
    }

    fn hash_of(&self, payload: &T) -> u64 {
        self.hash_fn.map_or(0, |f| f(payload))
    }

    /// Remove tombstoned nodes that are no longer pinned by any external
    /// `Arc` clone (i.e. `Arc::strong_count(node) == 1`, meaning only the
    /// bucket `Vec` itself still references it). Called opportunistically
    /// after writes; not required for correctness, only for not leaking
    /// bucket slots to dead tombstones forever.
    fn sweep_bucket(bucket: &mut Vec<Arc<Node<T>>>) {
        bucket.retain(|node| !(node.is_tombstone() && Arc::strong_count(node) == 1));
    }

    /// `Dup`: link a clone of every live element of `self` into `dst`.
    ///
    /// Transactional per spec.md §4.4/§8: if any element fails to link (a
    /// duplicate rejected under `dst`'s policy, most commonly), every element
    /// already linked into `dst` by this call is removed again before the
    /// error is returned, so `dst` ends up either fully populated or
    /// untouched.
    ///
    /// An inherent method rather than a `Container<T>` trait method: the
    /// rollback needs to remove exactly the nodes this call inserted by
    /// identity, which requires direct access to `dst`'s nodes that the
    /// object-safe `traverse` matcher (`&T`, not the wrapping `Handle<T>`)
    /// deliberately doesn't expose (see the `SearchFlags::POINTER` note in
    /// `container.rs`).
    pub fn dup(&self, dst: &HashContainer<T>) -> Result<(), Error> {
        let elements: Vec<Handle<T>> = {
            let src_buckets = self.buckets.read();
            src_buckets
                .iter()
                .flat_map(|bucket| bucket.iter())
                .filter_map(|node| node.peek())
                .collect()
        };

        let mut linked_identities = Vec::with_capacity(elements.len());
        for handle in elements {
            let identity = handle.identity();
            match dst.link(handle, LinkFlags::empty()) {
                Ok(()) => linked_identities.push(identity),
                Err(e) => {
                    warn!(dst.log, "dup failed partway through; rolling back";
                          "linked_so_far" => linked_identities.len());
                    dst.remove_by_identity(&linked_identities);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// `Clone`: allocate an empty container with the same option flags,
    /// hash/sort functions, and bucket count as `self`, then `Dup` into it.
    pub fn clone_container(&self, log: Logger) -> Result<HashContainer<T>, Error> {
        let bucket_count = self.buckets.read().len();
        let fresh = HashContainer::new(
            bucket_count,
            self.hash_fn,
            self.sort_fn,
            self.duplicate_policy,
            self.insert_end,
            log,
        );
        self.dup(&fresh)?;
        Ok(fresh)
    }

    /// Remove every node whose live handle identity appears in `identities`,
    /// tombstoning it and dropping the container's reference. Used only by
    /// `dup`'s rollback path.
    fn remove_by_identity(&self, identities: &[usize]) {
        let mut buckets = self.buckets.write();
        for bucket in buckets.iter_mut() {
            bucket.retain(|node| match node.peek() {
                Some(handle) if identities.contains(&handle.identity()) => {
                    node.unlink();
                    self.count.fetch_sub(1, AtomicOrdering::SeqCst);
                    false
                }
                _ => true,
            });
        }
    }
}

impl<T> Container<T> for HashContainer<T> {
    fn count(&self) -> Result<usize, Error> {
        Ok(self.count.load(AtomicOrdering::SeqCst))
    }

    fn link(&self, handle: Handle<T>, _flags: LinkFlags) -> Result<(), Error> {
        let hash = self.hash_of(&handle);
        let mut buckets = self.buckets.write();
        let count = buckets.len();
        let index = self.bucket_index(hash, count);
        let bucket = &mut buckets[index];

        if self.duplicate_policy != DuplicatePolicy::Allow {
            let mut replace_index = None;
            for (i, node) in bucket.iter().enumerate() {
                let existing = match node.peek() {
                    Some(h) => h,
                    None => continue,
                };
                let same_object = existing.identity() == handle.identity();
                let same_key = self
                    .sort_fn
                    .map(|cmp| cmp(&existing, &handle) == CmpOrdering::Equal)
                    .unwrap_or(false);

                match self.duplicate_policy {
                    DuplicatePolicy::RejectKey if same_key => {
                        match crate::settings::get().rejection_log_level {
                            crate::settings::RejectionLogLevel::Debug => {
                                debug!(self.log, "link rejected: duplicate key"; "hash" => hash);
                            }
                            crate::settings::RejectionLogLevel::Warn => {
                                warn!(self.log, "link rejected: duplicate key"; "hash" => hash);
                            }
                        }
                        return Err(Error::DuplicateRejected);
                    }
                    DuplicatePolicy::RejectSameObject if same_object => {
                        debug!(self.log, "link rejected: same object already linked");
                        return Err(Error::DuplicateRejected);
                    }
                    DuplicatePolicy::Replace if same_key => {
                        replace_index = Some(i);
                        break;
                    }
                    _ => {}
                }
            }

            if let Some(i) = replace_index {
                let old = bucket[i].unlink();
                drop(old);
                bucket.remove(i);
                self.count.fetch_sub(1, AtomicOrdering::SeqCst);
            }
        }

        let node = Arc::new(Node::occupied(handle, hash));
        match (self.insert_end, self.sort_fn) {
            (_, None) => match self.insert_end {
                InsertEnd::Head => bucket.insert(0, node),
                InsertEnd::Tail => bucket.push(node),
            },
            (InsertEnd::Tail, Some(cmp)) => {
                // Scan head-to-tail for the first entry the new node sorts
                // before.
                let pos = bucket
                    .iter()
                    .position(|existing| {
                        existing
                            .peek()
                            .map(|h| cmp(&node.peek().unwrap(), &h) == CmpOrdering::Less)
                            .unwrap_or(false)
                    })
                    .unwrap_or(bucket.len());
                bucket.insert(pos, node);
            }
            (InsertEnd::Head, Some(cmp)) => {
                // Scan tail-to-head (mirrored) for the first entry the new
                // node does not sort before.
                let pos = bucket
                    .iter()
                    .rposition(|existing| {
                        existing
                            .peek()
                            .map(|h| cmp(&node.peek().unwrap(), &h) != CmpOrdering::Less)
                            .unwrap_or(false)
                    })
                    .map(|p| p + 1)
                    .unwrap_or(0);
                bucket.insert(pos, node);
            }
        }

        self.count.fetch_add(1, AtomicOrdering::SeqCst);
        trace!(self.log, "linked object"; "hash" => hash, "bucket" => index);
        Ok(())
    }

    fn traverse(
        &self,
        order: Order,
        flags: SearchFlags,
        matcher: &mut dyn FnMut(&T) -> MatchFlags,
    ) -> Result<Vec<Handle<T>>, Error> {
        let unlinking = flags.contains(SearchFlags::UNLINK);
        let multiple = flags.contains(SearchFlags::MULTIPLE);
        let mut results = Vec::new();

        let mut buckets = if unlinking {
            None
        } else {
            Some(self.buckets.read())
        };
        let mut write_buckets = if unlinking {
            Some(self.buckets.write())
        } else {
            None
        };

        let bucket_count = buckets
            .as_ref()
            .map(|b| b.len())
            .or_else(|| write_buckets.as_ref().map(|b| b.len()))
            .unwrap_or(0);
        let bucket_indices: Box<dyn Iterator<Item = usize>> = if order.is_descending() {
            Box::new((0..bucket_count).rev())
        } else {
            Box::new(0..bucket_count)
        };

        'outer: for bucket_idx in bucket_indices {
            let nodes: Vec<Arc<Node<T>>> = if let Some(b) = &buckets {
                b[bucket_idx].clone()
            } else if let Some(b) = &write_buckets {
                b[bucket_idx].clone()
            } else {
                unreachable!()
            };

            let node_iter: Box<dyn Iterator<Item = &Arc<Node<T>>>> = if order.is_descending() {
                Box::new(nodes.iter().rev())
            } else {
                Box::new(nodes.iter())
            };

            for node in node_iter {
                let outcome = node.with_payload(|payload| matcher(payload));
                let flags_result = match outcome {
                    Some(f) => f,
                    None => continue,
                };

                if flags_result.contains(MatchFlags::MATCH) {
                    if unlinking {
                        if let Some(handle) = node.unlink() {
                            self.count.fetch_sub(1, AtomicOrdering::SeqCst);
                            results.push(handle);
                        }
                    } else if let Some(handle) = node.peek() {
                        results.push(handle);
                    }

                    if !multiple {
                        break 'outer;
                    }
                }

                if flags_result.contains(MatchFlags::STOP) {
                    break 'outer;
                }
            }
        }

        drop(buckets);
        if let Some(mut b) = write_buckets.take() {
            for bucket in b.iter_mut() {
                Self::sweep_bucket(bucket);
            }
        }

        Ok(results)
    }

    fn check(&self) -> Result<(), Error> {
        let buckets = self.buckets.read();
        if let Some(cmp) = self.sort_fn {
            for bucket in buckets.iter() {
                let mut last: Option<Arc<Node<T>>> = None;
                for node in bucket.iter() {
                    if node.is_tombstone() {
                        continue;
                    }
                    if let (Some(prev), Some(cur)) = (&last, node.peek()) {
                        if let Some(prev_val) = prev.peek() {
                            let ordering = cmp(&prev_val, &cur);
                            let sorted_ok = match self.insert_end {
                                InsertEnd::Tail => ordering != CmpOrdering::Greater,
                                InsertEnd::Head => ordering != CmpOrdering::Less,
                            };
                            if !sorted_ok {
                                warn!(self.log, "container check failed: out-of-order bucket");
                                return Err(Error::Inconsistent(
                                    "bucket not sorted per configured insertion end".into(),
                                ));
                            }
                        }
                    }
                    last = Some(node.clone());
                }
            }
        }
        Ok(())
    }

    fn log_stats(&self, log: &Logger) {
        let buckets = self.buckets.read();
        if cfg!(feature = "devmode") {
            let warn_threshold = crate::settings::get().devmode_occupancy_warn_threshold;
            for (i, bucket) in buckets.iter().enumerate() {
                if bucket.len() >= warn_threshold {
                    warn!(log, "bucket occupancy above threshold"; "bucket" => i, "entries" => bucket.len(), "threshold" => warn_threshold);
                } else {
                    debug!(log, "bucket occupancy"; "bucket" => i, "entries" => bucket.len());
                }
            }
        }
        debug!(log, "container stats"; "count" => self.count.load(AtomicOrdering::SeqCst));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::LockKind;
    use slog::Discard;

    fn test_logger() -> Logger {
        Logger::root(Discard, slog::o!())
    }

    fn sort_i32(a: &i32, b: &i32) -> CmpOrdering {
        a.cmp(b)
    }

    fn hash_i32(v: &i32) -> u64 {
        *v as u64
    }

    #[test]
    fn link_and_count() {
        let c = HashContainer::new(
            4,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        c.link(Handle::allocate(1, None, LockKind::None), LinkFlags::empty())
            .unwrap();
        c.link(Handle::allocate(2, None, LockKind::None), LinkFlags::empty())
            .unwrap();
        assert_eq!(c.count().unwrap(), 2);
    }

    #[test]
    fn reject_key_rejects_duplicate() {
        let c = HashContainer::new(
            1,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::RejectKey,
            InsertEnd::Tail,
            test_logger(),
        );
        c.link(Handle::allocate(5, None, LockKind::None), LinkFlags::empty())
            .unwrap();
        let result = c.link(Handle::allocate(5, None, LockKind::None), LinkFlags::empty());
        assert!(matches!(result, Err(Error::DuplicateRejected)));
        assert_eq!(c.count().unwrap(), 1);
    }

    #[test]
    fn replace_swaps_existing_entry() {
        let c = HashContainer::new(
            1,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Replace,
            InsertEnd::Tail,
            test_logger(),
        );
        c.link(Handle::allocate(5, None, LockKind::None), LinkFlags::empty())
            .unwrap();
        c.link(Handle::allocate(5, None, LockKind::None), LinkFlags::empty())
            .unwrap();
        assert_eq!(c.count().unwrap(), 1);
    }

    #[test]
    fn find_locates_matching_element() {
        let c = HashContainer::new(
            4,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        c.link(Handle::allocate(10, None, LockKind::None), LinkFlags::empty())
            .unwrap();
        c.link(Handle::allocate(20, None, LockKind::None), LinkFlags::empty())
            .unwrap();

        let found = c
            .find_one(Order::Ascending, SearchFlags::KEY, &mut |v: &i32| {
                if *v == 20 {
                    MatchFlags::MATCH
                } else {
                    MatchFlags::empty()
                }
            })
            .unwrap();
        assert_eq!(*found.unwrap(), 20);
    }

    #[test]
    fn unlink_removes_and_decrements_count() {
        let c = HashContainer::new(
            1,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        c.link(Handle::allocate(1, None, LockKind::None), LinkFlags::empty())
            .unwrap();

        let unlinked = c
            .traverse(
                Order::Ascending,
                SearchFlags::UNLINK,
                &mut |v: &i32| {
                    if *v == 1 {
                        MatchFlags::MATCH
                    } else {
                        MatchFlags::empty()
                    }
                },
            )
            .unwrap();
        assert_eq!(unlinked.len(), 1);
        assert_eq!(c.count().unwrap(), 0);
    }

    #[test]
    fn new_list_is_a_single_bucket_ordered_list() {
        let c: HashContainer<i32> = HashContainer::new_list(
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        assert_eq!(c.buckets.read().len(), 1);
        for v in [3, 1, 2] {
            c.link(Handle::allocate(v, None, LockKind::None), LinkFlags::empty())
                .unwrap();
        }
        let all = c
            .traverse(Order::Ascending, SearchFlags::MULTIPLE, &mut |_| MatchFlags::MATCH)
            .unwrap();
        let values: Vec<i32> = all.iter().map(|h| **h).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn no_hash_fn_degenerates_to_single_bucket() {
        let c: HashContainer<i32> = HashContainer::new(
            16,
            None,
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        assert_eq!(c.buckets.read().len(), 1);
    }

    #[test]
    fn create_decodes_raw_options() {
        use crate::flags::RawOptions;
        // Mutex lock kind (01), RejectKey policy (01 << 2), tail insertion (bit 4).
        let options = RawOptions(0b0001_0101);
        let c: HashContainer<i32> =
            HashContainer::create(4, Some(hash_i32), Some(sort_i32), options, test_logger())
                .unwrap();
        assert_eq!(c.duplicate_policy, DuplicatePolicy::RejectKey);
        assert_eq!(c.insert_end, InsertEnd::Tail);
    }

    #[test]
    fn create_rejects_unknown_option_bits() {
        use crate::flags::RawOptions;
        let result: Result<HashContainer<i32>, Error> =
            HashContainer::create(4, None, None, RawOptions(0b1000_0000), test_logger());
        assert!(matches!(result, Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn multiple_flag_collects_every_match() {
        let c = HashContainer::new(
            1,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        for v in [1, 2, 1, 3] {
            c.link(Handle::allocate(v, None, LockKind::None), LinkFlags::empty())
                .unwrap();
        }

        let matches = c
            .traverse(Order::Ascending, SearchFlags::MULTIPLE, &mut |v: &i32| {
                if *v == 1 {
                    MatchFlags::MATCH
                } else {
                    MatchFlags::empty()
                }
            })
            .unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn clone_has_equal_count_and_same_object_pointers() {
        let c = HashContainer::new(
            4,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        for v in [1, 2, 3] {
            c.link(Handle::allocate(v, None, LockKind::None), LinkFlags::empty())
                .unwrap();
        }

        let cloned = c.clone_container(test_logger()).unwrap();
        assert_eq!(cloned.count().unwrap(), c.count().unwrap());

        let original: Vec<Handle<i32>> = c
            .traverse(Order::Ascending, SearchFlags::MULTIPLE, &mut |_| MatchFlags::MATCH)
            .unwrap();
        let mut original_identities: Vec<usize> = original.iter().map(|h| h.identity()).collect();
        let cloned_elements: Vec<Handle<i32>> = cloned
            .traverse(Order::Ascending, SearchFlags::MULTIPLE, &mut |_| MatchFlags::MATCH)
            .unwrap();
        let mut cloned_identities: Vec<usize> = cloned_elements.iter().map(|h| h.identity()).collect();
        original_identities.sort_unstable();
        cloned_identities.sort_unstable();
        assert_eq!(original_identities, cloned_identities);
    }

    #[test]
    fn unlink_object_removes_by_pointer_identity() {
        let c = HashContainer::new(
            4,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        let target = Handle::allocate(5, None, LockKind::None);
        c.link(target.clone(), LinkFlags::empty()).unwrap();
        c.link(Handle::allocate(5, None, LockKind::None), LinkFlags::empty())
            .unwrap();
        assert_eq!(c.count().unwrap(), 2);

        let removed = c.unlink_object(&target).unwrap();
        assert_eq!(removed.unwrap().identity(), target.identity());
        assert_eq!(c.count().unwrap(), 1);

        // The second, distinct `5` is still present.
        assert!(c.unlink_object(&target).unwrap().is_none());
    }

    #[test]
    fn dup_rolls_back_on_partial_failure() {
        let src = HashContainer::new(
            1,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::Allow,
            InsertEnd::Tail,
            test_logger(),
        );
        for v in [1, 2, 3] {
            src.link(Handle::allocate(v, None, LockKind::None), LinkFlags::empty())
                .unwrap();
        }

        let dst = HashContainer::new(
            1,
            Some(hash_i32),
            Some(sort_i32),
            DuplicatePolicy::RejectKey,
            InsertEnd::Tail,
            test_logger(),
        );
        // Pre-populate `dst` with an entry that collides with one of `src`'s
        // keys, so `dup` fails partway through.
        dst.link(Handle::allocate(2, None, LockKind::None), LinkFlags::empty())
            .unwrap();

        let result = src.dup(&dst);
        assert!(result.is_err());
        // Only the pre-existing entry remains; the partial dup was rolled back.
        assert_eq!(dst.count().unwrap(), 1);
    }
}
