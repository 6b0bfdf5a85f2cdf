//! Crate-wide error type.
//!
//! Every public operation that can fail returns `Result<_, Error>` (or, where the
//! contract explicitly calls for a null/zero return on a non-exceptional empty
//! result — `Unlink`, `Find`, rejected duplicates — `Option<_>`/`bool` instead).

quick_error! {
    /// A `refcont` error.
    ///
    /// Every variant corresponds to one of the error kinds described in the
    /// runtime's error handling design. Construction of any variant is expected
    /// to be paired with a single `slog` log line at the call site — the error
    /// itself only carries enough to format a message, not to log one, since it
    /// has no logger of its own.
    #[derive(Debug)]
    pub enum Error {
        /// A handle failed magic validation, or was null where a non-null handle
        /// was required.
        InvalidHandle {
            display("invalid handle: bad magic or unexpected null")
        }
        /// A lock selector, duplicate policy, or other option bit pattern was out
        /// of range at allocation time.
        InvalidOptions(desc: String) {
            display("invalid options: {}", desc)
        }
        /// The underlying allocator failed to produce a new object.
        AllocationFailure {
            display("allocation failure")
        }
        /// A writer lock could not be acquired on the global holder (e.g. the
        /// lock itself has been poisoned or destroyed).
        LockAcquisitionFailure {
            display("failed to acquire lock")
        }
        /// `Link` rejected the object under the container's duplicate policy.
        DuplicateRejected {
            display("link rejected: duplicate key under the container's duplicate policy")
        }
        /// Operation not supported by this container variant.
        ///
        /// Returned by every method of the red-black-tree placeholder container,
        /// which exists to reserve the name and shape of a future variant without
        /// implementing one.
        Unimplemented {
            display("operation not implemented for this container variant")
        }
        /// A container's structural self-check (`Container::check`) found a
        /// violated invariant, e.g. a bucket out of the configured sort order.
        Inconsistent(desc: String) {
            display("container consistency check failed: {}", desc)
        }
    }
}
