//! A reference-counted object and container runtime.
//!
//! An object [`Handle`](header::Handle) pairs a payload with a header
//! carrying a refcount, an optional destructor, and an optional embedded
//! lock. Handles are linked into a [`Container`](container::Container) — in
//! practice a [`HashContainer`](hash::HashContainer), a hash-bucket table
//! that degenerates into a single ordered list when no hash function is
//! given — and looked up, traversed, or unlinked by a caller-supplied
//! matcher. A [`GlobalHolder`](holder::GlobalHolder) gives callers a single
//! process-wide reference slot for the common singleton case.
//!
//! Every operation that can fail returns [`Error`]; operations that can
//! legitimately come up empty (`Find`, `Unlink`) return `Option` instead.

#[macro_use]
extern crate quick_error;

pub mod container;
pub mod error;
pub mod flags;
pub mod hash;
pub mod header;
pub mod holder;
pub mod iterator;
mod lock;
mod node;
pub mod settings;
#[cfg(feature = "stats")]
pub mod stats;

pub use container::{Container, TreeContainer};
pub use error::Error;
pub use flags::{
    DuplicatePolicy, InsertEnd, IteratorFlags, LinkFlags, LockKind, LockMode, MatchFlags, Order,
    RawOptions, SearchFlags,
};
pub use hash::HashContainer;
pub use header::Handle;
pub use holder::GlobalHolder;
pub use iterator::Iterator;
