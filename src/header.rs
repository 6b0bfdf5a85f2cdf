//! The object header and allocator/destructor pipeline.
//!
//! `Handle<T>` is this crate's realization of the spec's "object handle": a
//! smart pointer to a payload with a fixed header immediately preceding it —
//! reference count, destructor, and embedded lock, validated by a magic
//! constant on every entry point. Ordinary use goes through `Clone`/`Drop`,
//! which is Rust's native expression of "every producer increments, every
//! consumer decrements." The raw, delta-accepting `ref_delta`/`cleanup`/
//! `get_lock_address` functions exist for parity with the external contract
//! surface (what a foreign caller holding only a raw pointer would call) and
//! stay `unsafe`, since they bypass the ownership tracking `Handle<T>`
//! otherwise gives for free — the same trade-off `conc::add_garbage` makes by
//! taking a raw pointer and a `fn` destructor instead of an owned box.

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicIsize, AtomicU32, Ordering};

use slog::{error, trace, Logger};

use crate::flags::{LockKind, LockMode};
use crate::lock::{Held, LockAdapter};
use crate::Error;

/// Set exactly once at allocation; cleared (along with the rest of the
/// header and the first payload word) immediately before the block is freed.
const MAGIC: u32 = 0x5EED_C0DE;

struct Header<T> {
    magic: AtomicU32,
    refcount: AtomicIsize,
    destructor: Option<fn(&mut T)>,
    lock: LockAdapter,
}

#[repr(C)]
struct ObjectBox<T> {
    header: Header<T>,
    payload: T,
}

/// A reference-counted handle to a payload of type `T`.
///
/// Cloning increments the embedded reference count; dropping the last clone
/// runs the user destructor (if any), destroys the embedded lock, zeroes the
/// header and the first payload word, and frees the block.
pub struct Handle<T> {
    ptr: NonNull<ObjectBox<T>>,
}

// SAFETY: a `Handle<T>` is only ever shared across threads the way an
// `Arc<T>` is: the refcount is atomic, and the payload is only reachable
// through `&T` once allocated (interior mutability, if any, is `T`'s own
// problem, exactly as with `Arc`).
unsafe impl<T: Send + Sync> Send for Handle<T> {}
unsafe impl<T: Send + Sync> Sync for Handle<T> {}

impl<T> Handle<T> {
    /// `Allocate`: construct a new header+payload block with refcount 1.
    ///
    /// `destructor`, if given, runs exactly once, on the decrement that drops
    /// the count to zero, before the embedded lock is torn down and the
    /// block is freed.
    pub fn allocate(payload: T, destructor: Option<fn(&mut T)>, lock_kind: LockKind) -> Handle<T> {
        match Self::try_allocate(payload, destructor, lock_kind) {
            Ok(handle) => handle,
            Err(_) => alloc::handle_alloc_error(Layout::new::<ObjectBox<T>>()),
        }
    }

    /// The fallible form of `Allocate`: reports `Error::AllocationFailure`
    /// instead of aborting the process when the underlying allocator cannot
    /// satisfy the request.
    ///
    /// Most callers want [`Handle::allocate`] — matching `Box`/`Arc`, this
    /// crate treats allocator exhaustion as unrecoverable by default. This
    /// entry point exists for the external contract surface's explicit
    /// `AllocationFailure` kind, and for callers (e.g. under a bounded
    /// arena) that can meaningfully recover from it.
    pub fn try_allocate(
        payload: T,
        destructor: Option<fn(&mut T)>,
        lock_kind: LockKind,
    ) -> Result<Handle<T>, Error> {
        let layout = Layout::new::<ObjectBox<T>>();
        // SAFETY: `layout` is non-zero-sized (`ObjectBox` always contains at
        // least a `Header`), so `alloc` is safe to call.
        let raw = unsafe { alloc::alloc(layout) } as *mut ObjectBox<T>;
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => return Err(Error::AllocationFailure),
        };

        // SAFETY: `ptr` was just allocated with the right layout and is not
        // yet aliased; these writes initialize it field-by-field.
        unsafe {
            ptr::write(
                &mut (*ptr.as_ptr()).header,
                Header {
                    magic: AtomicU32::new(MAGIC),
                    refcount: AtomicIsize::new(1),
                    destructor,
                    lock: LockAdapter::new(lock_kind),
                },
            );
            ptr::write(&mut (*ptr.as_ptr()).payload, payload);
        }

        Ok(Handle { ptr })
    }

    /// `Allocate`, logging the attempt at `trace!` the way the teacher crate
    /// logs cache/allocator entry points.
    pub fn allocate_logged(
        log: &Logger,
        payload: T,
        destructor: Option<fn(&mut T)>,
        lock_kind: LockKind,
    ) -> Handle<T> {
        trace!(log, "allocating object";
               "size" => std::mem::size_of::<T>(), "lock" => ?lock_kind);
        Self::allocate(payload, destructor, lock_kind)
    }

    /// The fallible, logged form: `trace!`s the attempt and `error!`s a
    /// failure before returning it, instead of aborting.
    pub fn try_allocate_logged(
        log: &Logger,
        payload: T,
        destructor: Option<fn(&mut T)>,
        lock_kind: LockKind,
    ) -> Result<Handle<T>, Error> {
        trace!(log, "allocating object";
               "size" => std::mem::size_of::<T>(), "lock" => ?lock_kind);
        Self::try_allocate(payload, destructor, lock_kind).map_err(|e| {
            error!(log, "allocation failure"; "size" => std::mem::size_of::<T>());
            e
        })
    }

    fn header(&self) -> &Header<T> {
        // SAFETY: as long as a `Handle<T>` exists, its refcount is >= 1 and
        // the block has not been freed.
        unsafe { &self.ptr.as_ref().header }
    }

    /// Current reference count. Racy, like `Container::count` — no lock is
    /// taken.
    pub fn strong_count(&self) -> isize {
        self.header().refcount.load(Ordering::SeqCst)
    }

    pub(crate) fn lock(&self, mode: LockMode) -> Held<'_> {
        self.header().lock.lock(mode)
    }

    pub(crate) fn try_lock(&self, mode: LockMode) -> Option<Held<'_>> {
        self.header().lock.try_lock(mode)
    }

    pub(crate) fn lock_adapter(&self) -> &LockAdapter {
        &self.header().lock
    }

    pub(crate) fn lock_kind(&self) -> LockKind {
        self.header().lock.kind()
    }

    /// `GetLockAddress`: the address of the embedded mutex, if this handle
    /// was allocated with `LockKind::Mutex`; `None` otherwise.
    pub fn lock_address(&self) -> Option<*const ()> {
        self.header().lock.mutex_address()
    }

    /// Identity used for pointer-equality comparisons (`SearchFlags::POINTER`,
    /// `DuplicatePolicy::RejectSameObject`) and for debug/log output.
    pub fn identity(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// `Ref(handle, delta)`: the raw, delta-accepting contract-surface
    /// operation. Returns the count *before* the adjustment.
    ///
    /// # Safety
    ///
    /// The caller is responsible for keeping deltas balanced with reachable
    /// owning copies of this handle — calling this directly sidesteps the
    /// bookkeeping `Clone`/`Drop` otherwise does. A delta of zero is a legal,
    /// side-effect-free read.
    pub unsafe fn ref_delta(&self, delta: isize) -> isize {
        if self.header().magic.load(Ordering::SeqCst) != MAGIC {
            // A corrupted/already-freed handle: report and refuse to touch it.
            eprintln!(
                "refcont: bad magic on handle {:#x}; ref_delta ignored",
                self.identity()
            );
            return 0;
        }

        let prior = self.header().refcount.fetch_add(delta, Ordering::SeqCst);
        let now = prior + delta;

        if now == 0 {
            self.teardown();
        } else if now < 0 {
            // A bug: more decrements than increments. Reported, not panicked.
            eprintln!(
                "refcont: negative refcount ({}) on handle {:#x}; destructor NOT re-run",
                now,
                self.identity()
            );
        }

        prior
    }

    /// Runs the user destructor, destroys the lock, zeroes the header and
    /// the first payload word, and frees the block. Called once, exactly
    /// when the count transitions to zero.
    ///
    /// # Safety
    /// Must only be called when the refcount has just reached zero and no
    /// other `Handle<T>` to this block remains reachable.
    unsafe fn teardown(&self) {
        let ptr = self.ptr.as_ptr();

        if let Some(dtor) = (*ptr).header.destructor {
            dtor(&mut (*ptr).payload);
        }
        ptr::drop_in_place(&mut (*ptr).payload);

        // Invalidate the magic before freeing, so any lingering raw-pointer
        // call (a bug) observes `InvalidHandle` instead of dereferencing
        // freed memory.
        (*ptr).header.magic.store(0, Ordering::SeqCst);
        // Defensively zero the header and the first payload word.
        let header_bytes = std::mem::size_of::<Header<T>>();
        ptr::write_bytes(ptr as *mut u8, 0, header_bytes);
        let word = std::mem::size_of::<usize>().min(std::mem::size_of::<T>());
        ptr::write_bytes((ptr as *mut u8).add(header_bytes), 0, word);

        alloc::dealloc(ptr as *mut u8, Layout::new::<ObjectBox<T>>());
    }

    /// `Cleanup`: a null-safe `Ref(handle, -1)`.
    pub fn cleanup(this: Option<Handle<T>>) {
        // `Handle::drop` already performs exactly this decrement; taking
        // ownership here and letting `drop` run keeps the bookkeeping in one
        // place.
        drop(this);
    }

    /// Convert into a raw pointer to the payload, without decrementing the
    /// refcount — the caller now owns that reference and must eventually
    /// reconstitute it with [`Handle::from_raw`] or balance it with
    /// [`Handle::ref_delta`].
    pub fn into_raw(self) -> *const T {
        let ptr = self.ptr.as_ptr();
        std::mem::forget(self);
        unsafe { &(*ptr).payload as *const T }
    }

    /// Reconstitute a `Handle<T>` from a payload pointer previously produced
    /// by [`Handle::into_raw`].
    ///
    /// # Safety
    /// `payload` must have come from `Handle::into_raw` on a live handle of
    /// the same `T`, and must not be reconstituted more than once per
    /// outstanding reference.
    pub unsafe fn from_raw(payload: *const T) -> Result<Handle<T>, Error> {
        if payload.is_null() {
            return Err(Error::InvalidHandle);
        }
        // SAFETY: `ObjectBox<T>` is `#[repr(C)]` with `header` first, so the
        // payload field's offset from the box start is fixed and recoverable.
        let offset = payload_offset::<T>();
        let box_ptr = (payload as *const u8).sub(offset) as *mut ObjectBox<T>;
        let ptr = match NonNull::new(box_ptr) {
            Some(ptr) => ptr,
            None => return Err(Error::InvalidHandle),
        };
        if (*ptr.as_ptr()).header.magic.load(Ordering::SeqCst) != MAGIC {
            return Err(Error::InvalidHandle);
        }
        Ok(Handle { ptr })
    }
}

/// Offset of the `payload` field within `ObjectBox<T>`, computed without
/// reading through the (dangling but aligned) base pointer.
fn payload_offset<T>() -> usize {
    // SAFETY: no memory is read; this only compares addresses derived from a
    // dangling-but-aligned base pointer, which is legal as long as the
    // derived references are never dereferenced.
    unsafe {
        let base = NonNull::<ObjectBox<T>>::dangling().as_ptr();
        let payload = ptr::addr_of!((*base).payload) as usize;
        payload - base as usize
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Handle<T> {
        self.header().refcount.fetch_add(1, Ordering::SeqCst);
        Handle { ptr: self.ptr }
    }
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        let prior = self.header().refcount.fetch_sub(1, Ordering::SeqCst);
        if prior == 1 {
            // SAFETY: we just observed the last reference drop to zero.
            unsafe { self.teardown() };
        } else if prior <= 0 {
            eprintln!(
                "refcont: negative refcount ({}) on handle {:#x}; destructor NOT re-run",
                prior - 1,
                self.identity()
            );
        }
    }
}

impl<T> std::ops::Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: as long as this `Handle<T>` exists, the payload is valid
        // and initialized.
        unsafe { &self.ptr.as_ref().payload }
    }
}

impl<T: fmt::Debug> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("identity", &format_args!("{:#x}", self.identity()))
            .field("strong_count", &self.strong_count())
            .field("payload", &**self)
            .finish()
    }
}
