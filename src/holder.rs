//! The global holder: a single nullable owning reference behind a read/write
//! lock, for the common pattern of one process-wide handle to a long-lived
//! object (a default logger, a singleton configuration object, and the
//! like).

use parking_lot::RwLock;

use crate::header::Handle;

/// A single nullable, reference-counted slot.
///
/// Readers (`get`) take a shared lock and clone out a new reference;
/// writers (`replace`/`release`) take an exclusive lock.
pub struct GlobalHolder<T> {
    slot: RwLock<Option<Handle<T>>>,
}

impl<T> GlobalHolder<T> {
    /// An empty holder.
    pub const fn new() -> GlobalHolder<T> {
        GlobalHolder {
            slot: RwLock::new(None),
        }
    }

    /// `Get`: clone out the currently held reference, if any.
    pub fn get(&self) -> Option<Handle<T>> {
        self.slot.read().clone()
    }

    /// `Replace`: install `new`, returning whatever was previously held
    /// without dropping it.
    pub fn replace(&self, new: Option<Handle<T>>) -> Option<Handle<T>> {
        std::mem::replace(&mut *self.slot.write(), new)
    }

    /// `ReplaceAndUnref`: install `new`, dropping whatever was previously
    /// held. Returns `true` if a prior value existed, `false` otherwise.
    pub fn replace_and_unref(&self, new: Option<Handle<T>>) -> bool {
        std::mem::replace(&mut *self.slot.write(), new).is_some()
    }

    /// `Release`: clear the slot, dropping the reference it held, if any.
    pub fn release(&self) {
        self.replace_and_unref(None);
    }

    /// Is the slot currently occupied?
    pub fn is_some(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<T> Default for GlobalHolder<T> {
    fn default() -> Self {
        GlobalHolder::new()
    }
}
