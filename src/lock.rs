//! The lock adapter: a uniform acquire/release/try/adjust interface over
//! {none, mutex, rwlock}, built on `parking_lot` the way `chashmap` builds its
//! bucket locks on it.
//!
//! The cornerstone operation is [`LockAdapter::adjust`], which lets a caller
//! already holding the lock at one level swap to another level (typically
//! read → write, for the node destructor's upgrade-on-last-drop case) without
//! the caller having to know whether the underlying variant even has more than
//! one level.

use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};

use crate::flags::{LockKind, LockMode};

/// The lock embedded in an object header.
pub(crate) enum LockAdapter {
    None,
    Mutex(Mutex<()>),
    RwLock(RwLock<()>),
}

/// A held lock, returned by [`LockAdapter::lock`]/[`LockAdapter::try_lock`] and
/// consumed by [`LockAdapter::adjust`]/`drop`.
///
/// `'a` ties the guard to the adapter it came from, the same way a
/// `parking_lot` guard ties itself to the lock it guards.
pub(crate) enum Held<'a> {
    /// No lock is embedded; holding "nothing" is always valid.
    None,
    /// A mutex is held. Mutex acquisition is reported as `LockMode::Write`
    /// throughout this crate ("mutex-compatible = write", per the external
    /// contract), since a mutex has no weaker mode.
    Mutex(parking_lot::MutexGuard<'a, ()>),
    Read(parking_lot::RwLockReadGuard<'a, ()>),
    Write(parking_lot::RwLockWriteGuard<'a, ()>),
}

impl<'a> Held<'a> {
    pub(crate) fn mode(&self) -> LockMode {
        match self {
            Held::None | Held::Mutex(_) | Held::Write(_) => LockMode::Write,
            Held::Read(_) => LockMode::Read,
        }
    }
}

impl LockAdapter {
    pub(crate) fn new(kind: LockKind) -> LockAdapter {
        match kind {
            LockKind::None => LockAdapter::None,
            LockKind::Mutex => LockAdapter::Mutex(Mutex::new(())),
            LockKind::RwLock => LockAdapter::RwLock(RwLock::new(())),
        }
    }

    pub(crate) fn kind(&self) -> LockKind {
        match self {
            LockAdapter::None => LockKind::None,
            LockAdapter::Mutex(_) => LockKind::Mutex,
            LockAdapter::RwLock(_) => LockKind::RwLock,
        }
    }

    /// Acquire the lock at the requested mode, blocking if necessary.
    ///
    /// For `LockKind::None`, every acquisition trivially succeeds and the
    /// returned guard carries no real lock: mutex and no-lock both count as
    /// the stronger mode, since neither has a weaker one.
    pub(crate) fn lock(&self, mode: LockMode) -> Held<'_> {
        match self {
            LockAdapter::None => Held::None,
            LockAdapter::Mutex(m) => Held::Mutex(m.lock()),
            LockAdapter::RwLock(rw) => match mode {
                LockMode::Read => Held::Read(rw.read()),
                LockMode::Write => Held::Write(rw.write()),
            },
        }
    }

    /// Non-blocking acquisition; returns `None` on contention.
    pub(crate) fn try_lock(&self, mode: LockMode) -> Option<Held<'_>> {
        match self {
            LockAdapter::None => Some(Held::None),
            LockAdapter::Mutex(m) => m.try_lock().map(Held::Mutex),
            LockAdapter::RwLock(rw) => match mode {
                LockMode::Read => rw.try_read().map(Held::Read),
                LockMode::Write => rw.try_write().map(Held::Write),
            },
        }
    }

    /// `AdjustLock`: given a currently-held guard, swap to `desired`, unless
    /// `keep_stronger` is set and the currently-held mode is already the
    /// stronger one (write).
    ///
    /// Returns the new guard and the mode that was held on entry (the
    /// "original level" the caller restores afterwards).
    ///
    /// For `LockKind::None` and `LockKind::Mutex`, this is a no-op: there is
    /// only one real level, reported as `LockMode::Write`, exactly as the
    /// external contract specifies.
    ///
    /// Ordering note: when a swap does occur, the lock is released and
    /// re-acquired — no atomicity is guaranteed across the gap. Callers must
    /// re-validate any state (e.g. node payload nullness) they depended on
    /// before the swap.
    pub(crate) fn adjust<'a>(
        &'a self,
        held: Held<'a>,
        desired: LockMode,
        keep_stronger: bool,
    ) -> (Held<'a>, LockMode) {
        let original = held.mode();

        if keep_stronger && original == LockMode::Write {
            return (held, original);
        }
        if original == desired {
            return (held, original);
        }

        match self {
            LockAdapter::None | LockAdapter::Mutex(_) => (held, original),
            LockAdapter::RwLock(rw) => {
                drop(held);
                let new_held = match desired {
                    LockMode::Read => Held::Read(rw.read()),
                    LockMode::Write => Held::Write(rw.write()),
                };
                (new_held, original)
            }
        }
    }

    /// Upgradable-read based adjustment used by the node destructor: start
    /// read, end write, without ever dropping protection against a third
    /// party observing an unlocked gap on a plain read→write swap.
    ///
    /// Returns `None` for `LockKind::None`/`LockKind::Mutex`, where no
    /// upgrade step is meaningful (the caller already holds the strongest
    /// available mode).
    pub(crate) fn upgrade_from_read<'a>(
        &'a self,
        guard: RwLockUpgradableReadGuard<'a, ()>,
    ) -> parking_lot::RwLockWriteGuard<'a, ()> {
        RwLockUpgradableReadGuard::upgrade(guard)
    }

    /// Acquire an upgradable read guard, for call sites that know they may
    /// need to upgrade to write later (the node destructor's entry point).
    pub(crate) fn upgradable_read(&self) -> Option<RwLockUpgradableReadGuard<'_, ()>> {
        match self {
            LockAdapter::RwLock(rw) => Some(rw.upgradable_read()),
            LockAdapter::None | LockAdapter::Mutex(_) => None,
        }
    }

    /// The raw address of the embedded mutex, if this is the mutex variant.
    ///
    /// Mirrors `GetLockAddress`: used by callers that need to coordinate with
    /// an external condition-variable-style wait alongside this lock.
    pub(crate) fn mutex_address(&self) -> Option<*const ()> {
        match self {
            LockAdapter::Mutex(m) => Some(m as *const Mutex<()> as *const ()),
            LockAdapter::None | LockAdapter::RwLock(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_always_succeeds() {
        let lock = LockAdapter::new(LockKind::None);
        let held = lock.lock(LockMode::Write);
        assert_eq!(held.mode(), LockMode::Write);
    }

    #[test]
    fn mutex_reports_write() {
        let lock = LockAdapter::new(LockKind::Mutex);
        let held = lock.lock(LockMode::Read);
        assert_eq!(held.mode(), LockMode::Write);
        assert!(lock.try_lock(LockMode::Write).is_none());
    }

    #[test]
    fn rwlock_adjust_swaps_mode() {
        let lock = LockAdapter::new(LockKind::RwLock);
        let held = lock.lock(LockMode::Read);
        let (held, original) = lock.adjust(held, LockMode::Write, false);
        assert_eq!(original, LockMode::Read);
        assert_eq!(held.mode(), LockMode::Write);
    }

    #[test]
    fn rwlock_adjust_keeps_stronger() {
        let lock = LockAdapter::new(LockKind::RwLock);
        let held = lock.lock(LockMode::Write);
        let (held, original) = lock.adjust(held, LockMode::Read, true);
        assert_eq!(original, LockMode::Write);
        assert_eq!(held.mode(), LockMode::Write);
    }

    #[test]
    fn mutex_address_only_for_mutex() {
        assert!(LockAdapter::new(LockKind::None).mutex_address().is_none());
        assert!(LockAdapter::new(LockKind::RwLock).mutex_address().is_none());
        assert!(LockAdapter::new(LockKind::Mutex).mutex_address().is_some());
    }
}
