//! Settings and presets.
//!
//! Grounded directly on `conc::settings`: thread-local `Settings`, a
//! `Default` impl, a couple of named presets, and plain `get`/`set_local`
//! free functions. What differs is which tunables live here — these are the
//! process-wide knobs that apply across every container rather than being
//! part of any one container's allocation-time options.

use std::cell::Cell;

use crate::flags::DuplicatePolicy;

thread_local! {
    /// The settings for the current thread.
    static LOCAL_SETTINGS: Cell<Settings> = Cell::new(Settings::default())
}

/// How loudly a rejected `Link` under `DuplicatePolicy::RejectKey` gets
/// logged.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RejectionLogLevel {
    Debug,
    Warn,
}

/// Settings for the runtime.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Settings {
    /// The bucket count a `HashContainer` is created with when the caller
    /// does not request a specific one.
    pub default_bucket_count: usize,
    /// In devmode, the bucket occupancy (entries in a single bucket) above
    /// which `Container::log_stats` escalates from `debug!` to `warn!`.
    pub devmode_occupancy_warn_threshold: usize,
    /// Log level used when `Link` rejects a duplicate under
    /// `DuplicatePolicy::RejectKey`.
    pub rejection_log_level: RejectionLogLevel,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            default_bucket_count: 64,
            devmode_occupancy_warn_threshold: 32,
            rejection_log_level: RejectionLogLevel::Debug,
        }
    }
}

impl Settings {
    /// Preset for small, short-lived containers: fewer buckets, earlier
    /// occupancy warnings.
    pub fn small_container() -> Settings {
        Settings {
            default_bucket_count: 8,
            devmode_occupancy_warn_threshold: 8,
            rejection_log_level: RejectionLogLevel::Debug,
        }
    }

    /// Preset for large, long-lived containers.
    pub fn large_container() -> Settings {
        Settings {
            default_bucket_count: 512,
            devmode_occupancy_warn_threshold: 128,
            rejection_log_level: RejectionLogLevel::Debug,
        }
    }

    /// Escalate rejected-duplicate logging to `warn!`, for containers where a
    /// rejected `Link` under `DuplicatePolicy::RejectKey` signals a likely
    /// caller bug rather than expected behavior.
    pub fn warn_on_rejected_duplicates(&mut self) {
        self.rejection_log_level = RejectionLogLevel::Warn;
    }

    /// Reasonable default bucket count to use for a container created with
    /// the given duplicate policy, for callers that pass `bucket_count = 0`
    /// to `HashContainer::new`/`create` as a "pick one for me" sentinel.
    ///
    /// Policies that dedupe by key (`RejectKey`, `Replace`) tend to guard
    /// smaller working sets than `Allow`, so they get half the plain
    /// default; `RejectSameObject` only ever rejects pointer-identical
    /// re-links and is no signal about size, so it gets the plain default
    /// like `Allow`.
    pub fn bucket_count_for(&self, policy: DuplicatePolicy) -> usize {
        match policy {
            DuplicatePolicy::RejectKey | DuplicatePolicy::Replace => {
                (self.default_bucket_count / 2).max(1)
            }
            DuplicatePolicy::Allow | DuplicatePolicy::RejectSameObject => self.default_bucket_count,
        }
    }
}

/// Get the settings of the current thread.
pub fn get() -> Settings {
    LOCAL_SETTINGS.with(|x| x.get())
}

/// Set the settings for the current thread.
///
/// # Important
///
/// This is not global. If you want the same settings across multiple
/// threads, call this at the start of each thread you spawn.
pub fn set_local(settings: Settings) {
    LOCAL_SETTINGS.with(|x| x.set(settings))
}
