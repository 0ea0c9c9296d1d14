//! Runtime configuration for the synchronization core.

/// Tunables shared by every primitive bound to one [`SyncTable`].
///
/// [`SyncTable`]: crate::sync::SyncTable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Whether lock acquisition donates priority to the holder.
    ///
    /// Schedulers that compute priorities on their own (e.g. a multi-level
    /// feedback queue) turn this off.
    pub donation: bool,
    /// Maximum number of live threads. Also bounds the donation chain walk.
    pub max_threads: usize,
}

impl SyncConfig {
    /// Default configuration: donation on, 64 threads.
    pub const fn new() -> Self {
        Self {
            donation: true,
            max_threads: 64,
        }
    }

    pub const fn with_donation(mut self, donation: bool) -> Self {
        self.donation = donation;
        self
    }

    pub const fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
