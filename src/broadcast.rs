//! Server-wide announcement log.
//!
//! Broadcasts are appended in arrival order by the broadcast stage (the only
//! writer) and read as snapshots by the application. The log is bounded:
//! when full, the oldest entry is evicted first. Retrieval is best-effort by
//! contract; an internal failure yields an empty snapshot and a logged
//! cause, never an error to the caller.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
};

use log::{debug, error, warn};

/// Bounded, order-preserving log of server announcements.
#[derive(Debug)]
pub struct BroadcastLog {
    cap: usize,
    entries: Mutex<VecDeque<String>>,
}

impl BroadcastLog {
    /// Create a log retaining at most `cap` entries.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    fn write_guard(&self) -> MutexGuard<'_, VecDeque<String>> {
        // A poisoned lock only means a reader panicked mid-snapshot; the
        // queue itself is still consistent for the single writer.
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("broadcast log lock poisoned; continuing with current contents");
            poisoned.into_inner()
        })
    }

    /// Append an announcement, evicting the oldest entry when full.
    pub fn push(&self, text: String) {
        if self.cap == 0 {
            debug!("broadcast log capacity is zero; dropping announcement");
            return;
        }
        let mut entries = self.write_guard();
        if entries.len() == self.cap {
            entries.pop_front();
        }
        entries.push_back(text);
    }

    /// Order-preserving copy of the current contents.
    ///
    /// Returns an empty vector (with a logged cause) if the log cannot be
    /// read; retrieval never fails the session.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(cause) => {
                error!("failed to read broadcast log: {cause}");
                Vec::new()
            }
        }
    }

    /// Remove all entries.
    pub fn clear(&self) { self.write_guard().clear(); }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize { self.write_guard().len() }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}
