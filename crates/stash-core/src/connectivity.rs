//! Shared online/offline flag.
//!
//! One [`Connectivity`] is shared by the queue, the cache, and whatever
//! feeds it (a prober, a test). [`Connectivity::set`] reports whether the
//! call changed the state so the owner can dispatch transitions exactly
//! once.

use std::sync::atomic::{AtomicBool, Ordering};

/// Result of updating the connectivity flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    CameOnline,
    WentOffline,
    Unchanged,
}

#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Record the current state and report the transition, if any.
    pub fn set(&self, online: bool) -> Transition {
        let previous = self.online.swap(online, Ordering::SeqCst);
        match (previous, online) {
            (false, true) => Transition::CameOnline,
            (true, false) => Transition::WentOffline,
            _ => Transition::Unchanged,
        }
    }
}

impl Default for Connectivity {
    /// Starts online, like a freshly loaded page.
    fn default() -> Self {
        Self::new(true)
    }
}
