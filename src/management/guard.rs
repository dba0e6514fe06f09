use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

/// Keyed registry of in-flight synthesis requests.
///
/// The synthesizer fingerprints every run over `(token, songs)` and refuses
/// to start while an identical fingerprint is still registered, so repeated
/// submissions of the same request cannot issue duplicate remote work. The
/// registry is a collaborator handed to the synthesizer by the caller, not
/// process-global state; tests scope one per run.
///
/// Entries release through [`GuardEntry`]'s `Drop`, which covers every exit
/// path of a guarded run, success, error, or panic. A synchronous lock is
/// used because `Drop` cannot await.
#[derive(Clone, Default)]
pub struct RequestGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `fingerprint` as in flight. Returns `None` when an
    /// identical request is already running; the returned entry keeps the
    /// registration alive until dropped.
    pub fn acquire(&self, fingerprint: &str) -> Option<GuardEntry> {
        let mut in_flight = self.in_flight.lock().expect("in-flight registry poisoned");
        if in_flight.insert(fingerprint.to_string()) {
            Some(GuardEntry {
                registry: Arc::clone(&self.in_flight),
                fingerprint: fingerprint.to_string(),
            })
        } else {
            None
        }
    }

    pub fn is_in_flight(&self, fingerprint: &str) -> bool {
        self.in_flight
            .lock()
            .expect("in-flight registry poisoned")
            .contains(fingerprint)
    }
}

/// Live registration of one in-flight request; removing happens on drop.
pub struct GuardEntry {
    registry: Arc<Mutex<HashSet<String>>>,
    fingerprint: String,
}

impl Drop for GuardEntry {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.registry.lock() {
            in_flight.remove(&self.fingerprint);
        }
    }
}
