//! Per-session capability tracking.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

/// Remote error text meaning the credential has no access to operative events.
pub const OPERATIVE_EVENT_UNSUPPORTED: &str = "ObjectType 'OperativeEvent' does not exists";

/// Which optional provider capabilities are usable with the current credential.
///
/// Each capability starts available and can only ever be switched off; nothing
/// switches it back on for the lifetime of the value.
#[derive(Debug)]
pub struct FeatureAvailability {
    operative_events: AtomicBool,
}

impl FeatureAvailability {
    /// Create the tracker, optionally with operative events disabled up front.
    pub fn new(disable_operative_events: bool) -> Self {
        Self {
            operative_events: AtomicBool::new(!disable_operative_events),
        }
    }

    /// Whether operative events may still be requested.
    pub fn operative_events_available(&self) -> bool {
        self.operative_events.load(Ordering::Acquire)
    }

    /// Permanently mark operative events as unavailable.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn disable_operative_events(&self) -> bool {
        let was_available = self.operative_events.swap(false, Ordering::AcqRel);
        if was_available {
            warn!("operative events are not available for this API key; disabling");
        }
        was_available
    }
}

impl Default for FeatureAvailability {
    fn default() -> Self {
        Self::new(false)
    }
}
