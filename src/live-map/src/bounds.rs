use std::time::Duration;

use tokio::time::Instant;
use tracking_core::Bounds;

/// Holds the current viewport and debounces rapid changes while the user pans or zooms.
///
/// Every reported rectangle pushes the settle deadline out by the quiet period, so a
/// gesture produces exactly one settled signal carrying its final rectangle. A quiet period
/// of zero gives move-end semantics: the map surface reports once when the gesture ends
/// and that report settles immediately.
#[derive(Debug, Clone)]
pub struct BoundsTracker {
    quiet_period: Duration,
    current: Option<Bounds>,
    pending: Option<PendingBounds>,
}

#[derive(Debug, Clone, Copy)]
struct PendingBounds {
    bounds: Bounds,
    settles_at: Instant,
}

impl BoundsTracker {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            current: None,
            pending: None,
        }
    }

    pub fn on_viewport_changed(&mut self, bounds: Bounds, now: Instant) {
        self.pending = Some(PendingBounds {
            bounds,
            settles_at: now + self.quiet_period,
        });
    }

    /// When the pending viewport change settles, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.settles_at)
    }

    /// Returns the settled bounds once the quiet period has passed, and only once per
    /// gesture.
    pub fn poll_settled(&mut self, now: Instant) -> Option<Bounds> {
        let pending = self.pending.filter(|p| p.settles_at <= now)?;
        self.pending = None;
        self.current = Some(pending.bounds);
        Some(pending.bounds)
    }

    /// `None` until the first viewport change has settled.
    pub fn current_bounds(&self) -> Option<Bounds> {
        self.current
    }
}
