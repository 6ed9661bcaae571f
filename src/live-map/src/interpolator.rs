use std::time::Duration;

use tracking_core::{GeoPoint, Mmsi};

use crate::store::{AnimationSlot, PositionStore};

/// A running move of a single marker from `start` towards the vessel's current target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    start: GeoPoint,
    step: u32,
}

/// Moves rendered positions towards their targets in a fixed number of equal steps.
///
/// One [Interpolator::tick] advances every running animation by one step.
#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    duration: Duration,
    steps: u32,
}

impl Animation {
    pub fn start(&self) -> GeoPoint {
        self.start
    }

    /// Steps taken so far.
    pub fn step(&self) -> u32 {
        self.step
    }
}

impl Interpolator {
    pub fn new(duration: Duration, steps: u32) -> Self {
        Self { duration, steps }
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Time between two ticks, `None` when targets are snapped to immediately.
    pub fn step_interval(&self) -> Option<Duration> {
        match self.steps {
            0 => None,
            steps => Some(self.duration / steps),
        }
    }

    /// Restarts the animation of each vessel from where it is currently drawn.
    pub fn retarget<'a>(
        &self,
        store: &mut PositionStore,
        vessels: impl IntoIterator<Item = &'a Mmsi>,
    ) {
        for mmsi in vessels {
            if let Some(vessel) = store.vessel_mut(mmsi) {
                self.restart(vessel.animation_slot());
            }
        }
    }

    /// Advances every running animation by one step. Returns whether any are still running.
    pub fn tick(&self, store: &mut PositionStore) -> bool {
        let mut animating = false;
        for vessel in store.vessels_mut() {
            let slot = vessel.animation_slot();
            self.advance(slot);
            animating |= vessel.animation().is_some();
        }
        animating
    }

    fn restart(&self, slot: AnimationSlot<'_>) {
        if self.steps == 0 || *slot.rendered == slot.target {
            *slot.rendered = slot.target;
            *slot.animation = None;
            return;
        }

        *slot.animation = Some(Animation {
            start: *slot.rendered,
            step: 0,
        });
    }

    fn advance(&self, slot: AnimationSlot<'_>) {
        let Some(animation) = slot.animation.as_mut() else {
            return;
        };

        animation.step += 1;

        if animation.step >= self.steps {
            *slot.rendered = slot.target;
            *slot.animation = None;
        } else {
            let fraction = f64::from(animation.step) / f64::from(self.steps);
            *slot.rendered = animation.start.towards(&slot.target, fraction);
        }
    }
}
