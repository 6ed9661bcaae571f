use std::collections::{BTreeMap, btree_map::Entry};

use tracing::debug;
use tracking_core::{DisplayMetadata, FetchSequence, GeoPoint, Mmsi, VesselPosition};

use crate::interpolator::Animation;

/// A vessel as the map knows it.
///
/// `target_position` is only changed by [PositionStore::merge] and `rendered_position` only
/// by the [crate::interpolator::Interpolator].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedVessel {
    identity: Mmsi,
    rendered_position: GeoPoint,
    target_position: GeoPoint,
    animation: Option<Animation>,
    last_seen_fetch_seq: FetchSequence,
    display: DisplayMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Idle,
    Animating { step: u32 },
}

#[derive(Debug, Default)]
pub struct PositionStore {
    vessels: BTreeMap<Mmsi, TrackedVessel>,
    highest_sequence: Option<FetchSequence>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Applied(MergeReport),
    /// A newer snapshot has already been merged.
    Discarded,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub created: Vec<Mmsi>,
    /// Vessels whose target position moved.
    pub retargeted: Vec<Mmsi>,
    pub removed: Vec<Mmsi>,
}

impl TrackedVessel {
    fn new(position: VesselPosition, sequence: FetchSequence) -> Self {
        Self {
            display: DisplayMetadata::from(&position),
            identity: position.mmsi,
            rendered_position: position.position,
            target_position: position.position,
            animation: None,
            last_seen_fetch_seq: sequence,
        }
    }

    pub fn identity(&self) -> &Mmsi {
        &self.identity
    }

    pub fn rendered_position(&self) -> GeoPoint {
        self.rendered_position
    }

    pub fn target_position(&self) -> GeoPoint {
        self.target_position
    }

    pub fn last_seen_fetch_seq(&self) -> FetchSequence {
        self.last_seen_fetch_seq
    }

    pub fn display(&self) -> &DisplayMetadata {
        &self.display
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn animation_state(&self) -> AnimationState {
        match &self.animation {
            None => AnimationState::Idle,
            Some(a) => AnimationState::Animating { step: a.step() },
        }
    }

    /// Interpolator access to the rendered position and the running animation.
    pub(crate) fn animation_slot(&mut self) -> AnimationSlot<'_> {
        AnimationSlot {
            rendered: &mut self.rendered_position,
            target: self.target_position,
            animation: &mut self.animation,
        }
    }
}

pub(crate) struct AnimationSlot<'a> {
    pub rendered: &'a mut GeoPoint,
    pub target: GeoPoint,
    pub animation: &'a mut Option<Animation>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a successful snapshot, which is authoritative for the vessels it contains and
    /// for the absence of every other vessel.
    pub fn merge(&mut self, vessels: Vec<VesselPosition>, sequence: FetchSequence) -> MergeOutcome {
        if let Some(highest) = self.highest_sequence.filter(|h| sequence < *h) {
            debug!("discarding snapshot {sequence}, already merged {highest}");
            return MergeOutcome::Discarded;
        }
        self.highest_sequence = Some(sequence);

        // Last record wins for duplicate identities.
        let mut incoming = BTreeMap::new();
        for v in vessels {
            incoming.insert(v.mmsi.clone(), v);
        }

        let mut report = MergeReport::default();

        self.vessels.retain(|mmsi, _| {
            let keep = incoming.contains_key(mmsi);
            if !keep {
                report.removed.push(mmsi.clone());
            }
            keep
        });

        for (mmsi, position) in incoming {
            match self.vessels.entry(mmsi) {
                Entry::Vacant(e) => {
                    report.created.push(e.key().clone());
                    e.insert(TrackedVessel::new(position, sequence));
                }
                Entry::Occupied(mut e) => {
                    let vessel = e.get_mut();
                    vessel.last_seen_fetch_seq = sequence;
                    vessel.display = DisplayMetadata::from(&position);
                    if vessel.target_position != position.position {
                        vessel.target_position = position.position;
                        report.retargeted.push(vessel.identity.clone());
                    }
                }
            }
        }

        MergeOutcome::Applied(report)
    }

    /// Owned copies of every tracked vessel, ordered by identity.
    pub fn snapshot(&self) -> Vec<TrackedVessel> {
        self.vessels.values().cloned().collect()
    }

    pub fn get(&self, mmsi: &Mmsi) -> Option<&TrackedVessel> {
        self.vessels.get(mmsi)
    }

    pub fn vessels(&self) -> impl Iterator<Item = &TrackedVessel> {
        self.vessels.values()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn highest_sequence(&self) -> Option<FetchSequence> {
        self.highest_sequence
    }

    pub fn is_animating(&self) -> bool {
        self.vessels.values().any(|v| v.animation.is_some())
    }

    pub(crate) fn vessel_mut(&mut self, mmsi: &Mmsi) -> Option<&mut TrackedVessel> {
        self.vessels.get_mut(mmsi)
    }

    pub(crate) fn vessels_mut(&mut self) -> impl Iterator<Item = &mut TrackedVessel> {
        self.vessels.values_mut()
    }
}
