use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use tracking_core::{Bounds, FetchError, FetchRequest, VesselPosition};

use crate::{
    bounds::BoundsTracker,
    filter::VesselFilter,
    interpolator::Interpolator,
    multiplexer::{Completion, CompletionResult, MuxSignal, TriggerKind, UpdateMultiplexer},
    render::RenderFrame,
    settings::{AnimationSettings, FilterSettings, SyncSettings},
    status::{ChannelState, SyncStatus},
    store::{MergeOutcome, PositionStore},
};

/// Everything that can happen to the engine, consumed through [TrackingEngine::handle].
#[derive(Debug)]
pub enum EngineEvent {
    ViewportChanged(Bounds),
    Trigger(TriggerKind),
    FetchCompleted {
        request: FetchRequest,
        result: Result<Vec<VesselPosition>, FetchError>,
    },
    Channel(ChannelState),
    AnimationTick,
}

/// The synchronization core. Owns all mutable state and performs no I/O, time is passed in
/// by the caller.
#[derive(Debug)]
pub struct TrackingEngine {
    bounds: BoundsTracker,
    mux: UpdateMultiplexer,
    store: PositionStore,
    interpolator: Interpolator,
    filter: VesselFilter,
    status: SyncStatus,
    channel: ChannelState,
}

impl TrackingEngine {
    pub fn new(
        sync: &SyncSettings,
        animation: &AnimationSettings,
        filter: &FilterSettings,
    ) -> Self {
        Self {
            bounds: BoundsTracker::new(sync.bounds_quiet_period),
            mux: UpdateMultiplexer::new(sync.permission_backoff_max_polls),
            store: PositionStore::new(),
            interpolator: Interpolator::new(animation.duration, animation.steps),
            filter: VesselFilter::new(filter),
            status: SyncStatus::new(sync.persistent_failure_threshold),
            channel: ChannelState::Disabled,
        }
    }

    /// Applies a single event, returning the fetch to dispatch if one is due.
    pub fn handle(&mut self, event: EngineEvent, now: Instant) -> Option<FetchRequest> {
        let dispatch = match event {
            EngineEvent::ViewportChanged(bounds) => {
                self.bounds.on_viewport_changed(bounds, now);
                return self.settle(now);
            }
            EngineEvent::Trigger(kind) => self.mux.intake(MuxSignal::Trigger(kind)).dispatch,
            EngineEvent::FetchCompleted { request, result } => {
                self.on_fetch_completed(request, result)
            }
            EngineEvent::Channel(state) => {
                if state != self.channel {
                    info!("push channel {}", state);
                }
                self.channel = state;
                None
            }
            EngineEvent::AnimationTick => {
                self.interpolator.tick(&mut self.store);
                None
            }
        };

        if let Some(request) = &dispatch {
            debug!(
                "dispatching fetch {} for bounds {:?}",
                request.sequence, request.bounds
            );
        }

        dispatch
    }

    /// Turns a viewport change whose quiet period has passed into a fetch for its bounds.
    pub fn settle(&mut self, now: Instant) -> Option<FetchRequest> {
        let bounds = self.bounds.poll_settled(now)?;
        let request = self.mux.intake(MuxSignal::BoundsSettled(bounds)).dispatch;
        if let Some(request) = &request {
            debug!("bounds settled, dispatching fetch {}", request.sequence);
        }
        request
    }

    pub fn settle_deadline(&self) -> Option<Instant> {
        self.bounds.deadline()
    }

    pub fn is_animating(&self) -> bool {
        self.store.is_animating()
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn current_bounds(&self) -> Option<Bounds> {
        self.bounds.current_bounds()
    }

    pub fn frame(&self) -> RenderFrame {
        RenderFrame::new(&self.store, self.status.indicator().clone(), self.channel)
    }

    #[instrument(skip_all, fields(app.sequence = %request.sequence, app.num_vessels))]
    fn on_fetch_completed(
        &mut self,
        request: FetchRequest,
        result: Result<Vec<VesselPosition>, FetchError>,
    ) -> Option<FetchRequest> {
        let completion = match &result {
            Ok(_) => CompletionResult::Success,
            Err(e) => CompletionResult::Failure {
                permission_denied: e.is_permission_denied(),
            },
        };

        let intake = self.mux.intake(MuxSignal::Completed {
            sequence: request.sequence,
            result: completion,
        });

        match intake.completion {
            Some(Completion::Current) => match result {
                Ok(vessels) => self.apply(request, vessels),
                Err(e) => {
                    if e.is_permission_denied() {
                        warn!("fetch {} was refused: {e:?}", request.sequence);
                    } else {
                        error!("fetch {} failed: {e:?}", request.sequence);
                    }
                    self.status.record_failure(&e);
                }
            },
            Some(Completion::Stale) | None => {
                debug!(
                    "discarding fetch {} for previous bounds {:?}",
                    request.sequence, request.bounds
                );
            }
        }

        intake.dispatch
    }

    fn apply(&mut self, request: FetchRequest, vessels: Vec<VesselPosition>) {
        self.status.record_success();

        let vessels = self.filter.apply(vessels);
        tracing::Span::current().record("app.num_vessels", vessels.len());

        match self.store.merge(vessels, request.sequence) {
            MergeOutcome::Discarded => (),
            MergeOutcome::Applied(report) => {
                debug!(
                    "merged fetch {}: {} created, {} moved, {} removed",
                    request.sequence,
                    report.created.len(),
                    report.retargeted.len(),
                    report.removed.len()
                );
                self.interpolator
                    .retarget(&mut self.store, &report.retargeted);
            }
        }
    }
}
