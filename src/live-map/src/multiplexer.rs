use strum::{AsRefStr, Display};
use tracing::{debug, warn};
use tracking_core::{Bounds, FetchRequest, FetchSequence};

/// The reasons a snapshot refresh is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum TriggerKind {
    Initial,
    PollTick,
    PushEvent,
}

/// Everything the multiplexer reacts to, consumed through [UpdateMultiplexer::intake].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MuxSignal {
    Trigger(TriggerKind),
    BoundsSettled(Bounds),
    Completed {
        sequence: FetchSequence,
        result: CompletionResult,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionResult {
    Success,
    Failure { permission_denied: bool },
}

/// Whether a completed fetch belongs to the current bounds context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Current,
    /// Dispatched for bounds the user has since moved away from, ignore the response.
    Stale,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Intake {
    pub dispatch: Option<FetchRequest>,
    pub completion: Option<Completion>,
}

/// Merges the initial load, poll ticks, push events and settled bounds changes into fetch
/// dispatches.
///
/// At most one fetch is in flight per bounds context. Triggers arriving while a fetch is in
/// flight collapse into a single pending flag, which results in exactly one follow-up fetch
/// once the in-flight one completes, using the bounds current at that time.
#[derive(Debug, Clone)]
pub struct UpdateMultiplexer {
    last_sequence: FetchSequence,
    context: BoundsContext,
    in_flight: Option<FetchSequence>,
    pending: Option<TriggerKind>,
    backoff: PermissionBackoff,
}

/// Fetches dispatched before `first_sequence` belong to an older context.
#[derive(Debug, Clone, Copy, Default)]
struct BoundsContext {
    bounds: Option<Bounds>,
    first_sequence: FetchSequence,
}

/// Suppresses poll ticks and push events after the endpoint refused us, so an
/// authorization failure is not repeated on every cycle.
#[derive(Debug, Clone, Copy)]
struct PermissionBackoff {
    consecutive_denials: u32,
    polls_to_skip: u32,
    max_polls: u32,
}

impl UpdateMultiplexer {
    pub fn new(permission_backoff_max_polls: u32) -> Self {
        Self {
            last_sequence: FetchSequence::default(),
            context: BoundsContext::default(),
            in_flight: None,
            pending: None,
            backoff: PermissionBackoff {
                consecutive_denials: 0,
                polls_to_skip: 0,
                max_polls: permission_backoff_max_polls,
            },
        }
    }

    pub fn intake(&mut self, signal: MuxSignal) -> Intake {
        match signal {
            MuxSignal::Trigger(kind) => Intake {
                dispatch: self.on_trigger(kind),
                completion: None,
            },
            MuxSignal::BoundsSettled(bounds) => Intake {
                dispatch: Some(self.on_bounds_settled(bounds)),
                completion: None,
            },
            MuxSignal::Completed { sequence, result } => self.on_completed(sequence, result),
        }
    }

    pub fn in_flight(&self) -> Option<FetchSequence> {
        self.in_flight
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_backing_off(&self) -> bool {
        self.backoff.polls_to_skip > 0
    }

    fn on_trigger(&mut self, kind: TriggerKind) -> Option<FetchRequest> {
        if kind != TriggerKind::Initial && self.backoff.polls_to_skip > 0 {
            if kind == TriggerKind::PollTick {
                self.backoff.polls_to_skip -= 1;
            }
            debug!(
                "ignoring {kind} trigger, backing off after permission failure ({} polls left)",
                self.backoff.polls_to_skip
            );
            return None;
        }

        if let Some(in_flight) = self.in_flight {
            debug!("{kind} trigger while fetch {in_flight} is in flight, marking pending");
            if self.pending.is_none() {
                self.pending = Some(kind);
            }
            return None;
        }

        Some(self.dispatch())
    }

    fn on_bounds_settled(&mut self, bounds: Bounds) -> FetchRequest {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("bounds changed, fetch {in_flight} will be ignored on arrival");
        }
        // The fetch for the new bounds covers anything that was pending.
        self.pending = None;
        self.context = BoundsContext {
            bounds: Some(bounds),
            first_sequence: self.last_sequence.next(),
        };
        self.dispatch()
    }

    fn on_completed(&mut self, sequence: FetchSequence, result: CompletionResult) -> Intake {
        if sequence < self.context.first_sequence {
            return Intake {
                dispatch: None,
                completion: Some(Completion::Stale),
            };
        }

        if self.in_flight != Some(sequence) {
            warn!(
                "completion of fetch {sequence} which is not in flight (in flight: {:?})",
                self.in_flight
            );
            return Intake {
                dispatch: None,
                completion: Some(Completion::Stale),
            };
        }

        self.in_flight = None;

        match result {
            CompletionResult::Success => self.backoff.reset(),
            CompletionResult::Failure {
                permission_denied: true,
            } => {
                self.backoff.deny();
                if let Some(kind) = self.pending.take() {
                    debug!("dropping pending {kind} trigger after permission failure");
                }
            }
            CompletionResult::Failure {
                permission_denied: false,
            } => (),
        }

        let dispatch = self.pending.take().map(|kind| {
            debug!("issuing follow-up fetch for pending {kind} trigger");
            self.dispatch()
        });

        Intake {
            dispatch,
            completion: Some(Completion::Current),
        }
    }

    fn dispatch(&mut self) -> FetchRequest {
        self.last_sequence = self.last_sequence.next();
        self.in_flight = Some(self.last_sequence);
        FetchRequest::new(self.last_sequence, self.context.bounds)
    }
}

impl PermissionBackoff {
    fn deny(&mut self) {
        self.consecutive_denials = self.consecutive_denials.saturating_add(1);
        let polls = 1u32
            .checked_shl(self.consecutive_denials - 1)
            .unwrap_or(u32::MAX);
        self.polls_to_skip = polls.min(self.max_polls);
    }

    fn reset(&mut self) {
        self.consecutive_denials = 0;
        self.polls_to_skip = 0;
    }
}
