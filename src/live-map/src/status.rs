use serde::Serialize;
use strum::{AsRefStr, Display};
use tracking_core::FetchError;

/// State of the push channel as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChannelState {
    /// No push url is configured, updates come from polling alone.
    #[default]
    Disabled,
    Connecting,
    Connected,
    Disconnected,
}

/// User-visible health of the snapshot synchronization. Stale data keeps being displayed in
/// every failure state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StatusIndicator {
    /// No fetch has completed yet.
    #[default]
    Loading,
    Healthy,
    TransientFailure {
        message: String,
    },
    PersistentFailure {
        message: String,
        consecutive_failures: u32,
    },
    PermissionDenied {
        message: String,
    },
}

impl StatusIndicator {
    pub fn is_healthy(&self) -> bool {
        matches!(self, StatusIndicator::Healthy)
    }
}

/// Tracks the outcome of the most recent current-context fetches.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    persistent_failure_threshold: u32,
    consecutive_failures: u32,
    indicator: StatusIndicator,
}

impl SyncStatus {
    pub fn new(persistent_failure_threshold: u32) -> Self {
        Self {
            persistent_failure_threshold,
            consecutive_failures: 0,
            indicator: StatusIndicator::Loading,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.indicator = StatusIndicator::Healthy;
    }

    pub fn record_failure(&mut self, error: &FetchError) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let message = error.to_string();

        self.indicator = if error.is_permission_denied() {
            StatusIndicator::PermissionDenied { message }
        } else if self.consecutive_failures >= self.persistent_failure_threshold {
            StatusIndicator::PersistentFailure {
                message,
                consecutive_failures: self.consecutive_failures,
            }
        } else {
            StatusIndicator::TransientFailure { message }
        };
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn indicator(&self) -> &StatusIndicator {
        &self.indicator
    }
}
