use snafu::{Location, Snafu};

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A single vessel record that cannot be stored. These are dropped and logged, never surfaced.
#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum ValidationError {
    #[snafu(display("Malformed vessel record"))]
    Malformed {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: serde_json::Error,
    },
    #[snafu(display("Vessel record is missing '{field}'"))]
    Missing {
        #[snafu(implicit)]
        location: Location,
        field: &'static str,
    },
    #[snafu(display("Vessel record has a non-finite '{field}': '{value}'"))]
    NonFinite {
        #[snafu(implicit)]
        location: Location,
        field: &'static str,
        value: f64,
    },
    #[snafu(display("Latitude '{value}' is outside [-90, 90]"))]
    LatitudeRange {
        #[snafu(implicit)]
        location: Location,
        value: f64,
    },
    #[snafu(display("Longitude '{value}' is outside [-180, 180]"))]
    LongitudeRange {
        #[snafu(implicit)]
        location: Location,
        value: f64,
    },
    #[snafu(display("Vessel identity is blank"))]
    BlankMmsi {
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum BoundsError {
    #[snafu(display("Bounds contain a non-finite value"))]
    NonFiniteBounds {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display(
        "Invalid latitude range, must be within [-90, 90] with min <= max, min: '{min}', max: '{max}'"
    ))]
    LatitudeBounds {
        #[snafu(implicit)]
        location: Location,
        min: f64,
        max: f64,
    },
    #[snafu(display(
        "Invalid longitude range, must be within [-180, 180] with min <= max, min: '{min}', max: '{max}'"
    ))]
    LongitudeBounds {
        #[snafu(implicit)]
        location: Location,
        min: f64,
        max: f64,
    },
}

/// Failure of a single snapshot fetch. No fetch failure is fatal to the engine.
#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum FetchError {
    #[snafu(display("Failed to reach the snapshot endpoint"))]
    Transport {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: BoxedError,
    },
    #[snafu(display("Not permitted to read live vessel positions, status: '{status}'"))]
    PermissionDenied {
        #[snafu(implicit)]
        location: Location,
        status: u16,
    },
    #[snafu(display("Snapshot endpoint failed, status: '{status}', body: '{body}'"))]
    Server {
        #[snafu(implicit)]
        location: Location,
        status: u16,
        body: String,
    },
    #[snafu(display("Failed to decode snapshot response"))]
    Decode {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: BoxedError,
    },
}

impl FetchError {
    /// Every fetch failure is retried on the next trigger, permission failures included
    /// (those are only retried less often).
    pub fn is_retryable(&self) -> bool {
        true
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FetchError::PermissionDenied { .. })
    }
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum ChannelError {
    #[snafu(display("Failed to subscribe to the push channel"))]
    Subscribe {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: BoxedError,
    },
    #[snafu(display("Push channel handshake failed: '{message}'"))]
    Handshake {
        #[snafu(implicit)]
        location: Location,
        message: String,
    },
    #[snafu(display("Unsupported push channel scheme '{scheme}'"))]
    UnsupportedScheme {
        #[snafu(implicit)]
        location: Location,
        scheme: String,
    },
    #[snafu(display("Push channel stream failed"))]
    Stream {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: BoxedError,
    },
}
