use std::fmt::Display;

use crate::Bounds;

/// Monotonic counter assigned to every snapshot fetch at dispatch time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchSequence(u64);

/// A snapshot fetch as dispatched by the trigger multiplexer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    pub sequence: FetchSequence,
    /// `None` is a global query.
    pub bounds: Option<Bounds>,
}

impl FetchSequence {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for FetchSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FetchRequest {
    pub fn new(sequence: FetchSequence, bounds: Option<Bounds>) -> Self {
        Self { sequence, bounds }
    }
}
