use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{ChannelError, FetchError, FetchRequest, VesselPosition};

/// Bounds-scoped snapshot of current vessel positions.
///
/// Implementations may have several fetches in flight at once and must not assume that
/// responses arrive in request order. Malformed records are filtered out before returning.
#[async_trait]
pub trait PositionSource: Send + Sync + 'static {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<VesselPosition>, FetchError>;
}

/// What the live channel tells us. Payloads are never merged, a signal is only a reason
/// to re-fetch the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushSignal {
    /// The server acknowledged the subscription.
    Subscribed,
    PositionsUpdated,
}

/// The stream ends when the channel is lost.
pub type PushStream = BoxStream<'static, Result<PushSignal, ChannelError>>;

#[async_trait]
pub trait PushSource: Send + Sync + 'static {
    async fn subscribe(&self) -> Result<PushStream, ChannelError>;
}
