use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracking_core::{DisplayMetadata, GeoPoint, Mmsi};

use crate::{
    status::{ChannelState, StatusIndicator},
    store::PositionStore,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedVessel {
    pub identity: Mmsi,
    pub position: GeoPoint,
    pub display: DisplayMetadata,
}

/// Everything the map surface draws, as of one engine step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderFrame {
    pub vessels: Vec<RenderedVessel>,
    pub status: StatusIndicator,
    pub channel: ChannelState,
}

impl RenderFrame {
    pub fn new(store: &PositionStore, status: StatusIndicator, channel: ChannelState) -> Self {
        Self {
            vessels: store
                .vessels()
                .map(|v| RenderedVessel {
                    identity: v.identity().clone(),
                    position: v.rendered_position(),
                    display: v.display().clone(),
                })
                .collect(),
            status,
            channel,
        }
    }

    pub fn vessel(&self, mmsi: &Mmsi) -> Option<&RenderedVessel> {
        self.vessels.iter().find(|v| &v.identity == mmsi)
    }
}

/// Write side of the render binding, owned by the engine task.
#[derive(Debug)]
pub struct RenderPublisher {
    tx: watch::Sender<Arc<RenderFrame>>,
}

/// Read-only view of the latest frame. Cloning is cheap and every clone sees every update.
#[derive(Debug, Clone)]
pub struct RenderBinding {
    rx: watch::Receiver<Arc<RenderFrame>>,
}

/// Creates a binding whose first frame is empty and [StatusIndicator::Loading].
pub fn render_channel() -> (RenderPublisher, RenderBinding) {
    let (tx, rx) = watch::channel(Arc::new(RenderFrame::default()));
    (RenderPublisher { tx }, RenderBinding { rx })
}

impl RenderPublisher {
    /// Only notifies readers when the frame actually changed.
    pub fn publish(&self, frame: RenderFrame) {
        self.tx.send_if_modified(|current| {
            if **current == frame {
                false
            } else {
                *current = Arc::new(frame);
                true
            }
        });
    }
}

impl RenderBinding {
    pub fn current(&self) -> Arc<RenderFrame> {
        self.rx.borrow().clone()
    }

    /// Waits for the next frame. Returns `None` once the engine has shut down.
    pub async fn changed(&mut self) -> Option<Arc<RenderFrame>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
