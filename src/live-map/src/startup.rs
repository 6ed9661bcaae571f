use std::{panic::AssertUnwindSafe, sync::Arc, time::Duration};

use futures::{FutureExt, StreamExt};
use http_client::{HttpClient, Url};
use snafu::{IntoError, ResultExt};
use tokio::{
    sync::mpsc,
    task::JoinSet,
    time::{Instant, MissedTickBehavior, interval, interval_at, sleep, sleep_until},
};
use tracing::{debug, error, info, instrument, warn};
use tracking_core::{
    Bounds, FetchError, FetchRequest, PositionSource, PushSignal, PushSource, VesselPosition,
    fetch_error::TransportSnafu,
};

use crate::{
    engine::{EngineEvent, TrackingEngine},
    error::{
        Result,
        error::{HttpClientSnafu, InvalidUrlSnafu, PushChannelSnafu},
    },
    fetcher::HttpPositionSource,
    multiplexer::TriggerKind,
    push::SocketIoPushSource,
    render::{RenderBinding, RenderPublisher, render_channel},
    settings::Settings,
    status::ChannelState,
};

static EVENT_BUFFER_SIZE: usize = 64;

type FetchOutput = (
    FetchRequest,
    std::result::Result<Vec<VesselPosition>, FetchError>,
);

/// The engine task. Owns the [TrackingEngine] and feeds it every event from a single loop.
pub struct App {
    engine: TrackingEngine,
    source: Arc<dyn PositionSource>,
    push: Option<Arc<dyn PushSource>>,
    poll_interval: Duration,
    push_reconnect_delay: Duration,
    viewport_rx: mpsc::UnboundedReceiver<Bounds>,
    publisher: RenderPublisher,
    fetches: JoinSet<FetchOutput>,
}

/// Handle for the map surface. Dropping it shuts the engine down.
#[derive(Debug, Clone)]
pub struct AppHandle {
    viewport_tx: mpsc::UnboundedSender<Bounds>,
    binding: RenderBinding,
}

impl App {
    pub fn build(settings: &Settings) -> Result<(App, AppHandle)> {
        let client = HttpClient::builder()
            .timeout(settings.http.timeout)
            .connect_timeout(settings.http.connect_timeout)
            .max_retries(settings.http.max_retries)
            .build()
            .context(HttpClientSnafu)?;

        let snapshot_url = parse_url(&settings.snapshot_url)?;
        let source = HttpPositionSource::new(client, snapshot_url, settings.api_token.clone());

        let push = match &settings.push_url {
            None => {
                info!("no push url configured, relying on polling alone");
                None
            }
            Some(url) => Some(Arc::new(
                SocketIoPushSource::new(
                    parse_url(url)?,
                    settings.api_token.clone(),
                    settings.http.connect_timeout,
                )
                .context(PushChannelSnafu)?,
            ) as Arc<dyn PushSource>),
        };

        Ok(Self::with_sources(settings, Arc::new(source), push))
    }

    pub fn with_sources(
        settings: &Settings,
        source: Arc<dyn PositionSource>,
        push: Option<Arc<dyn PushSource>>,
    ) -> (App, AppHandle) {
        let (viewport_tx, viewport_rx) = mpsc::unbounded_channel();
        let (publisher, binding) = render_channel();

        let app = App {
            engine: TrackingEngine::new(&settings.sync, &settings.animation, &settings.filter),
            source,
            push,
            poll_interval: settings.sync.poll_interval,
            push_reconnect_delay: settings.sync.push_reconnect_delay,
            viewport_rx,
            publisher,
            fetches: JoinSet::new(),
        };

        (
            app,
            AppHandle {
                viewport_tx,
                binding,
            },
        )
    }

    /// Runs until every [AppHandle] has been dropped.
    pub async fn run(mut self) {
        let (event_tx, mut event_rx) = mpsc::channel(EVENT_BUFFER_SIZE);

        let mut push_task = JoinSet::new();
        if let Some(push) = self.push.clone() {
            self.handle(EngineEvent::Channel(ChannelState::Connecting));
            push_task.spawn(push_loop(push, event_tx, self.push_reconnect_delay));
        } else {
            drop(event_tx);
        }

        let mut poll = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let step_interval = self.engine.interpolator().step_interval();
        let mut animation = interval(step_interval.unwrap_or(Duration::from_secs(1)));
        animation.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut was_animating = false;

        self.handle(EngineEvent::Trigger(TriggerKind::Initial));
        self.publish();

        loop {
            let animating = step_interval.is_some() && self.engine.is_animating();
            if animating && !was_animating {
                animation.reset();
            }
            was_animating = animating;

            let settle_at = self.engine.settle_deadline();

            tokio::select! {
                bounds = self.viewport_rx.recv() => match bounds {
                    Some(bounds) => self.handle(EngineEvent::ViewportChanged(bounds)),
                    None => {
                        info!("all handles dropped, shutting down");
                        break;
                    }
                },
                Some(event) = event_rx.recv() => self.handle(event),
                _ = poll.tick() => self.handle(EngineEvent::Trigger(TriggerKind::PollTick)),
                _ = animation.tick(), if animating => self.handle(EngineEvent::AnimationTick),
                _ = sleep_until(settle_at.unwrap_or_else(Instant::now)), if settle_at.is_some() => {
                    let request = self.engine.settle(Instant::now());
                    self.dispatch(request);
                }
                Some(joined) = self.fetches.join_next() => match joined {
                    Ok((request, result)) => {
                        self.handle(EngineEvent::FetchCompleted { request, result })
                    }
                    Err(e) => error!("fetch task was cancelled: {e:?}"),
                },
            }

            self.publish();
        }

        self.fetches.abort_all();
        push_task.abort_all();
    }

    fn handle(&mut self, event: EngineEvent) {
        let request = self.engine.handle(event, Instant::now());
        self.dispatch(request);
    }

    fn dispatch(&mut self, request: Option<FetchRequest>) {
        let Some(request) = request else {
            return;
        };
        let source = self.source.clone();
        self.fetches.spawn(async move {
            // Every dispatched fetch must complete, a panic included.
            let result = match AssertUnwindSafe(source.fetch(&request)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!("fetch {} panicked", request.sequence);
                    Err(TransportSnafu.into_error("position source panicked".into()))
                }
            };
            (request, result)
        });
    }

    fn publish(&self) {
        self.publisher.publish(self.engine.frame());
    }
}

impl AppHandle {
    /// Reports the rectangle currently shown by the map surface. Returns `false` if the
    /// engine has shut down.
    pub fn viewport_changed(&self, bounds: Bounds) -> bool {
        self.viewport_tx.send(bounds).is_ok()
    }

    pub fn binding(&self) -> RenderBinding {
        self.binding.clone()
    }
}

#[instrument(skip_all)]
async fn push_loop(
    source: Arc<dyn PushSource>,
    events: mpsc::Sender<EngineEvent>,
    reconnect_delay: Duration,
) {
    loop {
        if events
            .send(EngineEvent::Channel(ChannelState::Connecting))
            .await
            .is_err()
        {
            return;
        }

        match source.subscribe().await {
            Err(e) => warn!("failed to subscribe to push channel: {e:?}"),
            Ok(mut stream) => {
                if events
                    .send(EngineEvent::Channel(ChannelState::Connected))
                    .await
                    .is_err()
                {
                    return;
                }

                while let Some(signal) = stream.next().await {
                    match signal {
                        Ok(PushSignal::Subscribed) => debug!("push subscription confirmed"),
                        Ok(PushSignal::PositionsUpdated) => {
                            if events
                                .send(EngineEvent::Trigger(TriggerKind::PushEvent))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!("push channel failed: {e:?}");
                            break;
                        }
                    }
                }
            }
        }

        if events
            .send(EngineEvent::Channel(ChannelState::Disconnected))
            .await
            .is_err()
        {
            return;
        }

        sleep(reconnect_delay).await;
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).context(InvalidUrlSnafu { url })
}
