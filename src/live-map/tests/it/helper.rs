use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use futures::StreamExt;
use live_map::{
    render::{RenderBinding, RenderFrame},
    settings::{
        AnimationSettings, Environment, FilterSettings, HttpSettings, LogLevel, Settings,
        SyncSettings,
    },
    startup::{App, AppHandle},
};
use snafu::IntoError;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracking_core::{
    ChannelError, FetchError, FetchRequest, PositionSource, PushSignal, PushSource, PushStream,
    VesselPosition, fetch_error::TransportSnafu,
};

pub struct TestHelper {
    pub handle: AppHandle,
    pub binding: RenderBinding,
    pub app: JoinHandle<()>,
    fetches: mpsc::UnboundedReceiver<PendingFetch>,
    subscriptions: mpsc::UnboundedReceiver<PushConnection>,
}

/// A fetch the engine is waiting on, answered by the test.
pub struct PendingFetch {
    pub request: FetchRequest,
    respond: oneshot::Sender<Result<Vec<VesselPosition>, FetchError>>,
}

/// The server side of a single push channel subscription. Dropping it ends the stream.
pub struct PushConnection {
    tx: mpsc::UnboundedSender<Result<PushSignal, ChannelError>>,
}

struct ScriptedSource {
    fetches: mpsc::UnboundedSender<PendingFetch>,
}

struct ScriptedPushSource {
    subscriptions: mpsc::UnboundedSender<PushConnection>,
}

pub fn test_settings() -> Settings {
    Settings {
        log_level: LogLevel::Debug,
        environment: Environment::Test,
        snapshot_url: "http://localhost:8000/api/vessels/realtime".into(),
        push_url: None,
        api_token: None,
        http: HttpSettings::default(),
        sync: SyncSettings::default(),
        animation: AnimationSettings::default(),
        filter: FilterSettings::default(),
    }
}

pub async fn test<T, Fut>(test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    test_with_settings(test_settings(), false, test_closure).await
}

pub async fn test_with_push<T, Fut>(test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    test_with_settings(test_settings(), true, test_closure).await
}

pub async fn test_with_settings<T, Fut>(settings: Settings, with_push: bool, test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    let (fetch_tx, fetches) = mpsc::unbounded_channel();
    let (subscription_tx, subscriptions) = mpsc::unbounded_channel();

    let push = with_push.then(|| {
        Arc::new(ScriptedPushSource {
            subscriptions: subscription_tx,
        }) as Arc<dyn PushSource>
    });

    let (app, handle) = App::with_sources(
        &settings,
        Arc::new(ScriptedSource { fetches: fetch_tx }),
        push,
    );
    let binding = handle.binding();

    let helper = TestHelper {
        handle,
        binding,
        app: tokio::spawn(app.run()),
        fetches,
        subscriptions,
    };

    test_closure(helper).await;
}

impl TestHelper {
    pub async fn next_fetch(&mut self) -> PendingFetch {
        self.fetches.recv().await.unwrap()
    }

    pub async fn next_subscription(&mut self) -> PushConnection {
        self.subscriptions.recv().await.unwrap()
    }

    /// Waits until a published frame satisfies `predicate`, starting with the current one.
    pub async fn wait_for_frame(
        &mut self,
        predicate: impl Fn(&RenderFrame) -> bool,
    ) -> Arc<RenderFrame> {
        let current = self.binding.current();
        if predicate(&current) {
            return current;
        }
        loop {
            let frame = self.binding.changed().await.unwrap();
            if predicate(&frame) {
                return frame;
            }
        }
    }

    /// Answers the initial fetch with `vessels` and waits until they are rendered.
    pub async fn load(&mut self, vessels: Vec<VesselPosition>) {
        let fetch = self.next_fetch().await;
        let expected = vessels.len();
        fetch.respond(vessels);
        self.wait_for_frame(|f| f.vessels.len() == expected && f.status.is_healthy())
            .await;
    }
}

impl PendingFetch {
    pub fn respond(self, vessels: Vec<VesselPosition>) {
        self.respond.send(Ok(vessels)).unwrap();
    }

    pub fn fail(self, error: FetchError) {
        self.respond.send(Err(error)).unwrap();
    }

    /// Whether the engine is no longer waiting for this fetch.
    pub fn is_abandoned(&self) -> bool {
        self.respond.is_closed()
    }
}

impl PushConnection {
    pub fn send(&self, signal: PushSignal) {
        self.tx.send(Ok(signal)).unwrap();
    }
}

#[async_trait]
impl PositionSource for ScriptedSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<VesselPosition>, FetchError> {
        let (respond, rx) = oneshot::channel();
        self.fetches
            .send(PendingFetch {
                request: *request,
                respond,
            })
            .unwrap();

        match rx.await {
            Ok(result) => result,
            Err(e) => Err(TransportSnafu.into_error(Box::new(e))),
        }
    }
}

#[async_trait]
impl PushSource for ScriptedPushSource {
    async fn subscribe(&self) -> Result<PushStream, ChannelError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions.send(PushConnection { tx }).unwrap();
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}
