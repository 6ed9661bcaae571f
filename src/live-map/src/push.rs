use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt, stream};
use http_client::Url;
use snafu::{IntoError, OptionExt};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};
use tracing::{debug, info, warn};
use tracking_core::{
    ChannelError, PushSignal, PushSource, PushStream,
    channel_error::{HandshakeSnafu, StreamSnafu, SubscribeSnafu, UnsupportedSchemeSnafu},
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

static SOCKET_IO_PATH: &str = "/socket.io/";
static ENGINE_IO_VERSION: &str = "4";

static CONNECT_PACKET: &str = "40";
static PONG_PACKET: &str = "3";

pub static SUBSCRIBE_EVENT: &str = "subscribe:vessels";
pub static POSITION_UPDATED_EVENT: &str = "vessel:position:updated";
pub static VESSEL_UPDATE_EVENT: &str = "vessel:update";

/// Subscribes to the vessel room of the realtime Socket.IO server over the websocket
/// transport.
#[derive(Debug, Clone)]
pub struct SocketIoPushSource {
    endpoint: Url,
    token: Option<String>,
    connect_timeout: Duration,
}

/// A text frame as seen by the default Socket.IO namespace. Engine.IO packets carry a single
/// digit type, Socket.IO packets ride inside Engine.IO messages (`4`) with a second digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Open,
    Close,
    Ping,
    Connected,
    ConnectError(String),
    Disconnected,
    Event(String),
    Ignored,
}

impl SocketIoPushSource {
    /// `url` is the server root, `http(s)` urls are mapped to `ws(s)`. Without a path the
    /// default Socket.IO mount point is used.
    pub fn new(
        url: Url,
        token: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let mut endpoint = url;
        let scheme = match endpoint.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return UnsupportedSchemeSnafu {
                    scheme: other.to_string(),
                }
                .fail();
            }
        };
        endpoint
            .set_scheme(scheme)
            .ok()
            .context(UnsupportedSchemeSnafu {
                scheme: endpoint.scheme().to_string(),
            })?;

        if endpoint.path() == "/" {
            endpoint.set_path(SOCKET_IO_PATH);
        }
        endpoint
            .query_pairs_mut()
            .append_pair("EIO", ENGINE_IO_VERSION)
            .append_pair("transport", "websocket");

        Ok(Self {
            endpoint,
            token,
            connect_timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn connect(&self) -> Result<Socket, ChannelError> {
        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| SubscribeSnafu.into_error(e.into()))?;

        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SubscribeSnafu.into_error(e.into()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (mut socket, _) = connect_async(request)
            .await
            .map_err(|e| SubscribeSnafu.into_error(e.into()))?;

        match next_packet(&mut socket).await? {
            Some(Packet::Open) => {}
            other => {
                return HandshakeSnafu {
                    message: format!("expected an open packet, got {other:?}"),
                }
                .fail();
            }
        }

        send(&mut socket, CONNECT_PACKET).await?;

        loop {
            match next_packet(&mut socket).await? {
                Some(Packet::Connected) => break,
                Some(Packet::Ping) => send(&mut socket, PONG_PACKET).await?,
                Some(Packet::ConnectError(message)) => return HandshakeSnafu { message }.fail(),
                None | Some(Packet::Close | Packet::Disconnected) => {
                    return HandshakeSnafu {
                        message: "closed before the namespace was joined",
                    }
                    .fail();
                }
                Some(other) => debug!("ignoring {other:?} before the namespace was joined"),
            }
        }

        send(&mut socket, &format!("42[\"{SUBSCRIBE_EVENT}\"]")).await?;

        Ok(socket)
    }
}

#[async_trait]
impl PushSource for SocketIoPushSource {
    async fn subscribe(&self) -> Result<PushStream, ChannelError> {
        let socket = timeout(self.connect_timeout, self.connect())
            .await
            .map_err(|e| SubscribeSnafu.into_error(e.into()))??;

        info!("subscribed to push channel at '{}'", self.endpoint);

        let signals = stream::unfold(Some(socket), |socket| async move {
            let mut socket = socket?;
            loop {
                let packet = match next_packet(&mut socket).await {
                    Ok(Some(packet)) => packet,
                    Ok(None) => return None,
                    Err(e) => return Some((Err(e), None)),
                };

                match packet {
                    Packet::Ping => {
                        if let Err(e) = send(&mut socket, PONG_PACKET).await {
                            return Some((Err(e), None));
                        }
                    }
                    Packet::Close | Packet::Disconnected => return None,
                    Packet::Event(name) => {
                        if let Some(signal) = event_signal(&name) {
                            return Some((Ok(signal), Some(socket)));
                        }
                    }
                    _ => {}
                }
            }
        });

        Ok(signals.boxed())
    }
}

async fn send(socket: &mut Socket, packet: &str) -> Result<(), ChannelError> {
    socket
        .send(Message::text(packet.to_string()))
        .await
        .map_err(|e| StreamSnafu.into_error(e.into()))
}

/// Next text frame as a packet, `None` once the websocket is closed.
async fn next_packet(socket: &mut Socket) -> Result<Option<Packet>, ChannelError> {
    while let Some(message) = socket.next().await {
        match message.map_err(|e| StreamSnafu.into_error(e.into()))? {
            Message::Text(frame) => return Ok(Some(parse_packet(frame.as_str()))),
            Message::Close(_) => return Ok(None),
            _ => {}
        }
    }
    Ok(None)
}

pub fn parse_packet(frame: &str) -> Packet {
    let mut chars = frame.chars();
    match (chars.next(), chars.next()) {
        (Some('0'), _) => Packet::Open,
        (Some('1'), _) => Packet::Close,
        (Some('2'), _) => Packet::Ping,
        (Some('4'), Some('0')) => Packet::Connected,
        (Some('4'), Some('1')) => Packet::Disconnected,
        (Some('4'), Some('4')) => Packet::ConnectError(frame[2..].to_string()),
        (Some('4'), Some('2')) => match event_name(&frame[2..]) {
            Some(name) => Packet::Event(name),
            None => {
                warn!("ignoring malformed push event: '{frame}'");
                Packet::Ignored
            }
        },
        _ => Packet::Ignored,
    }
}

/// Event packets are `[<ns>,][<ack id>]["name", ...args]`.
fn event_name(payload: &str) -> Option<String> {
    let payload = match payload.strip_prefix('/') {
        Some(namespaced) => &namespaced[namespaced.find(',')? + 1..],
        None => payload,
    };
    let payload = payload.trim_start_matches(|c: char| c.is_ascii_digit());

    let args: Vec<serde_json::Value> = serde_json::from_str(payload).ok()?;
    args.into_iter().next()?.as_str().map(ToString::to_string)
}

fn event_signal(name: &str) -> Option<PushSignal> {
    match name {
        e if e == POSITION_UPDATED_EVENT || e == VESSEL_UPDATE_EVENT => {
            Some(PushSignal::PositionsUpdated)
        }
        "subscription_confirmed" | "connection_response" => Some(PushSignal::Subscribed),
        other => {
            debug!("ignoring push event '{other}'");
            None
        }
    }
}

/// Maps a single text frame of the channel to a signal, `None` for frames that should be
/// ignored.
pub fn parse_signal(frame: &str) -> Option<PushSignal> {
    match parse_packet(frame) {
        Packet::Event(name) => event_signal(&name),
        _ => None,
    }
}
