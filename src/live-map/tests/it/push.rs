use std::time::Duration;

use futures::{SinkExt, StreamExt};
use http_client::Url;
use live_map::push::SocketIoPushSource;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
};
use tokio_tungstenite::{
    WebSocketStream, accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};
use tracking_core::{ChannelError, PushSignal, PushSource};

type ServerSocket = WebSocketStream<TcpStream>;

static OPEN_PACKET: &str =
    r#"0{"sid":"eio","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

/// What the client sent in its upgrade request.
#[derive(Debug)]
struct Upgrade {
    uri: String,
    authorization: Option<String>,
}

/// Accepts a single websocket connection and hands it to `script`.
async fn serve<F, Fut>(script: F) -> (Url, oneshot::Receiver<Upgrade>)
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (upgrade_tx, upgrade_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let socket = accept_hdr_async(stream, |request: &Request, response: Response| {
            let _ = upgrade_tx.send(Upgrade {
                uri: request.uri().to_string(),
                authorization: request
                    .headers()
                    .get("Authorization")
                    .map(|v| v.to_str().unwrap().to_string()),
            });
            Ok::<_, ErrorResponse>(response)
        })
        .await
        .unwrap();
        script(socket).await;
    });

    (Url::parse(&format!("http://{addr}")).unwrap(), upgrade_rx)
}

async fn send(socket: &mut ServerSocket, frame: &str) {
    socket.send(Message::text(frame.to_string())).await.unwrap();
}

async fn expect(socket: &mut ServerSocket, frame: &str) {
    let message = socket.next().await.unwrap().unwrap();
    assert_eq!(message.to_text().unwrap(), frame);
}

fn source(url: Url) -> SocketIoPushSource {
    SocketIoPushSource::new(url, Some("secret".into()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_subscription_joins_the_vessel_room_and_streams_refresh_signals() {
    let (url, upgrade) = serve(|mut socket| async move {
        send(&mut socket, OPEN_PACKET).await;
        expect(&mut socket, "40").await;
        send(&mut socket, r#"40{"sid":"sio"}"#).await;
        send(
            &mut socket,
            r#"42["connection_response",{"data":"Connected to real-time server"}]"#,
        )
        .await;

        expect(&mut socket, r#"42["subscribe:vessels"]"#).await;
        send(
            &mut socket,
            r#"42["subscription_confirmed",{"channel":"vessels"}]"#,
        )
        .await;

        send(&mut socket, "2").await;
        expect(&mut socket, "3").await;

        send(
            &mut socket,
            r#"42["vessel:update",{"success":true,"count":0,"data":[]}]"#,
        )
        .await;
        send(&mut socket, r#"42["health:update",{}]"#).await;
        send(&mut socket, "42not an event").await;
        send(
            &mut socket,
            r#"42["vessel:position:updated",{"mmsi":"257000001"}]"#,
        )
        .await;
        send(&mut socket, "41").await;
    })
    .await;

    let signals: Vec<PushSignal> = source(url)
        .subscribe()
        .await
        .unwrap()
        .map(|s| s.unwrap())
        .collect()
        .await;

    assert_eq!(
        signals,
        vec![
            PushSignal::Subscribed,
            PushSignal::Subscribed,
            PushSignal::PositionsUpdated,
            PushSignal::PositionsUpdated,
        ]
    );

    let upgrade = upgrade.await.unwrap();
    assert_eq!(upgrade.uri, "/socket.io/?EIO=4&transport=websocket");
    assert_eq!(upgrade.authorization.as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn test_refused_namespace_is_a_handshake_error() {
    let (url, _) = serve(|mut socket| async move {
        send(&mut socket, OPEN_PACKET).await;
        expect(&mut socket, "40").await;
        send(&mut socket, r#"44{"message":"Not authorized"}"#).await;
        // Keep the socket open until the client gives up.
        let _ = socket.next().await;
    })
    .await;

    let result = source(url).subscribe().await;

    assert!(matches!(result, Err(ChannelError::Handshake { .. })));
}

#[tokio::test]
async fn test_server_without_websocket_is_a_subscribe_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = source(Url::parse(&format!("http://{addr}")).unwrap())
        .subscribe()
        .await;

    assert!(matches!(result, Err(ChannelError::Subscribe { .. })));
}
