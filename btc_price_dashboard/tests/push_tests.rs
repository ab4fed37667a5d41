use std::net::SocketAddr;
use std::time::Duration;

use btc_price_dashboard::services::{parse_frame, speaks_socket_io, PushFrame};
use btc_price_dashboard::*;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

fn socket_io_url(addr: SocketAddr) -> String {
    format!("ws://{}/socket.io/?EIO=4&transport=websocket", addr)
}

/// Collects source events until `Disconnected` or five quiet seconds.
async fn collect_events(events_rx: &mut mpsc::Receiver<RefreshEvent>) -> Vec<RefreshEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_secs(5), events_rx.recv()).await
    {
        let done = matches!(event, RefreshEvent::Disconnected);
        events.push(event);
        if done {
            break;
        }
    }
    events
}

const UPDATE: &str = r#"{"currency":"BTC","price":86321.5,"timestamp":"2025-03-01T15:04:05Z"}"#;

#[test]
fn test_parse_json_envelope() {
    let frame = parse_frame(&format!(r#"{{"event":"priceUpdate","data":{}}}"#, UPDATE)).unwrap();
    match frame {
        PushFrame::PriceUpdate(update) => {
            assert_eq!(update.currency, "BTC");
            assert_eq!(update.price, 86321.5);
        }
        other => panic!("unexpected frame {:?}", other),
    }

    let other = parse_frame(r#"{"event":"heartbeat","data":null}"#).unwrap();
    assert_eq!(other, PushFrame::Ignored);
}

#[test]
fn test_parse_socket_io_packets() {
    assert_eq!(
        parse_frame(r#"0{"sid":"abc","pingInterval":25000,"pingTimeout":20000}"#).unwrap(),
        PushFrame::Open
    );
    assert_eq!(parse_frame("2").unwrap(), PushFrame::Ping);
    assert_eq!(parse_frame("3").unwrap(), PushFrame::Ignored);
    assert_eq!(parse_frame(r#"40{"sid":"xyz"}"#).unwrap(), PushFrame::Connect);
    assert_eq!(parse_frame("41").unwrap(), PushFrame::Disconnect);

    let event = parse_frame(&format!(r#"42["priceUpdate",{}]"#, UPDATE)).unwrap();
    assert!(matches!(event, PushFrame::PriceUpdate(ref u) if u.price == 86321.5));

    let namespaced = parse_frame(&format!(r#"42/prices,7["priceUpdate",{}]"#, UPDATE)).unwrap();
    assert!(matches!(namespaced, PushFrame::PriceUpdate(_)));

    assert_eq!(
        parse_frame(r#"42["chat",{"text":"hi"}]"#).unwrap(),
        PushFrame::Ignored
    );
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(parse_frame("").is_err());
    assert!(parse_frame("x").is_err());
    assert!(parse_frame(r#"42["priceUpdate",{"price":"soon"}]"#).is_err());
    assert!(parse_frame("42[]").is_err());

    let refused = parse_frame(r#"44{"message":"unauthorized"}"#).unwrap_err();
    assert_eq!(refused.kind(), ErrorKind::Channel);
}

#[tokio::test]
async fn test_push_source_speaks_socket_io() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (reply_tx, reply_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(Message::Text(r#"0{"sid":"abc","pingInterval":25000}"#.into()))
            .await
            .unwrap();
        let reply = ws.next().await.unwrap().unwrap();
        let _ = reply_tx.send(reply.to_text().unwrap().to_string());

        ws.send(Message::Text(r#"40{"sid":"xyz"}"#.into())).await.unwrap();
        ws.send(Message::Text(format!(r#"42["priceUpdate",{}]"#, UPDATE).into()))
            .await
            .unwrap();
        ws.send(Message::Text(r#"42["priceUpdate",{"price":"bad"}]"#.into()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let source: Box<dyn UpdateSource> = Box::new(PushSource::new(socket_io_url(addr)));
    assert_eq!(source.name(), "push");
    let _task = source.start(events_tx);
    let events = collect_events(&mut events_rx).await;

    assert_eq!(reply_rx.await.unwrap(), "40");
    assert!(matches!(events.first(), Some(RefreshEvent::Connected)));
    assert!(matches!(events.last(), Some(RefreshEvent::Disconnected)));

    let updates: Vec<&PriceUpdate> = events
        .iter()
        .filter_map(|e| match e {
            RefreshEvent::Update(update) => Some(update),
            _ => None,
        })
        .collect();
    assert_eq!(updates.len(), 1);
    match updates[0] {
        PriceUpdate::Single(point) => assert_eq!(point.price, 86321.5),
        other => panic!("unexpected update {:?}", other),
    }

    assert!(events.iter().any(|e| matches!(e, RefreshEvent::Failed(_))));
}

#[tokio::test]
async fn test_push_source_reports_unreachable_channel() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (events_tx, mut events_rx) = mpsc::channel(4);
    let _task = Box::new(PushSource::new(format!("ws://{}", addr))).start(events_tx);

    let first = events_rx.recv().await.unwrap();
    assert!(matches!(first, RefreshEvent::Failed(ref e) if e.kind() == ErrorKind::Channel));
    assert!(matches!(events_rx.recv().await, Some(RefreshEvent::Disconnected)));
}

#[test]
fn test_socket_io_urls_are_recognized() {
    assert!(speaks_socket_io("ws://localhost:4000/socket.io/?EIO=4&transport=websocket"));
    assert!(speaks_socket_io("wss://feed.example.com/?EIO=4&transport=websocket"));
    assert!(!speaks_socket_io("ws://localhost:4000/prices"));
}

#[tokio::test]
async fn test_refused_socket_io_handshake_never_goes_realtime() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        ws.send(Message::Text(r#"0{"sid":"abc","pingInterval":25000}"#.into()))
            .await
            .unwrap();
        let _ = ws.next().await;
        ws.send(Message::Text(r#"44{"message":"unauthorized"}"#.into()))
            .await
            .unwrap();
        // Leave the socket open; the client has to hang up on its own.
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let _task = Box::new(PushSource::new(socket_io_url(addr))).start(events_tx);
    let events = collect_events(&mut events_rx).await;

    assert!(!events.iter().any(|e| matches!(e, RefreshEvent::Connected)));
    assert!(events
        .iter()
        .any(|e| matches!(e, RefreshEvent::Failed(err) if err.kind() == ErrorKind::Channel)));
    assert!(matches!(events.last(), Some(RefreshEvent::Disconnected)));

    let mut controller = RefreshController::new();
    for event in events {
        controller.handle_event(event);
        assert_ne!(controller.connection(), ConnectionStatus::Realtime);
    }
    assert_eq!(controller.connection(), ConnectionStatus::Disconnected);
}

#[tokio::test]
async fn test_plain_websocket_reports_connected_on_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(format!(r#"{{"event":"priceUpdate","data":{}}}"#, UPDATE).into()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let (events_tx, mut events_rx) = mpsc::channel(16);
    let _task = Box::new(PushSource::new(format!("ws://{}/prices", addr))).start(events_tx);
    let events = collect_events(&mut events_rx).await;

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], RefreshEvent::Connected));
    assert!(matches!(events[1], RefreshEvent::Update(PriceUpdate::Single(ref p)) if p.price == 86321.5));
    assert!(matches!(events[2], RefreshEvent::Disconnected));
}
