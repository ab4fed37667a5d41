use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::errors::{DashboardError, Result};
use crate::models::{PricePoint, PriceUpdateEvent};
use crate::services::source::{RefreshEvent, UpdateSource};

pub const PRICE_UPDATE_EVENT: &str = "priceUpdate";

/// One decoded text frame from the push channel.
///
/// Two encodings are accepted: a JSON envelope
/// `{"event": "priceUpdate", "data": {...}}` and Socket.IO v4 packets
/// carried over Engine.IO (`0{..}` open, `2` ping, `40` connect,
/// `42["priceUpdate",{..}]` event).
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    Open,
    Connect,
    Ping,
    PriceUpdate(PriceUpdateEvent),
    Disconnect,
    Ignored,
}

#[derive(Deserialize)]
struct PushEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

pub fn parse_frame(text: &str) -> Result<PushFrame> {
    let text = text.trim();
    if text.starts_with('{') {
        let envelope: PushEnvelope = serde_json::from_str(text)?;
        return event_frame(&envelope.event, envelope.data);
    }

    let (packet_type, rest) = split_packet_type(text)?;
    match packet_type {
        '0' => Ok(PushFrame::Open),
        '1' => Ok(PushFrame::Disconnect),
        '2' => Ok(PushFrame::Ping),
        '3' | '6' => Ok(PushFrame::Ignored),
        '4' => parse_socket_io(rest),
        other => Err(DashboardError::InvalidDataFormat(format!(
            "unknown engine.io packet type '{}'",
            other
        ))),
    }
}

fn parse_socket_io(packet: &str) -> Result<PushFrame> {
    let (packet_type, rest) = split_packet_type(packet)?;
    match packet_type {
        '0' => Ok(PushFrame::Connect),
        '1' => Ok(PushFrame::Disconnect),
        '2' => {
            let rest = strip_namespace(rest).trim_start_matches(|c: char| c.is_ascii_digit());
            let mut args: Vec<Value> = serde_json::from_str(rest)?;
            if args.is_empty() {
                return Err(DashboardError::InvalidDataFormat(
                    "socket.io event without a name".to_string(),
                ));
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                other => {
                    return Err(DashboardError::InvalidDataFormat(format!(
                        "socket.io event name is not a string: {}",
                        other
                    )))
                }
            };
            let payload = if args.is_empty() { Value::Null } else { args.remove(0) };
            event_frame(&name, payload)
        }
        '4' => Err(DashboardError::ChannelClosed(format!(
            "server refused connection: {}",
            rest
        ))),
        _ => Ok(PushFrame::Ignored),
    }
}

fn split_packet_type(text: &str) -> Result<(char, &str)> {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) => Ok((c, chars.as_str())),
        None => Err(DashboardError::InvalidDataFormat("empty push frame".to_string())),
    }
}

fn strip_namespace(packet: &str) -> &str {
    if packet.starts_with('/') {
        packet.find(',').map(|i| &packet[i + 1..]).unwrap_or("")
    } else {
        packet
    }
}

fn event_frame(name: &str, payload: Value) -> Result<PushFrame> {
    if name == PRICE_UPDATE_EVENT {
        Ok(PushFrame::PriceUpdate(serde_json::from_value(payload)?))
    } else {
        tracing::debug!("Ignoring push event '{}'", name);
        Ok(PushFrame::Ignored)
    }
}

/// Socket.IO endpoints look like `ws://host/socket.io/?EIO=4&transport=websocket`.
pub fn speaks_socket_io(url: &str) -> bool {
    url.contains("/socket.io") || url.contains("EIO=")
}

/// Push channel over a WebSocket. No reconnects: once the socket closes the
/// source reports `Disconnected` and ends.
pub struct PushSource {
    url: String,
}

impl PushSource {
    pub fn new(url: impl Into<String>) -> Self {
        PushSource { url: url.into() }
    }
}

impl UpdateSource for PushSource {
    fn name(&self) -> &'static str {
        "push"
    }

    fn start(self: Box<Self>, events: mpsc::Sender<RefreshEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let (socket, _) = match connect_async(self.url.as_str()).await {
                Ok(connected) => connected,
                Err(e) => {
                    tracing::error!("Push channel {} unreachable: {}", self.url, e);
                    let _ = events.send(RefreshEvent::Failed(e.into())).await;
                    let _ = events.send(RefreshEvent::Disconnected).await;
                    return;
                }
            };

            // Socket.IO reports connected only once the namespace handshake (`40`) lands.
            let socket_io = speaks_socket_io(&self.url);
            tracing::info!(socket_io, "Opened push channel {}", self.url);
            if !socket_io && events.send(RefreshEvent::Connected).await.is_err() {
                return;
            }

            let (mut sink, mut stream) = socket.split();
            while let Some(message) = stream.next().await {
                let event = match message {
                    Ok(Message::Text(text)) => match parse_frame(text.as_str()) {
                        Ok(PushFrame::PriceUpdate(update)) => {
                            tracing::debug!(price = update.price, "Received priceUpdate");
                            Some(RefreshEvent::Update(PricePoint::from(update).into()))
                        }
                        Ok(PushFrame::Open) => match sink.send(Message::Text("40".into())).await {
                            Ok(()) => None,
                            Err(e) => Some(RefreshEvent::Failed(e.into())),
                        },
                        Ok(PushFrame::Ping) => match sink.send(Message::Text("3".into())).await {
                            Ok(()) => None,
                            Err(e) => Some(RefreshEvent::Failed(e.into())),
                        },
                        Ok(PushFrame::Connect) => Some(RefreshEvent::Connected),
                        Ok(PushFrame::Disconnect) => break,
                        Ok(PushFrame::Ignored) => None,
                        Err(e @ DashboardError::ChannelClosed(_)) => {
                            tracing::warn!("Push channel {} refused: {}", self.url, e);
                            let _ = events.send(RefreshEvent::Failed(e)).await;
                            break;
                        }
                        Err(e) => Some(RefreshEvent::Failed(e)),
                    },
                    Ok(Message::Close(frame)) => {
                        tracing::debug!("Push channel closed by server: {:?}", frame);
                        break;
                    }
                    Ok(_) => None,
                    Err(e) => {
                        let _ = events.send(RefreshEvent::Failed(e.into())).await;
                        break;
                    }
                };

                if let Some(event) = event {
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
            }

            let _ = events.send(RefreshEvent::Disconnected).await;
        })
    }
}
