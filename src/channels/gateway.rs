//! Minimal gateway reader.
//!
//! Connects, identifies with the GUILDS intent, keeps the heartbeat going
//! and forwards every dispatch event to the dispatcher task. No session
//! resume: any close, error or reconnect request tears the session down and
//! a fresh IDENTIFY follows after a fixed delay.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::channels::ChannelError;

const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
const GUILDS_INTENT: u64 = 1 << 0;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const FALLBACK_HEARTBEAT_MS: u64 = 41_250;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

/// Dispatch event name plus its `d` payload.
pub type GatewayEvent = (String, Value);

/// Runs gateway sessions forever, reconnecting until the dispatcher side of
/// the channel goes away.
pub async fn run(token: String, events: mpsc::Sender<GatewayEvent>) {
    loop {
        match session(&token, &events).await {
            Ok(()) => info!("gateway session ended"),
            Err(err) => warn!("gateway connection lost: {}", err),
        }
        if events.is_closed() {
            return;
        }
        sleep(RECONNECT_DELAY).await;
    }
}

async fn session(token: &str, events: &mpsc::Sender<GatewayEvent>) -> Result<(), ChannelError> {
    let (stream, _) = connect_async(GATEWAY_URL)
        .await
        .map_err(|err| ChannelError::Gateway(format!("connect failed: {}", err)))?;
    let (mut writer, mut reader) = stream.split();

    let hello = next_payload(&mut reader, &mut writer).await?;
    if hello["op"].as_u64() != Some(10) {
        return Err(ChannelError::Gateway("expected HELLO".to_string()));
    }
    let heartbeat_ms = hello["d"]["heartbeat_interval"]
        .as_u64()
        .unwrap_or(FALLBACK_HEARTBEAT_MS);
    debug!("gateway HELLO, heartbeat every {}ms", heartbeat_ms);

    send_json(&mut writer, identify(token)).await?;

    let period = Duration::from_millis(heartbeat_ms);
    let mut heartbeat = interval_at(Instant::now() + period, period);
    let mut sequence: Option<u64> = None;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                send_json(&mut writer, json!({"op": 1, "d": sequence})).await?;
            }
            frame = reader.next() => {
                let Some(frame) = frame else {
                    return Err(ChannelError::Gateway("connection closed".to_string()));
                };
                let message = frame
                    .map_err(|err| ChannelError::Gateway(err.to_string()))?;
                let payload = match message {
                    Message::Text(text) => serde_json::from_str::<Value>(&text)
                        .map_err(|err| ChannelError::Gateway(format!("bad frame: {}", err)))?,
                    Message::Close(frame) => {
                        return Err(ChannelError::Gateway(format!(
                            "closed by server: {:?}",
                            frame
                        )));
                    }
                    Message::Ping(data) => {
                        writer
                            .send(Message::Pong(data))
                            .await
                            .map_err(|err| ChannelError::Gateway(err.to_string()))?;
                        continue;
                    }
                    _ => continue,
                };
                if let Some(seq) = payload["s"].as_u64() {
                    sequence = Some(seq);
                }
                match payload["op"].as_u64() {
                    Some(0) => {
                        let name = payload["t"].as_str().unwrap_or("").to_string();
                        if events.send((name, payload["d"].clone())).await.is_err() {
                            // dispatcher is gone, shut the reader down too
                            return Ok(());
                        }
                    }
                    Some(7) => {
                        return Err(ChannelError::Gateway(
                            "server requested reconnect".to_string(),
                        ));
                    }
                    Some(9) => {
                        return Err(ChannelError::Gateway("session invalidated".to_string()));
                    }
                    Some(11) => debug!("heartbeat acknowledged"),
                    other => debug!("ignoring gateway op {:?}", other),
                }
            }
        }
    }
}

/// Reads frames until a text payload shows up. Used for the HELLO that must
/// open every session.
async fn next_payload(reader: &mut WsReader, writer: &mut WsWriter) -> Result<Value, ChannelError> {
    loop {
        let frame = reader
            .next()
            .await
            .ok_or_else(|| ChannelError::Gateway("connection closed".to_string()))?
            .map_err(|err| ChannelError::Gateway(err.to_string()))?;
        match frame {
            Message::Text(text) => {
                return serde_json::from_str(&text)
                    .map_err(|err| ChannelError::Gateway(format!("bad frame: {}", err)));
            }
            Message::Ping(data) => {
                writer
                    .send(Message::Pong(data))
                    .await
                    .map_err(|err| ChannelError::Gateway(err.to_string()))?;
            }
            Message::Close(frame) => {
                return Err(ChannelError::Gateway(format!("closed by server: {:?}", frame)));
            }
            _ => {}
        }
    }
}

async fn send_json(writer: &mut WsWriter, payload: Value) -> Result<(), ChannelError> {
    writer
        .send(Message::Text(payload.to_string()))
        .await
        .map_err(|err| ChannelError::Gateway(err.to_string()))
}

fn identify(token: &str) -> Value {
    json!({
        "op": 2,
        "d": {
            "token": token,
            "intents": GUILDS_INTENT,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "ticketbot",
                "device": "ticketbot"
            }
        }
    })
}
