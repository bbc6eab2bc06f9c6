//! Realtime Vote Channel
//!
//! Subscribes to rating-event inserts over the service's realtime
//! websocket and forwards each matching row into an in-process
//! channel, preserving arrival order. Delivery is best-effort and
//! at-most-once: there is no dedup, no replay of events missed while
//! disconnected, and no reconnect - a dropped socket simply ends the
//! stream and the next login re-subscribes.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::traits::{SubscriptionGuard, VoteSubscription};
use crate::profile::ProfileId;
use crate::votes::VoteInsert;

/// Phoenix heartbeat interval keeping the channel open.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Buffered inserts before the forwarder applies backpressure.
const CHANNEL_CAPACITY: usize = 64;

/// Derive the realtime websocket endpoint from the service base URL.
pub(super) fn websocket_url(base_url: &str, anon_key: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("wss://{base_url}")
    };
    format!("{ws_base}/realtime/v1/websocket?apikey={anon_key}&vsn=1.0.0")
}

/// The channel topic filtering inserts to one target profile.
fn topic_for(target: ProfileId) -> String {
    format!("realtime:public:votes:voted_for_id=eq.{target}")
}

/// Extract an inserted vote row from one incoming channel frame.
/// Returns `None` for heartbeat replies, join acks and anything that
/// is not an INSERT carrying a well-formed row.
pub(super) fn parse_insert(text: &str) -> Option<VoteInsert> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    if value["event"].as_str() != Some("INSERT") {
        return None;
    }
    serde_json::from_value(value["payload"]["record"].clone()).ok()
}

/// Open the subscription and spawn its forwarding task.
pub(super) fn spawn_subscription(
    ws_url: String,
    access_token: Option<String>,
    target: ProfileId,
) -> VoteSubscription {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let handle = tokio::spawn(run_subscription(ws_url, access_token, target, tx));
    VoteSubscription::with_guard(rx, SubscriptionGuard::new(handle))
}

async fn run_subscription(
    ws_url: String,
    access_token: Option<String>,
    target: ProfileId,
    tx: mpsc::Sender<VoteInsert>,
) {
    let (mut socket, _) = match connect_async(ws_url.as_str()).await {
        Ok(pair) => pair,
        Err(err) => {
            tracing::warn!("realtime connect failed: {err}");
            return;
        }
    };

    let topic = topic_for(target);
    let join = json!({
        "topic": topic,
        "event": "phx_join",
        "payload": { "user_token": access_token },
        "ref": "1",
    });
    if let Err(err) = socket.send(Message::Text(join.to_string())).await {
        tracing::warn!("realtime join failed: {err}");
        return;
    }
    tracing::debug!("realtime channel joined: {topic}");

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick fires immediately
    let mut heartbeat_ref: u64 = 2;

    loop {
        tokio::select! {
            frame = socket.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(insert) = parse_insert(&text) {
                            if tx.send(insert).await.is_err() {
                                // Receiver gone: the session ended.
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = socket.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!("realtime channel closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::warn!("realtime stream error: {err}");
                        break;
                    }
                }
            }
            _ = heartbeat.tick() => {
                let beat = json!({
                    "topic": "phoenix",
                    "event": "heartbeat",
                    "payload": {},
                    "ref": heartbeat_ref.to_string(),
                });
                heartbeat_ref += 1;
                if socket.send(Message::Text(beat.to_string())).await.is_err() {
                    break;
                }
            }
        }
    }
}
