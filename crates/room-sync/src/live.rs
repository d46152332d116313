//! Live update channel: one WebSocket subscription per active room.
//!
//! The task connects to the room's broadcast topic, forwards `new_message`
//! frames as [`ClientEvent::MessageReceived`], and reconnects on transport
//! loss with bounded exponential backoff plus jitter. Messages redelivered
//! across a reconnect boundary are suppressed by ID; duplicates within one
//! connection pass through untouched. Leaving the room cancels the task,
//! which closes the socket deterministically.

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use room_core::{
    ClientError, ClientEvent, ErrorCategory, LiveChannelLifecycle, LiveChannelState, LiveFrame,
    RedeliveryFilter, RetryPolicy,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

/// Running live channel task plus its cancellation handle.
#[derive(Debug)]
pub struct RunningLiveChannel {
    pub(crate) stop: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

impl RunningLiveChannel {
    /// Cancel the task and wait for the socket to close.
    pub async fn shutdown(self) {
        self.stop.cancel();
        let _ = self.task.await;
    }
}

/// Derive the per-room WebSocket endpoint from the REST base URL.
///
/// The topic is keyed by room only; every participant shares it.
pub fn ws_url_for_room(base_url: &Url, room_id: &str) -> Result<Url, ClientError> {
    let mut url = base_url.clone();
    let scheme = match base_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::new(
                ErrorCategory::Config,
                "invalid_url",
                format!("cannot derive websocket endpoint from scheme '{other}'"),
            ));
        }
    };
    url.set_scheme(scheme).map_err(|()| {
        ClientError::new(
            ErrorCategory::Config,
            "invalid_url",
            "failed switching URL scheme for websocket endpoint",
        )
    })?;
    url.set_path(&format!("/ws/{room_id}"));
    url.set_query(None);
    Ok(url)
}

/// Spawn the live channel task for a room.
pub fn spawn_live_channel(
    base_url: &Url,
    room_id: &str,
    retry: RetryPolicy,
    event_tx: broadcast::Sender<ClientEvent>,
) -> Result<RunningLiveChannel, ClientError> {
    let url = ws_url_for_room(base_url, room_id)?;
    let stop = CancellationToken::new();
    let stop_child = stop.child_token();
    let task = tokio::spawn(async move {
        run_live_channel(url, retry, event_tx, stop_child).await;
    });

    Ok(RunningLiveChannel { stop, task })
}

async fn run_live_channel(
    url: Url,
    retry: RetryPolicy,
    event_tx: broadcast::Sender<ClientEvent>,
    stop: CancellationToken,
) {
    let mut lifecycle = LiveChannelLifecycle::default();
    let mut filter = RedeliveryFilter::new();
    let mut attempt: u32 = 0;

    'outer: loop {
        if lifecycle.begin_connect().is_err() {
            break;
        }
        emit_status(&event_tx, LiveChannelState::Connecting, None);

        let connect = tokio::select! {
            _ = stop.cancelled() => break 'outer,
            result = connect_async(url.as_str()) => result,
        };

        match connect {
            Ok((stream, _response)) => {
                let _ = lifecycle.mark_open();
                attempt = 0;
                debug!(url = %url, "live channel open");
                emit_status(&event_tx, LiveChannelState::Open, None);

                let (mut write, mut read) = stream.split();
                loop {
                    tokio::select! {
                        _ = stop.cancelled() => {
                            // Best-effort close frame; teardown proceeds regardless.
                            let _ = write.send(WsMessage::Close(None)).await;
                            filter.connection_lost();
                            break 'outer;
                        }
                        frame = read.next() => match frame {
                            Some(Ok(WsMessage::Text(text))) => {
                                handle_frame(&text, &mut filter, &event_tx);
                            }
                            Some(Ok(WsMessage::Close(_))) | None => {
                                debug!("live channel closed by server");
                                break;
                            }
                            Some(Ok(_)) => {} // ping/pong/binary keepalive
                            Some(Err(err)) => {
                                warn!(error = %err, "live channel transport error");
                                break;
                            }
                        }
                    }
                }

                filter.connection_lost();
                let _ = lifecycle.mark_lost();
            }
            Err(err) => {
                warn!(error = %err, url = %url, "live channel connect failed");
                let _ = lifecycle.mark_lost();
            }
        }

        let delay = retry.jittered(
            retry.delay_for_attempt(attempt, None),
            rand::rng().random_range(0.0..=1.0),
        );
        attempt = attempt.saturating_add(1);
        emit_status(
            &event_tx,
            LiveChannelState::Disconnected,
            Some(delay.as_millis() as u64),
        );

        tokio::select! {
            _ = stop.cancelled() => break 'outer,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    lifecycle.close();
    emit_status(&event_tx, LiveChannelState::Closed, None);
}

/// Decode one inbound frame and forward accepted messages.
///
/// Malformed payloads and unknown frame types are log-and-continue; they
/// never tear the connection down.
fn handle_frame(
    text: &str,
    filter: &mut RedeliveryFilter,
    event_tx: &broadcast::Sender<ClientEvent>,
) {
    match serde_json::from_str::<LiveFrame>(text) {
        Ok(LiveFrame::NewMessage { message }) => {
            if !filter.admit(&message.id) {
                debug!(message_id = %message.id, "suppressing reconnect redelivery");
                return;
            }
            let _ = event_tx.send(ClientEvent::MessageReceived { message });
        }
        Ok(LiveFrame::Unknown) => trace!("ignoring unknown live frame type"),
        Err(err) => warn!(error = %err, "malformed live frame; skipping"),
    }
}

fn emit_status(
    event_tx: &broadcast::Sender<ClientEvent>,
    state: LiveChannelState,
    retry_in_ms: Option<u64>,
) {
    let _ = event_tx.send(ClientEvent::ChannelStatus { state, retry_in_ms });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_ws_url_from_http_base() {
        let base = Url::parse("http://localhost:8000").expect("valid base");
        let url = ws_url_for_room(&base, "483920").expect("should derive");
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/483920");
    }

    #[test]
    fn derives_wss_url_from_https_base() {
        let base = Url::parse("https://doubts.example.org/").expect("valid base");
        let url = ws_url_for_room(&base, "271828").expect("should derive");
        assert_eq!(url.as_str(), "wss://doubts.example.org/ws/271828");
    }

    #[test]
    fn rejects_non_http_schemes() {
        let base = Url::parse("ftp://example.org").expect("valid base");
        let err = ws_url_for_room(&base, "1").expect_err("ftp should be rejected");
        assert_eq!(err.code, "invalid_url");
    }

    #[test]
    fn forwards_new_message_frames() {
        let (event_tx, mut events) = broadcast::channel(8);
        let mut filter = RedeliveryFilter::new();

        handle_frame(
            r#"{"type":"new_message","message":{
                "id":"m1","room_id":"483920","user_id":"u1","user_name":"Asha",
                "content":"hello","message_type":"text",
                "timestamp":"2026-08-30T09:41:00"}}"#,
            &mut filter,
            &event_tx,
        );

        match events.try_recv().expect("event should be forwarded") {
            ClientEvent::MessageReceived { message } => assert_eq!(message.id, "m1"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn ignores_unknown_frame_types() {
        let (event_tx, mut events) = broadcast::channel(8);
        let mut filter = RedeliveryFilter::new();

        handle_frame(r#"{"type":"presence","who":"u1"}"#, &mut filter, &event_tx);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn skips_malformed_frames_without_failing() {
        let (event_tx, mut events) = broadcast::channel(8);
        let mut filter = RedeliveryFilter::new();

        handle_frame("not json at all", &mut filter, &event_tx);
        handle_frame(r#"{"type":"new_message","message":{"id":"m1"}}"#, &mut filter, &event_tx);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn suppresses_redelivery_only_across_connections() {
        let (event_tx, mut events) = broadcast::channel(8);
        let mut filter = RedeliveryFilter::new();
        let frame = r#"{"type":"new_message","message":{
            "id":"m1","room_id":"483920","user_id":"u1","user_name":"Asha",
            "content":"hello","message_type":"text",
            "timestamp":"2026-08-30T09:41:00"}}"#;

        handle_frame(frame, &mut filter, &event_tx);
        handle_frame(frame, &mut filter, &event_tx);
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_ok(), "same-connection duplicate kept");

        filter.connection_lost();
        handle_frame(frame, &mut filter, &event_tx);
        assert!(events.try_recv().is_err(), "reconnect redelivery suppressed");
    }
}
