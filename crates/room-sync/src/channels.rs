//! Channel plumbing between the runtime task and its front end.
//!
//! Commands flow through a bounded queue so a stalled runtime applies
//! backpressure to the caller; events fan out over a broadcast so any number
//! of views can watch one session. The pair lives here rather than in
//! `room-core` because the runtime loop is its only producer.

use room_core::{ClientCommand, ClientEvent};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

/// Receiver half handed to event consumers.
pub type EventStream = broadcast::Receiver<ClientEvent>;

/// The runtime loop has shut down and can take no more commands.
#[derive(Debug, Error)]
#[error("runtime command loop has shut down")]
pub struct CommandSendError;

/// Command intake and event fan-out for one runtime, cloneable across tasks.
#[derive(Clone, Debug)]
pub struct RuntimeChannels {
    commands: mpsc::Sender<ClientCommand>,
    events: broadcast::Sender<ClientEvent>,
}

impl RuntimeChannels {
    /// Build the pair; the command receiver goes to the runtime loop.
    pub fn new(command_depth: usize, event_depth: usize) -> (Self, mpsc::Receiver<ClientCommand>) {
        let (commands, command_rx) = mpsc::channel(command_depth.max(1));
        let (events, _) = broadcast::channel(event_depth.max(1));
        (Self { commands, events }, command_rx)
    }

    /// Queue one command, waiting if the queue is full.
    pub async fn send_command(&self, command: ClientCommand) -> Result<(), CommandSendError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CommandSendError)
    }

    /// Open a fresh event stream; only events emitted after this call arrive.
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    /// Sender side of the event fan-out, for tasks that emit directly.
    pub fn events(&self) -> broadcast::Sender<ClientEvent> {
        self.events.clone()
    }

    /// Publish one event. Delivery to any particular subscriber is not
    /// guaranteed; a slow one sees `Lagged` instead of blocking the runtime.
    pub fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_core::{LiveChannelState, SessionPhase};

    #[tokio::test]
    async fn queued_commands_reach_the_runtime_side() {
        let (channels, mut command_rx) = RuntimeChannels::new(2, 2);

        channels
            .send_command(ClientCommand::EnterRoom)
            .await
            .expect("queue has room");
        channels
            .send_command(ClientCommand::LeaveRoom)
            .await
            .expect("queue has room");

        assert_eq!(command_rx.recv().await, Some(ClientCommand::EnterRoom));
        assert_eq!(command_rx.recv().await, Some(ClientCommand::LeaveRoom));
    }

    #[tokio::test]
    async fn send_fails_once_the_runtime_side_is_gone() {
        let (channels, command_rx) = RuntimeChannels::new(2, 2);
        drop(command_rx);

        channels
            .send_command(ClientCommand::EnterRoom)
            .await
            .expect_err("no receiver left");
    }

    #[tokio::test]
    async fn every_subscriber_sees_emitted_events() {
        let (channels, _command_rx) = RuntimeChannels::new(1, 8);
        let mut console = channels.subscribe();
        let mut logger = channels.subscribe();

        channels.emit(ClientEvent::ChannelStatus {
            state: LiveChannelState::Open,
            retry_in_ms: None,
        });
        channels.emit(ClientEvent::SessionChanged {
            phase: SessionPhase::Active,
        });

        for stream in [&mut console, &mut logger] {
            assert!(matches!(
                stream.recv().await,
                Ok(ClientEvent::ChannelStatus { state: LiveChannelState::Open, .. })
            ));
            assert!(matches!(
                stream.recv().await,
                Ok(ClientEvent::SessionChanged { phase: SessionPhase::Active })
            ));
        }
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let (channels, _command_rx) = RuntimeChannels::new(1, 8);
        channels.emit(ClientEvent::SessionChanged {
            phase: SessionPhase::Credentialed,
        });

        let mut late = channels.subscribe();
        assert!(late.try_recv().is_err());
    }
}
