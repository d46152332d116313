use std::collections::HashSet;

use crate::{error::ClientError, types::LiveChannelState};

/// Live update channel state machine:
/// `Disconnected → Connecting → Open`, with `Closed` as the terminal
/// teardown state.
///
/// Transport loss returns the machine to `Disconnected`, from where the
/// reconnect loop may attempt a fresh `begin_connect`. `close` is valid from
/// any state and idempotent, so unmount paths never fail.
#[derive(Debug, Clone)]
pub struct LiveChannelLifecycle {
    state: LiveChannelState,
}

impl Default for LiveChannelLifecycle {
    fn default() -> Self {
        Self {
            state: LiveChannelState::Disconnected,
        }
    }
}

impl LiveChannelLifecycle {
    /// Current lifecycle state.
    pub fn state(&self) -> LiveChannelState {
        self.state
    }

    /// Start a connection attempt.
    pub fn begin_connect(&mut self) -> Result<LiveChannelState, ClientError> {
        if self.state != LiveChannelState::Disconnected {
            return Err(ClientError::invalid_channel_state(
                self.state,
                "begin_connect",
            ));
        }
        self.state = LiveChannelState::Connecting;
        Ok(self.state)
    }

    /// The connection attempt succeeded.
    pub fn mark_open(&mut self) -> Result<LiveChannelState, ClientError> {
        if self.state != LiveChannelState::Connecting {
            return Err(ClientError::invalid_channel_state(self.state, "mark_open"));
        }
        self.state = LiveChannelState::Open;
        Ok(self.state)
    }

    /// Transport-level loss; a reconnect may follow.
    pub fn mark_lost(&mut self) -> Result<LiveChannelState, ClientError> {
        match self.state {
            LiveChannelState::Connecting | LiveChannelState::Open => {
                self.state = LiveChannelState::Disconnected;
                Ok(self.state)
            }
            other => Err(ClientError::invalid_channel_state(other, "mark_lost")),
        }
    }

    /// Deterministic teardown on leaving the room view. Idempotent.
    pub fn close(&mut self) -> LiveChannelState {
        self.state = LiveChannelState::Closed;
        self.state
    }
}

/// De-duplicates messages redelivered across reconnect boundaries.
///
/// Within a single connection nothing is filtered: if the backend delivers
/// the same message ID twice on one connection, both copies pass through
/// (its delivery guarantee is unconfirmed, so the store stays
/// duplicate-tolerant). Only IDs already delivered on a *previous*
/// connection are suppressed, which keeps reconnect replays from doubling
/// the visible log.
#[derive(Debug, Clone, Default)]
pub struct RedeliveryFilter {
    prior: HashSet<String>,
    current: HashSet<String>,
}

impl RedeliveryFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a message with this ID should be delivered.
    pub fn admit(&mut self, message_id: &str) -> bool {
        if self.prior.contains(message_id) {
            return false;
        }
        self.current.insert(message_id.to_owned());
        true
    }

    /// Fold the finished connection's IDs into the replay-suppression set.
    pub fn connection_lost(&mut self) {
        self.prior.extend(self.current.drain());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_connect_open_lost_cycle() {
        let mut lifecycle = LiveChannelLifecycle::default();
        assert_eq!(lifecycle.state(), LiveChannelState::Disconnected);

        lifecycle.begin_connect().expect("connect should work");
        lifecycle.mark_open().expect("open should work");
        lifecycle.mark_lost().expect("lost should work");
        assert_eq!(lifecycle.state(), LiveChannelState::Disconnected);

        // Reconnect attempt from Disconnected is valid again.
        lifecycle.begin_connect().expect("reconnect should work");
        assert_eq!(lifecycle.state(), LiveChannelState::Connecting);
    }

    #[test]
    fn rejects_open_without_connect() {
        let mut lifecycle = LiveChannelLifecycle::default();
        let err = lifecycle
            .mark_open()
            .expect_err("open without connect should fail");
        assert_eq!(err.code, "invalid_state_transition");
    }

    #[test]
    fn close_is_terminal_and_idempotent() {
        let mut lifecycle = LiveChannelLifecycle::default();
        lifecycle.begin_connect().expect("connect should work");

        assert_eq!(lifecycle.close(), LiveChannelState::Closed);
        assert_eq!(lifecycle.close(), LiveChannelState::Closed);

        let err = lifecycle
            .begin_connect()
            .expect_err("connect after close should fail");
        assert_eq!(err.code, "invalid_state_transition");
    }

    #[test]
    fn admits_duplicates_within_one_connection() {
        let mut filter = RedeliveryFilter::new();
        assert!(filter.admit("m1"));
        assert!(filter.admit("m1"));
    }

    #[test]
    fn suppresses_redelivery_after_reconnect() {
        let mut filter = RedeliveryFilter::new();
        assert!(filter.admit("m1"));
        assert!(filter.admit("m2"));

        filter.connection_lost();

        assert!(!filter.admit("m1"));
        assert!(!filter.admit("m2"));
        assert!(filter.admit("m3"));
    }

    #[test]
    fn suppression_survives_multiple_reconnects() {
        let mut filter = RedeliveryFilter::new();
        assert!(filter.admit("m1"));
        filter.connection_lost();

        assert!(filter.admit("m2"));
        filter.connection_lost();

        assert!(!filter.admit("m1"));
        assert!(!filter.admit("m2"));
    }
}
