//! Console-side view state: reduces runtime events into printable lines.
//!
//! The reducer owns the message store for the room currently on screen and
//! turns each [`ClientEvent`] into zero or more lines for stdout. It holds
//! no async state; the REPL in `main` feeds it events one at a time.

use room_core::{
    AppendOutcome, ClientEvent, FilePayload, LiveChannelState, Message, MessageLog, MessageType,
    RoomAction, SessionPhase,
};
use tracing::debug;

/// Reduced view of the session for a line-oriented console.
#[derive(Debug, Default)]
pub struct ConsoleState {
    own_user_id: Option<String>,
    room_name: Option<String>,
    log: MessageLog,
    in_room: bool,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one runtime event, returning lines to print.
    pub fn apply_event(&mut self, event: &ClientEvent) -> Vec<String> {
        match event {
            ClientEvent::SessionChanged { phase } => self.apply_phase(*phase),
            ClientEvent::RoomCreated { room } => {
                self.own_user_id = room.creator_id.clone();
                self.room_name = Some(room.name.clone());
                let mut lines = vec![format!(
                    "room '{}' created. share these credentials:",
                    room.name
                )];
                lines.push(format!("  room id:  {}", room.room_id));
                if let Some(password) = &room.password {
                    lines.push(format!("  password: {password}"));
                }
                lines.push("type /enter to open the chat.".to_owned());
                lines
            }
            ClientEvent::RoomJoined { user, room } => {
                self.own_user_id = Some(user.user_id.clone());
                self.room_name = Some(room.name.clone());
                vec![format!(
                    "joined '{}' as {}. type /enter to open the chat.",
                    room.name, user.user_name
                )]
            }
            ClientEvent::RoomActionFailed {
                action,
                code,
                message,
            } => {
                let verb = match action {
                    RoomAction::Create => "create room",
                    RoomAction::Join => "join room",
                };
                vec![format!("{verb} failed ({code}): {message}")]
            }
            ClientEvent::HistoryLoaded { messages, .. } => {
                self.log.complete_initial_load(messages.clone());
                let mut lines = vec![format!("-- history: {} message(s) --", messages.len())];
                lines.extend(self.log.messages().iter().map(|m| self.render_message(m)));
                lines
            }
            ClientEvent::HistoryLoadFailed { .. } => {
                // Keep whatever already landed; flush buffered pushes so live
                // traffic is still visible without history.
                let before = self.log.messages().len();
                self.log.fail_initial_load();
                let mut lines =
                    vec!["could not load earlier messages; new ones will still appear.".to_owned()];
                lines.extend(
                    self.log.messages()[before..]
                        .iter()
                        .map(|m| self.render_message(m)),
                );
                lines
            }
            ClientEvent::MessageReceived { message } => {
                match self.log.append_from_push(message.clone()) {
                    AppendOutcome::Appended => vec![self.render_message(message)],
                    AppendOutcome::Buffered => Vec::new(),
                    AppendOutcome::Dropped => {
                        debug!(message_id = %message.id, "dropping push outside room view");
                        Vec::new()
                    }
                }
            }
            ClientEvent::SendAck(ack) => match &ack.error_code {
                None => Vec::new(),
                Some(code) => vec![format!("message not sent ({code}); retype to retry.")],
            },
            ClientEvent::ChannelStatus { state, retry_in_ms } => {
                self.render_channel_status(*state, *retry_in_ms)
            }
        }
    }

    fn apply_phase(&mut self, phase: SessionPhase) -> Vec<String> {
        match phase {
            SessionPhase::Active => {
                self.in_room = true;
                self.log = MessageLog::new();
                self.log.begin_initial_load();
                let name = self.room_name.as_deref().unwrap_or("room");
                vec![format!("-- {name} --")]
            }
            SessionPhase::Credentialed if self.in_room => {
                self.in_room = false;
                self.log.close();
                vec!["left the room.".to_owned()]
            }
            _ => Vec::new(),
        }
    }

    fn render_channel_status(
        &self,
        state: LiveChannelState,
        retry_in_ms: Option<u64>,
    ) -> Vec<String> {
        match state {
            LiveChannelState::Disconnected => {
                let retry = retry_in_ms
                    .map(|ms| format!("; retrying in {ms}ms"))
                    .unwrap_or_default();
                vec![format!("* live updates interrupted{retry}")]
            }
            LiveChannelState::Open => vec!["* live updates connected".to_owned()],
            // Connect attempts and deterministic teardown are silent.
            LiveChannelState::Connecting | LiveChannelState::Closed => Vec::new(),
        }
    }

    /// Render one message row.
    ///
    /// The sender name is shown only for non-anonymous messages from other
    /// participants; your own rows and anonymous rows carry no badge.
    fn render_message(&self, message: &Message) -> String {
        let time = message.timestamp.format("%H:%M");
        let is_own = self
            .own_user_id
            .as_deref()
            .is_some_and(|own| own == message.user_id);
        let badge = if !message.is_anonymous && !is_own {
            format!("{}: ", message.user_name)
        } else {
            String::new()
        };
        let body = match message.message_type {
            MessageType::Text => message.content.clone(),
            MessageType::File => render_file_body(&message.content),
        };
        format!("[{time}] {badge}{body}")
    }
}

fn render_file_body(content: &str) -> String {
    match serde_json::from_str::<FilePayload>(content) {
        Ok(payload) => {
            let kib = payload.file_size as f64 / 1024.0;
            format!("[file] {} ({kib:.1} KB)", payload.file_name)
        }
        Err(_) => "[file] <unreadable attachment>".to_owned(),
    }
}
