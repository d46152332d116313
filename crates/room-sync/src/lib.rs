//! Sync runtime for doubt-room chat sessions.
//!
//! Single-writer command loop over the `room-core` contract: REST calls for
//! room lifecycle and message submission, one WebSocket live channel per
//! active room for inbound fan-out. Consumers drive it with
//! [`ClientCommand`]s and observe [`ClientEvent`]s; all state mutation
//! happens inside the loop in reaction to completed requests, push frames,
//! or commands.

pub mod api;
pub mod channels;
pub mod live;

use room_core::{
    ClientCommand, ClientEvent, ClientError, CreateRoomRequest, JoinRoomRequest, OutgoingContent,
    RetryPolicy, Role, Room, RoomAction, RoomSession, SendOutcome, SessionPhase, User,
    compose_file, compose_text, normalize_room_failure, normalize_send_outcome, outbound_request,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

pub use api::RoomApi;
pub use channels::{CommandSendError, EventStream, RuntimeChannels};
pub use live::{RunningLiveChannel, spawn_live_channel, ws_url_for_room};

const DEFAULT_COMMAND_BUFFER: usize = 64;
const DEFAULT_EVENT_BUFFER: usize = 256;

/// Runtime construction parameters.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend base URL; the WebSocket endpoint is derived from it.
    pub base_url: Url,
    /// Reconnect backoff policy for the live channel.
    pub retry: RetryPolicy,
    /// Command channel depth.
    pub command_buffer: usize,
    /// Event broadcast depth.
    pub event_buffer: usize,
}

impl SyncConfig {
    /// Defaults for everything but the base URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            retry: RetryPolicy::default(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

/// Cloneable handle to a spawned sync runtime.
#[derive(Clone, Debug)]
pub struct SyncRuntimeHandle {
    channels: RuntimeChannels,
}

impl SyncRuntimeHandle {
    /// Queue one command for the runtime.
    pub async fn send(&self, command: ClientCommand) -> Result<(), CommandSendError> {
        self.channels.send_command(command).await
    }

    /// Subscribe to runtime events.
    pub fn subscribe(&self) -> EventStream {
        self.channels.subscribe()
    }
}

/// Spawn the runtime on the current tokio runtime and return its handle.
pub fn spawn_runtime(config: SyncConfig) -> Result<SyncRuntimeHandle, ClientError> {
    let (channels, command_rx) = RuntimeChannels::new(config.command_buffer, config.event_buffer);
    let api = RoomApi::new(config.base_url.clone())?;
    let runtime = SyncRuntime {
        channels: channels.clone(),
        command_rx,
        session: RoomSession::default(),
        api,
        base_url: config.base_url,
        retry: config.retry,
        live: None,
    };
    tokio::spawn(runtime.run());

    Ok(SyncRuntimeHandle { channels })
}

struct SyncRuntime {
    channels: RuntimeChannels,
    command_rx: mpsc::Receiver<ClientCommand>,
    session: RoomSession,
    api: RoomApi,
    base_url: Url,
    retry: RetryPolicy,
    live: Option<RunningLiveChannel>,
}

impl SyncRuntime {
    async fn run(mut self) {
        info!(base_url = %self.base_url, "sync runtime started");
        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command).await;
        }

        // Handle dropped: tear the live channel down with the runtime.
        if let Some(live) = self.live.take() {
            live.shutdown().await;
        }
        debug!("sync runtime exiting");
    }

    async fn handle_command(&mut self, command: ClientCommand) {
        match command {
            ClientCommand::CreateRoom {
                name,
                creator_name,
                creator_role,
            } => self.handle_create(name, creator_name, creator_role).await,
            ClientCommand::JoinRoom {
                room_id,
                password,
                user_name,
            } => self.handle_join(room_id, password, user_name).await,
            ClientCommand::EnterRoom => self.handle_enter().await,
            ClientCommand::LeaveRoom => self.handle_leave().await,
            ClientCommand::SendText {
                client_txn_id,
                draft,
            } => self.handle_send_text(client_txn_id, draft).await,
            ClientCommand::SendFile {
                client_txn_id,
                file_name,
                content_type,
                data,
            } => {
                self.handle_send_file(client_txn_id, file_name, content_type, data)
                    .await
            }
        }
    }

    async fn handle_create(&mut self, name: String, creator_name: String, creator_role: Role) {
        if self.session.phase() != SessionPhase::NoUser {
            self.channels.emit(normalize_room_failure(
                RoomAction::Create,
                ClientError::invalid_session_state(self.session.phase(), "create_room"),
            ));
            return;
        }

        let request = CreateRoomRequest {
            name,
            creator_name,
            creator_role,
        };
        match self.api.create_room(&request).await {
            Ok(created) => {
                let user = User {
                    user_id: created.creator_id.clone(),
                    user_name: created.creator_name.clone(),
                    role: creator_role,
                };
                let room = Room::from_created(created);
                match self.session.begin(user, room.clone()) {
                    Ok(phase) => {
                        info!(room_id = %room.room_id, "room created");
                        self.channels.emit(ClientEvent::RoomCreated { room });
                        self.channels.emit(ClientEvent::SessionChanged { phase });
                    }
                    Err(err) => self
                        .channels
                        .emit(normalize_room_failure(RoomAction::Create, err)),
                }
            }
            Err(err) => {
                warn!(error = %err, "room create failed");
                self.channels
                    .emit(normalize_room_failure(RoomAction::Create, err));
            }
        }
    }

    async fn handle_join(&mut self, room_id: String, password: String, user_name: String) {
        if self.session.phase() != SessionPhase::NoUser {
            self.channels.emit(normalize_room_failure(
                RoomAction::Join,
                ClientError::invalid_session_state(self.session.phase(), "join_room"),
            ));
            return;
        }

        let request = JoinRoomRequest {
            room_id,
            password,
            user_name,
        };
        match self.api.join_room(&request).await {
            Ok((joined_user, joined_room)) => {
                let user = User {
                    user_id: joined_user.user_id,
                    user_name: joined_user.user_name,
                    role: joined_user.role,
                };
                let room = Room::from_joined(joined_room);
                match self.session.begin(user.clone(), room.clone()) {
                    Ok(phase) => {
                        info!(room_id = %room.room_id, "room joined");
                        self.channels.emit(ClientEvent::RoomJoined { user, room });
                        self.channels.emit(ClientEvent::SessionChanged { phase });
                    }
                    Err(err) => self
                        .channels
                        .emit(normalize_room_failure(RoomAction::Join, err)),
                }
            }
            Err(err) => {
                warn!(error = %err, "room join failed");
                self.channels
                    .emit(normalize_room_failure(RoomAction::Join, err));
            }
        }
    }

    async fn handle_enter(&mut self) {
        let phase = match self.session.activate() {
            Ok(phase) => phase,
            Err(err) => {
                warn!(error = %err, "enter room ignored");
                return;
            }
        };
        let Some(room_id) = self.session.active_room_id().map(str::to_owned) else {
            return;
        };

        self.channels.emit(ClientEvent::SessionChanged { phase });

        match spawn_live_channel(
            &self.base_url,
            &room_id,
            self.retry,
            self.channels.events(),
        ) {
            Ok(running) => self.live = Some(running),
            Err(err) => warn!(error = %err, "live channel unavailable"),
        }

        // One-shot history load; failure is non-fatal and log-only, the
        // room stays usable without history.
        match self.api.room_messages(&room_id).await {
            Ok(messages) => {
                debug!(room_id = %room_id, count = messages.len(), "history loaded");
                self.channels
                    .emit(ClientEvent::HistoryLoaded { room_id, messages });
            }
            Err(err) => {
                warn!(error = %err, room_id = %room_id, "history load failed");
                self.channels.emit(ClientEvent::HistoryLoadFailed { room_id });
            }
        }
    }

    async fn handle_leave(&mut self) {
        if let Some(live) = self.live.take() {
            live.shutdown().await;
        }

        match self.session.deactivate() {
            Ok(phase) => self.channels.emit(ClientEvent::SessionChanged { phase }),
            Err(err) => warn!(error = %err, "leave room ignored"),
        }
    }

    async fn handle_send_text(&mut self, client_txn_id: String, draft: String) {
        let Some((user, room_id)) = self.sender_context(&client_txn_id) else {
            return;
        };

        match compose_text(&draft) {
            Ok(outgoing) => self.submit(user, room_id, client_txn_id, outgoing).await,
            Err(err) => {
                // Rejected client-side; zero outbound requests.
                self.channels.emit(normalize_send_outcome(
                    client_txn_id,
                    SendOutcome::Rejected {
                        error_code: err.code().to_owned(),
                    },
                ));
            }
        }
    }

    async fn handle_send_file(
        &mut self,
        client_txn_id: String,
        file_name: String,
        content_type: String,
        data: Vec<u8>,
    ) {
        let Some((user, room_id)) = self.sender_context(&client_txn_id) else {
            return;
        };

        match compose_file(&file_name, &content_type, &data) {
            Ok(outgoing) => self.submit(user, room_id, client_txn_id, outgoing).await,
            Err(err) => {
                self.channels.emit(normalize_send_outcome(
                    client_txn_id,
                    SendOutcome::Rejected {
                        error_code: err.code().to_owned(),
                    },
                ));
            }
        }
    }

    async fn submit(
        &mut self,
        user: User,
        room_id: String,
        client_txn_id: String,
        outgoing: OutgoingContent,
    ) {
        let request = outbound_request(&user, &room_id, outgoing);
        let outcome = match self.api.send_message(&request).await {
            // No optimistic insert: the echo arrives via the push channel.
            Ok(()) => SendOutcome::Accepted,
            Err(err) => {
                warn!(error = %err, "message send failed");
                SendOutcome::Rejected {
                    error_code: err.code,
                }
            }
        };
        self.channels
            .emit(normalize_send_outcome(client_txn_id, outcome));
    }

    fn sender_context(&mut self, client_txn_id: &str) -> Option<(User, String)> {
        let user = self.session.user().cloned();
        let room_id = self.session.active_room_id().map(str::to_owned);
        match (user, room_id) {
            (Some(user), Some(room_id)) => Some((user, room_id)),
            _ => {
                self.channels.emit(normalize_send_outcome(
                    client_txn_id.to_owned(),
                    SendOutcome::Rejected {
                        error_code: "no_active_room".to_owned(),
                    },
                ));
                None
            }
        }
    }
}
