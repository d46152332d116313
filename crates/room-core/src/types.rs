use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Participant role assigned at room creation or join time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Room creator / presenter.
    Faculty,
    /// Default role for joiners.
    Student,
}

impl Role {
    /// Lowercase wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Faculty => "faculty",
            Role::Student => "student",
        }
    }
}

/// Chat message kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text body.
    Text,
    /// Inline-encoded file payload serialized as JSON text.
    File,
}

/// Client-session user identity, immutable once established.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Server-assigned user ID.
    pub user_id: String,
    /// Display name entered at create/join time.
    pub user_name: String,
    /// Session role.
    pub role: Role,
}

/// Active room descriptor held by the session.
///
/// `password`/creator fields are only known to the creator (the join response
/// omits them). `active` is purely client-local: it distinguishes
/// "credentials displayed" from "chat entered" and has no server-side meaning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    /// Short human-enterable room code.
    pub room_id: String,
    /// Room display name.
    pub name: String,
    /// Shared room password, known to the creator only.
    pub password: Option<String>,
    /// Creator user ID, known to the creator only.
    pub creator_id: Option<String>,
    /// Creator display name, known to the creator only.
    pub creator_name: Option<String>,
    /// Client-local enter-room acknowledgement flag.
    pub active: bool,
}

impl Room {
    /// Build a session room from a create response.
    pub fn from_created(created: CreatedRoom) -> Self {
        Self {
            room_id: created.room_id,
            name: created.name,
            password: Some(created.password),
            creator_id: Some(created.creator_id),
            creator_name: Some(created.creator_name),
            active: false,
        }
    }

    /// Build a session room from a join response.
    pub fn from_joined(joined: JoinedRoom) -> Self {
        Self {
            room_id: joined.room_id,
            name: joined.name,
            password: None,
            creator_id: None,
            creator_name: None,
            active: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Chat message as delivered by history fetches and push frames.
///
/// The backend attaches moderation fields (`can_edit`, `is_deleted`) this
/// client does not consume; unknown fields are ignored on deserialization.
/// Timestamps are naive UTC, matching the backend's `isoformat()` output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Server-assigned message ID.
    pub id: String,
    /// Room the message belongs to.
    pub room_id: String,
    /// Sender user ID.
    pub user_id: String,
    /// Sender display name.
    pub user_name: String,
    /// Text body, or a serialized [`crate::FilePayload`] for file messages.
    pub content: String,
    /// Message kind.
    pub message_type: MessageType,
    /// Server-set marker suppressing sender-name display to other participants.
    #[serde(default = "default_true")]
    pub is_anonymous: bool,
    /// Server-assigned timestamp (naive UTC).
    pub timestamp: NaiveDateTime,
}

/// Body of `POST /api/rooms/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRoomRequest {
    pub name: String,
    pub creator_name: String,
    pub creator_role: Role,
}

/// `room` object of a successful create response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedRoom {
    pub room_id: String,
    pub name: String,
    pub password: String,
    pub creator_id: String,
    pub creator_name: String,
}

/// Response envelope of `POST /api/rooms/create`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateRoomResponse {
    pub success: bool,
    pub room: Option<CreatedRoom>,
}

/// Body of `POST /api/rooms/join`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinRoomRequest {
    pub room_id: String,
    pub password: String,
    pub user_name: String,
}

/// `user` object of a successful join response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinedUser {
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
}

/// `room` object of a successful join response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinedRoom {
    pub room_id: String,
    pub name: String,
}

/// Response envelope of `POST /api/rooms/join`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinRoomResponse {
    pub success: bool,
    pub user: Option<JoinedUser>,
    pub room: Option<JoinedRoom>,
}

/// Response envelope of `GET /api/rooms/{room_id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesResponse {
    pub success: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body of `POST /api/messages/send`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub room_id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub message_type: MessageType,
}

/// Response envelope of `POST /api/messages/send`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendResponse {
    pub success: bool,
}

/// Inbound push-channel frame.
///
/// Only `new_message` is consumed; any other `type` deserializes to
/// [`LiveFrame::Unknown`] and is a forward-compatible no-op.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveFrame {
    /// A newly created message broadcast to the room.
    NewMessage { message: Message },
    /// Unrecognized frame type, ignored.
    #[serde(other)]
    Unknown,
}

/// Room session phase reported to consumers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionPhase {
    /// No user identity established yet.
    NoUser,
    /// User set and room credentials held; chat not entered.
    Credentialed,
    /// Room entered; live updates flowing.
    Active,
}

/// Live update channel lifecycle state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LiveChannelState {
    /// No connection; a reconnect may follow.
    Disconnected,
    /// Connection attempt in flight.
    Connecting,
    /// Connected and delivering frames.
    Open,
    /// Deterministically torn down; terminal.
    Closed,
}

/// User-initiated room lifecycle actions, used in failure events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoomAction {
    Create,
    Join,
}

/// Command channel input accepted by the sync runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientCommand {
    /// Create a room and establish the creator identity.
    CreateRoom {
        /// Seminar/room display name.
        name: String,
        /// Creator display name.
        creator_name: String,
        /// Creator role.
        creator_role: Role,
    },
    /// Join an existing room with shared credentials.
    JoinRoom {
        /// Short room code.
        room_id: String,
        /// Shared room password.
        password: String,
        /// Display name of the joiner.
        user_name: String,
    },
    /// Explicit enter-room acknowledgement; starts history load and the
    /// live channel.
    EnterRoom,
    /// Leave the room view; closes the live channel deterministically.
    LeaveRoom,
    /// Submit a text draft through the request/response channel.
    SendText {
        /// Caller-provided transaction ID echoed in `SendAck`.
        client_txn_id: String,
        /// Raw draft; trimmed and validated before any request is made.
        draft: String,
    },
    /// Submit a file attachment through the request/response channel.
    SendFile {
        /// Caller-provided transaction ID echoed in `SendAck`.
        client_txn_id: String,
        /// Original file name.
        file_name: String,
        /// Declared MIME type, checked against the allow-list.
        content_type: String,
        /// Raw file bytes, fully read into memory.
        data: Vec<u8>,
    },
}

/// Acknowledgement for text/file send commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendAck {
    /// Original caller transaction ID.
    pub client_txn_id: String,
    /// Stable error code on failure; `None` means accepted.
    pub error_code: Option<String>,
}

/// Event channel output emitted by the sync runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClientEvent {
    /// Session phase transition.
    SessionChanged {
        /// New session phase.
        phase: SessionPhase,
    },
    /// Room created; carries the credentials to share with participants.
    RoomCreated { room: Room },
    /// Room joined.
    RoomJoined { user: User, room: Room },
    /// Create/join failure, surfaced user-visibly.
    RoomActionFailed {
        action: RoomAction,
        /// Stable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },
    /// Initial history snapshot for the active room.
    HistoryLoaded {
        room_id: String,
        /// Messages in server arrival order.
        messages: Vec<Message>,
    },
    /// Initial history fetch failed; non-fatal, the room stays usable.
    HistoryLoadFailed { room_id: String },
    /// One message delivered by the push channel.
    MessageReceived { message: Message },
    /// Send acknowledgement.
    SendAck(SendAck),
    /// Live channel lifecycle update.
    ChannelStatus {
        state: LiveChannelState,
        /// Delay before the next reconnect attempt, when one is scheduled.
        retry_in_ms: Option<u64>,
    },
}
