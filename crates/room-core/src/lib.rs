//! Core client contract for doubt-room chat sessions.
//!
//! This crate defines the command/event protocol, session and live-channel
//! state machines, message store, composer validation, retry policy, and
//! common error types. It performs no I/O; the `room-sync` runtime drives it
//! against the REST and WebSocket interfaces.

/// Composer validation and attachment encoding.
pub mod composer;
/// Stable client error types and HTTP classification helpers.
pub mod error;
/// Live update channel lifecycle and redelivery filtering.
pub mod live;
/// Send/room outcome normalization helpers.
pub mod normalization;
/// Backoff policy used by the reconnect loop.
pub mod retry;
/// Room session state machine.
pub mod session;
/// Message store for the active room.
pub mod timeline;
/// Protocol types (commands, events, wire payloads).
pub mod types;

pub use composer::{
    ALLOWED_ATTACHMENT_TYPES, ComposeError, FilePayload, MAX_ATTACHMENT_BYTES, OutgoingContent,
    compose_file, compose_text, outbound_request,
};
pub use error::{ClientError, ErrorCategory, classify_http_status};
pub use live::{LiveChannelLifecycle, RedeliveryFilter};
pub use normalization::{SendOutcome, normalize_room_failure, normalize_send_outcome};
pub use retry::RetryPolicy;
pub use session::RoomSession;
pub use timeline::{AppendOutcome, MessageLog};
pub use types::{
    ClientCommand, ClientEvent, CreateRoomRequest, CreatedRoom, JoinRoomRequest, JoinRoomResponse,
    JoinedRoom, JoinedUser, LiveChannelState, LiveFrame, Message, MessageType, MessagesResponse,
    Role, Room, RoomAction, SendAck, SendMessageRequest, SendResponse, SessionPhase, User,
};
