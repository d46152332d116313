use crate::{
    error::ClientError,
    types::{Room, SessionPhase, User},
};

/// Room session state machine: `NoUser → Credentialed → Active`.
///
/// A user identity is established only by a successful create or join
/// response, and never regresses to absent (no logout flow exists). The room
/// becomes active only through the explicit enter-room acknowledgement;
/// leaving the chat view returns the session to `Credentialed` so the live
/// channel teardown has a deterministic trigger.
#[derive(Debug, Clone, Default)]
pub struct RoomSession {
    user: Option<User>,
    room: Option<Room>,
}

impl RoomSession {
    /// Current session phase.
    pub fn phase(&self) -> SessionPhase {
        match (&self.user, &self.room) {
            (Some(_), Some(room)) if room.active => SessionPhase::Active,
            (Some(_), Some(_)) => SessionPhase::Credentialed,
            _ => SessionPhase::NoUser,
        }
    }

    /// Established user identity, when present.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Current room descriptor, when present.
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    /// Room ID of the active room, if the chat view is entered.
    pub fn active_room_id(&self) -> Option<&str> {
        self.room
            .as_ref()
            .filter(|room| room.active)
            .map(|room| room.room_id.as_str())
    }

    /// Establish identity and room from a successful create/join response.
    ///
    /// The room always enters with `active == false`; activation is a
    /// separate explicit step.
    pub fn begin(&mut self, user: User, mut room: Room) -> Result<SessionPhase, ClientError> {
        if self.phase() != SessionPhase::NoUser {
            return Err(ClientError::invalid_session_state(self.phase(), "begin"));
        }

        room.active = false;
        self.user = Some(user);
        self.room = Some(room);
        Ok(SessionPhase::Credentialed)
    }

    /// Explicit enter-room acknowledgement.
    pub fn activate(&mut self) -> Result<SessionPhase, ClientError> {
        if self.phase() != SessionPhase::Credentialed {
            return Err(ClientError::invalid_session_state(self.phase(), "activate"));
        }

        if let Some(room) = self.room.as_mut() {
            room.active = true;
        }
        Ok(SessionPhase::Active)
    }

    /// Leave the chat view; identity and credentials are retained.
    pub fn deactivate(&mut self) -> Result<SessionPhase, ClientError> {
        if self.phase() != SessionPhase::Active {
            return Err(ClientError::invalid_session_state(
                self.phase(),
                "deactivate",
            ));
        }

        if let Some(room) = self.room.as_mut() {
            room.active = false;
        }
        Ok(SessionPhase::Credentialed)
    }
}
