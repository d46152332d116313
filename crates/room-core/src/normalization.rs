use crate::{
    error::ClientError,
    types::{ClientEvent, RoomAction, SendAck},
};

/// Internal helper describing a send submission result before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend accepted the message; the echo arrives via the push
    /// channel like for every other participant.
    Accepted,
    /// Validation or request failure; the caller keeps its draft for retry.
    Rejected { error_code: String },
}

/// Convert a send outcome to a stable `ClientEvent::SendAck`.
pub fn normalize_send_outcome(
    client_txn_id: impl Into<String>,
    outcome: SendOutcome,
) -> ClientEvent {
    let client_txn_id = client_txn_id.into();
    match outcome {
        SendOutcome::Accepted => ClientEvent::SendAck(SendAck {
            client_txn_id,
            error_code: None,
        }),
        SendOutcome::Rejected { error_code } => ClientEvent::SendAck(SendAck {
            client_txn_id,
            error_code: Some(error_code),
        }),
    }
}

/// Convert a create/join failure into its user-visible event.
pub fn normalize_room_failure(action: RoomAction, error: ClientError) -> ClientEvent {
    ClientEvent::RoomActionFailed {
        action,
        code: error.code,
        message: error.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn maps_accepted_send_to_clean_ack() {
        let event = normalize_send_outcome("txn-1", SendOutcome::Accepted);
        match event {
            ClientEvent::SendAck(ack) => {
                assert_eq!(ack.client_txn_id, "txn-1");
                assert_eq!(ack.error_code, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn maps_rejection_to_ack_with_stable_code() {
        let event = normalize_send_outcome(
            "txn-2",
            SendOutcome::Rejected {
                error_code: "empty_message".into(),
            },
        );
        match event {
            ClientEvent::SendAck(ack) => {
                assert_eq!(ack.client_txn_id, "txn-2");
                assert_eq!(ack.error_code.as_deref(), Some("empty_message"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn maps_join_failure_to_room_action_event() {
        let event = normalize_room_failure(
            RoomAction::Join,
            ClientError::new(ErrorCategory::Config, "backend_rejected", "bad credentials"),
        );
        match event {
            ClientEvent::RoomActionFailed {
                action,
                code,
                message,
            } => {
                assert_eq!(action, RoomAction::Join);
                assert_eq!(code, "backend_rejected");
                assert_eq!(message, "bad credentials");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
