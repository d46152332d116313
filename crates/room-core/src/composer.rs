use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{MessageType, SendMessageRequest, User};

/// Attachment size ceiling in bytes, pre-encoding (10 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Client-enforced attachment MIME allow-list: PDF, legacy and OOXML
/// Word/PowerPoint, plain text, JPEG, PNG, GIF.
pub const ALLOWED_ATTACHMENT_TYPES: [&str; 9] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/gif",
];

/// Validation failures rejected before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComposeError {
    /// The draft was empty or whitespace-only.
    #[error("message is empty")]
    EmptyDraft,
    /// The attachment exceeds [`MAX_ATTACHMENT_BYTES`].
    #[error("attachment is {size} bytes; the limit is {MAX_ATTACHMENT_BYTES}")]
    AttachmentTooLarge { size: usize },
    /// The attachment MIME type is not on the allow-list.
    #[error("unsupported attachment type '{content_type}'")]
    UnsupportedType { content_type: String },
    /// Payload serialization failed.
    #[error("failed encoding attachment payload: {message}")]
    EncodingFailed { message: String },
}

impl ComposeError {
    /// Stable machine-readable code, mirrored into `SendAck.error_code`.
    pub fn code(&self) -> &'static str {
        match self {
            ComposeError::EmptyDraft => "empty_message",
            ComposeError::AttachmentTooLarge { .. } => "attachment_too_large",
            ComposeError::UnsupportedType { .. } => "unsupported_attachment_type",
            ComposeError::EncodingFailed { .. } => "attachment_encoding_failed",
        }
    }
}

/// Validated outbound message content, ready to wrap in a send request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingContent {
    /// Text body, or serialized [`FilePayload`] for files.
    pub content: String,
    /// Envelope message type.
    pub message_type: MessageType,
}

/// Structured file payload carried in `content` for `message_type = file`.
///
/// `file_content` is a self-describing `data:<mime>;base64,...` inline
/// encoding of the raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub file_content: String,
}

/// Validate a text draft. Whitespace-only drafts are rejected with zero
/// outbound requests; valid drafts are trimmed.
pub fn compose_text(draft: &str) -> Result<OutgoingContent, ComposeError> {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        return Err(ComposeError::EmptyDraft);
    }

    Ok(OutgoingContent {
        content: trimmed.to_owned(),
        message_type: MessageType::Text,
    })
}

/// Validate and inline-encode a file attachment.
///
/// Size and MIME checks run before any encoding work; the 10 MiB boundary is
/// inclusive. Valid files are fully encoded in memory (the hard ceiling makes
/// chunking unnecessary).
pub fn compose_file(
    file_name: &str,
    content_type: &str,
    data: &[u8],
) -> Result<OutgoingContent, ComposeError> {
    if data.len() > MAX_ATTACHMENT_BYTES {
        return Err(ComposeError::AttachmentTooLarge { size: data.len() });
    }
    if !ALLOWED_ATTACHMENT_TYPES.contains(&content_type) {
        return Err(ComposeError::UnsupportedType {
            content_type: content_type.to_owned(),
        });
    }

    let payload = FilePayload {
        file_name: file_name.to_owned(),
        file_type: content_type.to_owned(),
        file_size: data.len() as u64,
        file_content: format!("data:{content_type};base64,{}", BASE64.encode(data)),
    };
    let content = serde_json::to_string(&payload).map_err(|err| ComposeError::EncodingFailed {
        message: err.to_string(),
    })?;

    Ok(OutgoingContent {
        content,
        message_type: MessageType::File,
    })
}

/// Wrap validated content in the standard send envelope.
pub fn outbound_request(
    user: &User,
    room_id: &str,
    outgoing: OutgoingContent,
) -> SendMessageRequest {
    SendMessageRequest {
        room_id: room_id.to_owned(),
        user_id: user.user_id.clone(),
        user_name: user.user_name.clone(),
        content: outgoing.content,
        message_type: outgoing.message_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn sender() -> User {
        User {
            user_id: "u1".into(),
            user_name: "Asha".into(),
            role: Role::Student,
        }
    }

    #[test]
    fn trims_text_drafts() {
        let outgoing = compose_text("  hello  ").expect("draft should be valid");
        assert_eq!(outgoing.content, "hello");
        assert_eq!(outgoing.message_type, MessageType::Text);
    }

    #[test]
    fn rejects_whitespace_only_drafts() {
        assert_eq!(compose_text("   "), Err(ComposeError::EmptyDraft));
        assert_eq!(compose_text(""), Err(ComposeError::EmptyDraft));
    }

    #[test]
    fn accepts_file_at_exactly_the_size_ceiling() {
        let data = vec![0u8; MAX_ATTACHMENT_BYTES];
        compose_file("slides.pdf", "application/pdf", &data)
            .expect("file at the boundary should be accepted");
    }

    #[test]
    fn rejects_file_one_byte_over_the_ceiling() {
        let data = vec![0u8; MAX_ATTACHMENT_BYTES + 1];
        let err = compose_file("slides.pdf", "application/pdf", &data)
            .expect_err("oversized file should be rejected");
        assert_eq!(
            err,
            ComposeError::AttachmentTooLarge {
                size: MAX_ATTACHMENT_BYTES + 1
            }
        );
        assert_eq!(err.code(), "attachment_too_large");
    }

    #[test]
    fn rejects_disallowed_mime_type_regardless_of_size() {
        let err = compose_file("archive.zip", "application/zip", b"PK\x03\x04")
            .expect_err("zip should be rejected");
        assert_eq!(err.code(), "unsupported_attachment_type");
    }

    #[test]
    fn encodes_file_payload_as_data_url() {
        let outgoing =
            compose_file("notes.txt", "text/plain", b"doubt").expect("file should be valid");
        assert_eq!(outgoing.message_type, MessageType::File);

        let payload: FilePayload =
            serde_json::from_str(&outgoing.content).expect("content should be a file payload");
        assert_eq!(payload.file_name, "notes.txt");
        assert_eq!(payload.file_type, "text/plain");
        assert_eq!(payload.file_size, 5);
        assert_eq!(payload.file_content, "data:text/plain;base64,ZG91YnQ=");
    }

    #[test]
    fn payload_keys_are_camel_case_on_the_wire() {
        let outgoing = compose_file("a.png", "image/png", &[1, 2, 3]).expect("valid file");
        let value: serde_json::Value =
            serde_json::from_str(&outgoing.content).expect("payload should be JSON");
        for key in ["fileName", "fileType", "fileSize", "fileContent"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn builds_send_envelope() {
        let outgoing = compose_text("hello").expect("valid draft");
        let request = outbound_request(&sender(), "483920", outgoing);

        assert_eq!(request.room_id, "483920");
        assert_eq!(request.user_id, "u1");
        assert_eq!(request.user_name, "Asha");
        assert_eq!(request.content, "hello");
        assert_eq!(request.message_type, MessageType::Text);
    }
}
