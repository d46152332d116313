//! Line-oriented console client for seminar doubt rooms.
//!
//! Reads slash commands from stdin, drives the `room-sync` runtime, and
//! prints reduced runtime events as chat lines.

mod config;
mod logging;
mod state;

use std::path::Path;
use std::process::ExitCode;

use room_core::{ClientCommand, Role};
use room_sync::{SyncConfig, spawn_runtime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::DoubtroomConfig;
use crate::state::ConsoleState;

const HELP: &str = "\
commands:
  /create <your name> <room name...>     create a room as faculty
  /join <room id> <password> <name...>   join an existing room
  /enter                                 open the chat after create/join
  /leave                                 leave the chat view
  /send <text...>                        send a message
  /file <path>                           send a file attachment
  /help                                  show this help
  /quit                                  exit";

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match DoubtroomConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "configuration invalid");
            return ExitCode::FAILURE;
        }
    };

    let mut sync_config = SyncConfig::new(config.backend_url.clone());
    sync_config.retry = config.retry_policy();
    sync_config.event_buffer = config.event_buffer;
    let handle = match spawn_runtime(sync_config) {
        Ok(handle) => handle,
        Err(err) => {
            error!(error = %err, "failed starting sync runtime");
            return ExitCode::FAILURE;
        }
    };

    let mut events = handle.subscribe();
    let mut state = ConsoleState::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("doubt room console. {HELP}");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    for line in state.apply_event(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event stream lagged; some output was skipped");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !dispatch(&handle, line.trim()).await {
                        break;
                    }
                }
                Ok(None) => break, // stdin closed
                Err(err) => {
                    error!(error = %err, "stdin read failed");
                    break;
                }
            },
        }
    }

    ExitCode::SUCCESS
}

/// Parse one input line and forward it to the runtime.
///
/// Returns `false` when the REPL should exit.
async fn dispatch(handle: &room_sync::SyncRuntimeHandle, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "/quit" => return false,
        "/help" => {
            println!("{HELP}");
            return true;
        }
        "/create" => match rest.split_once(char::is_whitespace) {
            Some((creator_name, room_name)) if !room_name.trim().is_empty() => {
                Some(ClientCommand::CreateRoom {
                    name: room_name.trim().to_owned(),
                    creator_name: creator_name.to_owned(),
                    creator_role: Role::Faculty,
                })
            }
            _ => {
                println!("usage: /create <your name> <room name...>");
                None
            }
        },
        "/join" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(room_id), Some(password), Some(user_name)) => {
                    Some(ClientCommand::JoinRoom {
                        room_id: room_id.to_owned(),
                        password: password.to_owned(),
                        user_name: user_name.trim().to_owned(),
                    })
                }
                _ => {
                    println!("usage: /join <room id> <password> <name...>");
                    None
                }
            }
        }
        "/enter" => Some(ClientCommand::EnterRoom),
        "/leave" => Some(ClientCommand::LeaveRoom),
        "/send" => Some(ClientCommand::SendText {
            client_txn_id: Uuid::new_v4().to_string(),
            draft: rest.to_owned(),
        }),
        "/file" => read_attachment(rest).await,
        other => {
            println!("unknown command '{other}'; /help lists commands");
            None
        }
    };

    if let Some(command) = command
        && handle.send(command).await.is_err()
    {
        error!("sync runtime is gone");
        return false;
    }
    true
}

async fn read_attachment(path_arg: &str) -> Option<ClientCommand> {
    if path_arg.is_empty() {
        println!("usage: /file <path>");
        return None;
    }

    let path = Path::new(path_arg);
    let Some(file_name) = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
    else {
        println!("'{path_arg}' has no file name; usage: /file <path>");
        return None;
    };
    let Some(content_type) = mime_for_path(path) else {
        println!("unsupported file type for '{file_name}'");
        return None;
    };

    match tokio::fs::read(path).await {
        Ok(data) => Some(ClientCommand::SendFile {
            client_txn_id: Uuid::new_v4().to_string(),
            file_name,
            content_type: content_type.to_owned(),
            data,
        }),
        Err(err) => {
            println!("cannot read '{path_arg}': {err}");
            None
        }
    }
}

/// Map a file extension to its declared MIME type.
fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_extensions_to_mime_types() {
        assert_eq!(mime_for_path(Path::new("slides.PDF")), Some("application/pdf"));
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), Some("text/plain"));
    }

    #[test]
    fn rejects_unknown_or_missing_extensions() {
        assert_eq!(mime_for_path(Path::new("archive.zip")), None);
        assert_eq!(mime_for_path(Path::new("Makefile")), None);
    }

    #[tokio::test]
    async fn file_command_rejects_paths_without_a_file_name() {
        assert!(read_attachment("..").await.is_none());
        assert!(read_attachment("").await.is_none());
    }
}
