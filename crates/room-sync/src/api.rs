//! REST client for the room lifecycle and message submission endpoints.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use room_core::{
    ClientError, CreateRoomRequest, CreatedRoom, ErrorCategory, JoinRoomRequest, JoinedRoom,
    JoinedUser, Message, SendMessageRequest, classify_http_status,
};
use room_core::types::{CreateRoomResponse, JoinRoomResponse, MessagesResponse, SendResponse};
use serde::de::DeserializeOwned;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request/response channel client. All room lifecycle calls and message
/// submissions go through here; the push channel never carries outbound data.
#[derive(Debug, Clone)]
pub struct RoomApi {
    http: reqwest::Client,
    base_url: Url,
}

impl RoomApi {
    /// Build a client against the backend base URL.
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| {
                ClientError::new(
                    ErrorCategory::Internal,
                    "http_client_build",
                    err.to_string(),
                )
            })?;

        Ok(Self { http, base_url })
    }

    /// `POST /api/rooms/create`
    pub async fn create_room(
        &self,
        request: &CreateRoomRequest,
    ) -> Result<CreatedRoom, ClientError> {
        let url = self.api_url("rooms/create")?;
        let response: CreateRoomResponse = self.post_json(url, request).await?;
        match (response.success, response.room) {
            (true, Some(room)) => Ok(room),
            _ => Err(backend_rejected("room create")),
        }
    }

    /// `POST /api/rooms/join`
    pub async fn join_room(
        &self,
        request: &JoinRoomRequest,
    ) -> Result<(JoinedUser, JoinedRoom), ClientError> {
        let url = self.api_url("rooms/join")?;
        let response: JoinRoomResponse = self.post_json(url, request).await?;
        match (response.success, response.user, response.room) {
            (true, Some(user), Some(room)) => Ok((user, room)),
            _ => Err(backend_rejected("room join")),
        }
    }

    /// `GET /api/rooms/{room_id}/messages`
    pub async fn room_messages(&self, room_id: &str) -> Result<Vec<Message>, ClientError> {
        let url = self.api_url(&format!("rooms/{room_id}/messages"))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response: MessagesResponse = decode_body(check_status(response)?).await?;
        if !response.success {
            return Err(backend_rejected("history load"));
        }
        Ok(response.messages)
    }

    /// `POST /api/messages/send`
    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<(), ClientError> {
        let url = self.api_url("messages/send")?;
        let response: SendResponse = self.post_json(url, request).await?;
        if !response.success {
            return Err(backend_rejected("message send"));
        }
        Ok(())
    }

    fn api_url(&self, path: &str) -> Result<Url, ClientError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/api/{path}")).map_err(|err| {
            ClientError::new(
                ErrorCategory::Config,
                "invalid_url",
                format!("failed building endpoint URL for '{path}': {err}"),
            )
        })
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ClientError>
    where
        B: serde::Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        decode_body(check_status(response)?).await
    }
}

fn backend_rejected(action: &str) -> ClientError {
    ClientError::new(
        ErrorCategory::Config,
        "backend_rejected",
        format!("backend rejected {action}"),
    )
}

fn map_transport_error(err: reqwest::Error) -> ClientError {
    let code = if err.is_timeout() {
        "request_timeout"
    } else {
        "request_failed"
    };
    ClientError::new(ErrorCategory::Network, code, err.to_string())
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let mut error = ClientError::new(
        classify_http_status(status.as_u16()),
        "http_status",
        format!("backend returned {status}"),
    );
    if let Some(seconds) = retry_after_secs {
        error = error.with_retry_after(Duration::from_secs(seconds));
    }
    Err(error)
}

async fn decode_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    response.json::<T>().await.map_err(|err| {
        ClientError::new(
            ErrorCategory::Serialization,
            "response_decode",
            err.to_string(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> RoomApi {
        RoomApi::new(Url::parse(base).expect("valid base URL")).expect("client should build")
    }

    #[test]
    fn builds_endpoint_urls() {
        let api = api("http://localhost:8000");
        assert_eq!(
            api.api_url("rooms/create").expect("valid url").as_str(),
            "http://localhost:8000/api/rooms/create"
        );
        assert_eq!(
            api.api_url("rooms/483920/messages")
                .expect("valid url")
                .as_str(),
            "http://localhost:8000/api/rooms/483920/messages"
        );
    }

    #[test]
    fn tolerates_trailing_slash_in_base_url() {
        let api = api("http://localhost:8000/");
        assert_eq!(
            api.api_url("messages/send").expect("valid url").as_str(),
            "http://localhost:8000/api/messages/send"
        );
    }
}
