use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use chapter_types::api::{CheckInRequest, ErrorResponse, MessageResponse, RsvpResponse};
use chapter_types::error::AttendanceError;
use chapter_types::models::MemberEvent;

/// Shown when the server rejects a request without a readable message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Credentials handed out by the identity provider: an opaque bearer token
/// and the user id the server knows this user by.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
}

/// A failed request: how it classifies, and what the user should read.
/// `message` is the server's own wording whenever it sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub error: AttendanceError,
    pub message: String,
}

impl From<AttendanceError> for Failure {
    fn from(error: AttendanceError) -> Self {
        Self {
            message: error.to_string(),
            error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_events(&self, session: &Session) -> Result<Vec<MemberEvent>, Failure> {
        let resp = self
            .http
            .get(format!("{}/events", self.base_url))
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(network_error)?;
        read_body(resp).await
    }

    pub async fn rsvp(&self, session: &Session, event_id: &str) -> Result<RsvpResponse, Failure> {
        self.post(&format!("/events/rsvp/{}", event_id), session, None::<&()>).await
    }

    pub async fn unrsvp(&self, session: &Session, event_id: &str) -> Result<MessageResponse, Failure> {
        self.post(&format!("/events/unrsvp/{}", event_id), session, None::<&()>).await
    }

    pub async fn check_in(
        &self,
        session: &Session,
        event_id: &str,
        req: &CheckInRequest,
    ) -> Result<MessageResponse, Failure> {
        self.post(&format!("/events/checkin/{}", event_id), session, Some(req)).await
    }

    async fn post<B, R>(&self, path: &str, session: &Session, body: Option<&B>) -> Result<R, Failure>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&session.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(path, "POST");
        let resp = request.send().await.map_err(network_error)?;
        read_body(resp).await
    }
}

fn network_error(e: reqwest::Error) -> Failure {
    AttendanceError::NetworkError(e.to_string()).into()
}

async fn read_body<R: DeserializeOwned>(resp: Response) -> Result<R, Failure> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<R>()
            .await
            .map_err(|e| Failure::from(AttendanceError::NetworkError(format!("unreadable response: {}", e))));
    }
    Err(failure(status, resp.json::<ErrorResponse>().await.ok()))
}

/// Known codes map back onto the taxonomy, unknown ones become `Rejected`.
/// The server's message is kept either way; with no body the generic
/// fallback is shown.
fn failure(status: StatusCode, body: Option<ErrorResponse>) -> Failure {
    debug!(%status, "Request rejected");
    match body {
        Some(body) if !body.error.trim().is_empty() => Failure {
            error: AttendanceError::from_code(&body.code)
                .unwrap_or_else(|| AttendanceError::Rejected(body.error.clone())),
            message: body.error,
        },
        Some(body) => AttendanceError::from_code(&body.code)
            .unwrap_or_else(|| AttendanceError::Rejected(GENERIC_FAILURE.to_string()))
            .into(),
        None if status == StatusCode::UNAUTHORIZED => AttendanceError::NotAuthenticated.into(),
        None => AttendanceError::Rejected(GENERIC_FAILURE.to_string()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: &str, error: &str) -> Option<ErrorResponse> {
        Some(ErrorResponse {
            error: error.into(),
            code: code.into(),
        })
    }

    #[test]
    fn known_codes_become_variants_with_server_wording() {
        let f = failure(StatusCode::CONFLICT, body("CAPACITY_EXCEEDED", "The Fall Banquet is full (40/40)"));
        assert_eq!(f.error, AttendanceError::CapacityExceeded);
        assert_eq!(f.message, "The Fall Banquet is full (40/40)");
    }

    #[test]
    fn unknown_codes_keep_the_message() {
        let f = failure(StatusCode::BAD_REQUEST, body("VALIDATION_ERROR", "Latitude or longitude out of range"));
        assert_eq!(f.error, AttendanceError::Rejected("Latitude or longitude out of range".into()));
        assert_eq!(f.message, "Latitude or longitude out of range");
    }

    #[test]
    fn blank_message_uses_variant_text() {
        let f = failure(StatusCode::CONFLICT, body("ALREADY_RSVPED", ""));
        assert_eq!(f.error, AttendanceError::AlreadyRsvped);
        assert_eq!(f.message, "You have already RSVP'd to this event");
    }

    #[test]
    fn empty_bodies_fall_back() {
        assert_eq!(failure(StatusCode::UNAUTHORIZED, None).error, AttendanceError::NotAuthenticated);
        let f = failure(StatusCode::BAD_GATEWAY, None);
        assert_eq!(f.error, AttendanceError::Rejected(GENERIC_FAILURE.into()));
        assert_eq!(f.message, GENERIC_FAILURE);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }
}
