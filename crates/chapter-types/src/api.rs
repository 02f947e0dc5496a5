use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;
use crate::schedule::Schedule;

// -- JWT Claims --

/// Bearer token claims. Issued by the auth routes, validated by the API
/// middleware, and treated as opaque by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

// -- Events --

/// Admin-editable event fields, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    pub event_name: String,
    #[serde(default)]
    pub event_description: String,
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(default)]
    pub event_location: String,
    pub event_lat: f64,
    pub event_long: f64,
    pub event_limit: u32,
    #[serde(default)]
    pub check_in_window: u32,
    pub check_in_radius: f64,
    #[serde(default)]
    pub is_hidden: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HideEventRequest {
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckInRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius in meters, recorded but not used for the geofence.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RsvpResponse {
    pub message: String,
    pub rsvp_count: usize,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// -- Announcements --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub body: String,
}
