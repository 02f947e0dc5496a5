use thiserror::Error;

/// Failures of the RSVP / check-in lifecycle. Shared by the server (which
/// renders `code()` and the message into the error body) and the client
/// (which maps the body back into a variant).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("You have already RSVP'd to this event")]
    AlreadyRsvped,

    #[error("This event has reached its RSVP limit")]
    CapacityExceeded,

    #[error("You must RSVP to this event before checking in")]
    NotRsvped,

    #[error("You have already checked in to this event")]
    AlreadyCheckedIn,

    #[error("You must be signed in to do that")]
    NotAuthenticated,

    #[error("Unable to determine your location")]
    LocationUnavailable,

    #[error("Location permission was denied")]
    PermissionDenied,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("This event is not currently in session")]
    EventNotInSession,

    #[error("You are too far from the event location to check in")]
    OutsideGeofence,

    #[error("Event not found")]
    EventNotFound,

    /// A server rejection outside this taxonomy, carried verbatim.
    #[error("{0}")]
    Rejected(String),
}

impl AttendanceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRsvped => "ALREADY_RSVPED",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::NotRsvped => "NOT_RSVPED",
            Self::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::LocationUnavailable => "LOCATION_UNAVAILABLE",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NetworkError(_) => "NETWORK_ERROR",
            Self::EventNotInSession => "EVENT_NOT_IN_SESSION",
            Self::OutsideGeofence => "OUTSIDE_GEOFENCE",
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::Rejected(_) => "REJECTED",
        }
    }

    /// Inverse of `code()` for the variants that carry no payload.
    pub fn from_code(code: &str) -> Option<Self> {
        let err = match code {
            "ALREADY_RSVPED" => Self::AlreadyRsvped,
            "CAPACITY_EXCEEDED" => Self::CapacityExceeded,
            "NOT_RSVPED" => Self::NotRsvped,
            "ALREADY_CHECKED_IN" => Self::AlreadyCheckedIn,
            "NOT_AUTHENTICATED" => Self::NotAuthenticated,
            "LOCATION_UNAVAILABLE" => Self::LocationUnavailable,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "EVENT_NOT_IN_SESSION" => Self::EventNotInSession,
            "OUTSIDE_GEOFENCE" => Self::OutsideGeofence,
            "EVENT_NOT_FOUND" => Self::EventNotFound,
            _ => return None,
        };
        Some(err)
    }
}
