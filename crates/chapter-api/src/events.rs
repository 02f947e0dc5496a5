use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use chrono::Local;
use tracing::info;
use uuid::Uuid;

use chapter_db::{CheckInOutcome, RsvpOutcome, UnrsvpOutcome};
use chapter_types::api::{CheckInRequest, Claims, EventInput, HideEventRequest, MessageResponse, RsvpResponse};
use chapter_types::attendance::precheck_check_in;
use chapter_types::error::AttendanceError;
use chapter_types::geo::{haversine_distance, valid_coordinates};
use chapter_types::models::{Event, MemberEvent, PublicEvent};

use crate::auth::{AppState, with_db};
use crate::error::ApiError;
use crate::middleware::require_admin;

/// GET /events: admins see every event in full, members see the visible
/// ones with membership sets.
pub async fn list_events(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, ApiError> {
    let admin = claims.is_admin();
    let events = with_db(&state, move |db| db.list_events(admin)).await?;

    if admin {
        Ok(Json(events).into_response())
    } else {
        let events: Vec<MemberEvent> = events.into_iter().map(MemberEvent::from).collect();
        Ok(Json(events).into_response())
    }
}

/// GET /events/public: no auth, no user ids.
pub async fn list_public_events(State(state): State<AppState>) -> Result<Json<Vec<PublicEvent>>, ApiError> {
    let events = with_db(&state, |db| db.list_events(false)).await?;
    Ok(Json(events.into_iter().map(PublicEvent::from).collect()))
}

pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(input), _): WithRejection<Json<EventInput>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;
    validate_event_input(&input)?;

    let event_id = Uuid::new_v4().to_string();
    let id = event_id.clone();
    let event = with_db(&state, move |db| {
        db.insert_event(&id, &input)?;
        db.get_event(&id)
    })
    .await?
    .ok_or_else(|| ApiError::Internal(format!("event '{}' missing after insert", event_id)))?;

    info!(event_id = %event.id, created_by = %claims.sub, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<AppState>,
    WithRejection(Path(event_id), _): WithRejection<Path<String>, ApiError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(input), _): WithRejection<Json<EventInput>, ApiError>,
) -> Result<Json<Event>, ApiError> {
    require_admin(&claims)?;
    validate_event_input(&input)?;

    let id = event_id.clone();
    let event = with_db(&state, move |db| {
        if db.update_event(&id, &input)? {
            db.get_event(&id)
        } else {
            Ok(None)
        }
    })
    .await?
    .ok_or(AttendanceError::EventNotFound)?;

    info!(event_id = %event_id, "Event updated");
    Ok(Json(event))
}

/// POST /events/{id}/hide: move an event in or out of the admin-only bucket.
pub async fn set_event_hidden(
    State(state): State<AppState>,
    WithRejection(Path(event_id), _): WithRejection<Path<String>, ApiError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<HideEventRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin(&claims)?;

    let id = event_id.clone();
    let hidden = req.hidden;
    if !with_db(&state, move |db| db.set_event_hidden(&id, hidden)).await? {
        return Err(AttendanceError::EventNotFound.into());
    }

    let message = if hidden { "Event hidden" } else { "Event visible" };
    info!(event_id = %event_id, hidden, "Event visibility changed");
    Ok(Json(MessageResponse { message: message.into() }))
}

pub async fn delete_event(
    State(state): State<AppState>,
    WithRejection(Path(event_id), _): WithRejection<Path<String>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_admin(&claims)?;

    let id = event_id.clone();
    if !with_db(&state, move |db| db.delete_event(&id)).await? {
        return Err(AttendanceError::EventNotFound.into());
    }

    info!(event_id = %event_id, "Event deleted");
    Ok(Json(MessageResponse { message: "Event deleted".into() }))
}

/// POST /events/rsvp/{id}
pub async fn rsvp(
    State(state): State<AppState>,
    WithRejection(Path(event_id), _): WithRejection<Path<String>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RsvpResponse>, ApiError> {
    let user_id = claims.sub.to_string();
    let admin = claims.is_admin();
    let (eid, uid) = (event_id.clone(), user_id.clone());

    let outcome = with_db(&state, move |db| db.add_rsvp(&eid, &uid, admin)).await?;

    match outcome {
        RsvpOutcome::Added { rsvp_count } => {
            info!(event_id = %event_id, user_id = %user_id, rsvp_count, "RSVP added");
            Ok(Json(RsvpResponse {
                message: "RSVP confirmed".into(),
                rsvp_count,
            }))
        }
        RsvpOutcome::AlreadyRsvped => Err(AttendanceError::AlreadyRsvped.into()),
        RsvpOutcome::CapacityExceeded => Err(AttendanceError::CapacityExceeded.into()),
        RsvpOutcome::EventNotFound => Err(AttendanceError::EventNotFound.into()),
    }
}

/// POST /events/unrsvp/{id}: succeeds whether or not an RSVP existed.
pub async fn unrsvp(
    State(state): State<AppState>,
    WithRejection(Path(event_id), _): WithRejection<Path<String>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = claims.sub.to_string();
    let admin = claims.is_admin();
    let (eid, uid) = (event_id.clone(), user_id.clone());

    let outcome = with_db(&state, move |db| db.remove_rsvp(&eid, &uid, admin)).await?;

    match outcome {
        UnrsvpOutcome::Removed | UnrsvpOutcome::NotPresent => {
            info!(event_id = %event_id, user_id = %user_id, ?outcome, "RSVP removed");
            Ok(Json(MessageResponse {
                message: "RSVP removed".into(),
            }))
        }
        UnrsvpOutcome::AlreadyCheckedIn => Err(AttendanceError::AlreadyCheckedIn.into()),
        UnrsvpOutcome::EventNotFound => Err(AttendanceError::EventNotFound.into()),
    }
}

/// POST /events/checkin/{id}: the server is the authority on the session
/// window, RSVP membership and the geofence.
pub async fn check_in(
    State(state): State<AppState>,
    WithRejection(Path(event_id), _): WithRejection<Path<String>, ApiError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CheckInRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !valid_coordinates(req.latitude, req.longitude) {
        return Err(ApiError::Validation("Latitude or longitude out of range".into()));
    }
    if let Some(accuracy) = req.accuracy {
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(ApiError::Validation("Accuracy must be a non-negative number".into()));
        }
    }

    let admin = claims.is_admin();
    let eid = event_id.clone();
    let event = with_db(&state, move |db| db.get_event(&eid))
        .await?
        .filter(|e| admin || !e.is_hidden)
        .ok_or(AttendanceError::EventNotFound)?;

    let user_id = claims.sub.to_string();
    precheck_check_in(&event.schedule, event.state_of(&user_id), Local::now().naive_local())?;

    let distance = haversine_distance(event.event_lat, event.event_long, req.latitude, req.longitude);
    if distance > event.check_in_radius {
        info!(
            event_id = %event_id,
            user_id = %user_id,
            distance_m = distance,
            radius_m = event.check_in_radius,
            "Check-in outside geofence"
        );
        return Err(AttendanceError::OutsideGeofence.into());
    }

    let (eid, uid) = (event_id.clone(), user_id.clone());
    let outcome = with_db(&state, move |db| {
        db.record_attendance(&eid, &uid, req.latitude, req.longitude, req.accuracy)
    })
    .await?;

    match outcome {
        CheckInOutcome::Recorded => {
            info!(event_id = %event_id, user_id = %user_id, distance_m = distance, "Checked in");
            Ok(Json(MessageResponse {
                message: format!("Checked in to {}", event.event_name),
            }))
        }
        CheckInOutcome::AlreadyCheckedIn => Err(AttendanceError::AlreadyCheckedIn.into()),
        CheckInOutcome::NotRsvped => Err(AttendanceError::NotRsvped.into()),
        CheckInOutcome::EventNotFound => Err(AttendanceError::EventNotFound.into()),
    }
}

fn validate_event_input(input: &EventInput) -> Result<(), ApiError> {
    if input.event_name.trim().is_empty() {
        return Err(ApiError::Validation("Event name is required".into()));
    }
    let hours = input.schedule.event_hours;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(ApiError::Validation("Event duration must be a positive number of hours".into()));
    }
    if !valid_coordinates(input.event_lat, input.event_long) {
        return Err(ApiError::Validation("Event latitude or longitude out of range".into()));
    }
    if !input.check_in_radius.is_finite() || input.check_in_radius < 0.0 {
        return Err(ApiError::Validation("Check-in radius must be a non-negative number of meters".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapter_types::schedule::Schedule;

    fn input() -> EventInput {
        EventInput {
            event_name: "Career Fair Prep".into(),
            event_description: String::new(),
            schedule: Schedule {
                event_date: chrono::NaiveDate::from_ymd_opt(2026, 11, 2),
                event_time: None,
                event_hours: 2.0,
            },
            event_location: String::new(),
            event_lat: 40.0,
            event_long: -83.0,
            event_limit: 30,
            check_in_window: 0,
            check_in_radius: 100.0,
            is_hidden: false,
        }
    }

    #[test]
    fn accepts_reasonable_input() {
        assert!(validate_event_input(&input()).is_ok());
    }

    #[test]
    fn rejects_bad_input() {
        let blank = EventInput { event_name: "  ".into(), ..input() };
        assert!(validate_event_input(&blank).is_err());

        let mut zero_hours = input();
        zero_hours.schedule.event_hours = 0.0;
        assert!(validate_event_input(&zero_hours).is_err());

        let off_map = EventInput { event_lat: 91.0, ..input() };
        assert!(validate_event_input(&off_map).is_err());

        let negative_radius = EventInput { check_in_radius: -1.0, ..input() };
        assert!(validate_event_input(&negative_radius).is_err());
    }
}
