use chrono::{Local, NaiveDateTime};
use tracing::debug;

use chapter_types::api::CheckInRequest;
use chapter_types::error::AttendanceError;
use chapter_types::models::MemberEvent;

use crate::api::{Failure, Session};
use crate::client::AttendanceClient;
use crate::geolocation::{Geolocator, PositionOptions, acquire_position};

impl<G: Geolocator> AttendanceClient<G> {
    pub async fn check_in(
        &self,
        event: &mut MemberEvent,
        session: Option<&Session>,
    ) -> Result<String, AttendanceError> {
        self.check_in_at(event, session, Local::now().naive_local()).await
    }

    /// Runs the local checks in order and only then asks for a position and
    /// calls the server. On success the user is added to the local
    /// `event_attending`; on failure nothing local changes.
    pub async fn check_in_at(
        &self,
        event: &mut MemberEvent,
        session: Option<&Session>,
        now: NaiveDateTime,
    ) -> Result<String, AttendanceError> {
        match self.submit_check_in(event, session, now).await {
            Ok(message) => {
                self.notifier.success(message.clone());
                Ok(message)
            }
            Err(f) => {
                if f.error == AttendanceError::EventNotInSession {
                    self.notifier.modal(f.message);
                } else {
                    self.notifier.error(f.message);
                }
                Err(f.error)
            }
        }
    }

    async fn submit_check_in(
        &self,
        event: &mut MemberEvent,
        session: Option<&Session>,
        now: NaiveDateTime,
    ) -> Result<String, Failure> {
        if !event.schedule.is_in_session_at(now) {
            return Err(AttendanceError::EventNotInSession.into());
        }

        let session = session.ok_or(AttendanceError::NotAuthenticated)?;

        // AlreadyCheckedIn before NotRsvped
        event.state_of(&session.user_id).check_in()?;

        let position = acquire_position(&self.geolocator, &PositionOptions::check_in())
            .await
            .map_err(AttendanceError::from)?;
        debug!(
            event_id = %event.id,
            latitude = position.latitude,
            longitude = position.longitude,
            accuracy = position.accuracy,
            "Submitting check-in"
        );

        let req = CheckInRequest {
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: Some(position.accuracy),
        };
        let response = self.api.check_in(session, &event.id, &req).await?;

        if !event.event_attending.contains(&session.user_id) {
            event.event_attending.push(session.user_id.clone());
        }

        Ok(response.message)
    }
}
