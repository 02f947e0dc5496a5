use chapter_types::attendance::AttendanceState;
use chapter_types::error::AttendanceError;
use chapter_types::models::MemberEvent;

use crate::api::{Failure, Session};
use crate::client::AttendanceClient;
use crate::geolocation::Geolocator;

impl<G: Geolocator> AttendanceClient<G> {
    /// RSVP if the user has not, un-RSVP if they have. Local state flips only
    /// after the server confirms. A checked-in user has no toggle.
    pub async fn toggle_rsvp(
        &self,
        event: &mut MemberEvent,
        session: Option<&Session>,
    ) -> Result<AttendanceState, AttendanceError> {
        match self.submit_toggle(event, session).await {
            Ok((state, message)) => {
                self.notifier.success(message);
                Ok(state)
            }
            Err(f) => {
                self.notifier.error(f.message);
                Err(f.error)
            }
        }
    }

    async fn submit_toggle(
        &self,
        event: &mut MemberEvent,
        session: Option<&Session>,
    ) -> Result<(AttendanceState, String), Failure> {
        let session = session.ok_or(AttendanceError::NotAuthenticated)?;
        let user_id = &session.user_id;

        match event.state_of(user_id) {
            AttendanceState::NotRsvped => {
                let response = self.api.rsvp(session, &event.id).await?;
                event.event_rsvped.push(user_id.clone());
                Ok((AttendanceState::Rsvped, response.message))
            }
            AttendanceState::Rsvped => {
                let response = self.api.unrsvp(session, &event.id).await?;
                event.event_rsvped.retain(|id| id != user_id);
                Ok((AttendanceState::NotRsvped, response.message))
            }
            AttendanceState::CheckedIn => Err(AttendanceError::AlreadyCheckedIn.into()),
        }
    }
}
