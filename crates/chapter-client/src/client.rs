use crate::api::ApiClient;
use crate::geolocation::Geolocator;
use crate::notify::Notifier;

/// RSVP and check-in actions for one signed-in view. Every outcome, good or
/// bad, is also pushed to the notifier; failures never change local state.
pub struct AttendanceClient<G> {
    pub(crate) api: ApiClient,
    pub(crate) geolocator: G,
    pub(crate) notifier: Notifier,
}

impl<G: Geolocator> AttendanceClient<G> {
    pub fn new(api: ApiClient, geolocator: G) -> Self {
        Self {
            api,
            geolocator,
            notifier: Notifier::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}
