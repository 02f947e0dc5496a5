//! Client side of the event attendance lifecycle.
//!
//! Everything that can be decided locally (session window, prior RSVP,
//! prior check-in) is decided here before a request is made. The server
//! stays the authority on the geofence and on capacity.

pub mod api;
pub mod checkin;
pub mod client;
pub mod geolocation;
pub mod modal;
pub mod notify;
pub mod rsvp;

pub use api::{ApiClient, Failure, Session};
pub use client::AttendanceClient;
pub use geolocation::{FixedGeolocator, GeolocationError, Geolocator, Position, PositionOptions};
pub use modal::{ModalStack, ScrollLock};
pub use notify::{Level, Notification, Notifier};
