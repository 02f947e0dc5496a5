use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use chapter_types::error::AttendanceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// How old a cached fix may be. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// High accuracy, 10 s timeout, no cached fix.
    pub fn check_in() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("timed out waiting for a position")]
    Timeout,
}

impl From<GeolocationError> for AttendanceError {
    fn from(e: GeolocationError) -> Self {
        match e {
            GeolocationError::PermissionDenied => AttendanceError::PermissionDenied,
            GeolocationError::PositionUnavailable | GeolocationError::Timeout => AttendanceError::LocationUnavailable,
        }
    }
}

/// A device location source, in the shape of the browser's `getCurrentPosition`.
pub trait Geolocator {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Position, GeolocationError>> + Send;
}

/// Ask once, bounded by `options.timeout`. No retry.
pub async fn acquire_position<G: Geolocator>(
    geolocator: &G,
    options: &PositionOptions,
) -> Result<Position, GeolocationError> {
    match tokio::time::timeout(options.timeout, geolocator.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}

/// Always answers the same thing. Useful for kiosks pinned to a venue.
#[derive(Debug, Clone)]
pub struct FixedGeolocator(pub Result<Position, GeolocationError>);

impl Geolocator for FixedGeolocator {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, GeolocationError> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    impl Geolocator for Stalled {
        async fn current_position(&self, _options: &PositionOptions) -> Result<Position, GeolocationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(GeolocationError::PositionUnavailable)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_fix_times_out() {
        let result = acquire_position(&Stalled, &PositionOptions::check_in()).await;
        assert_eq!(result, Err(GeolocationError::Timeout));
    }

    #[tokio::test]
    async fn fixed_answers() {
        let here = Position {
            latitude: 40.0,
            longitude: -83.0,
            accuracy: 5.0,
        };
        let result = acquire_position(&FixedGeolocator(Ok(here)), &PositionOptions::check_in()).await;
        assert_eq!(result, Ok(here));
    }

    #[test]
    fn classification() {
        assert_eq!(
            AttendanceError::from(GeolocationError::PermissionDenied),
            AttendanceError::PermissionDenied
        );
        assert_eq!(AttendanceError::from(GeolocationError::Timeout), AttendanceError::LocationUnavailable);
    }
}
