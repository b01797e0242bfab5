//! Status capture for access logging.

use axum::http::StatusCode;

/// The status code a request was answered with.
///
/// Starts unset. Reading an unset capture yields `200 OK`, the status an
/// untouched response carries, but [`CapturedStatus::get`] still tells
/// the two apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapturedStatus(Option<StatusCode>);

impl CapturedStatus {
    pub fn set(&mut self, status: StatusCode) {
        self.0 = Some(status);
    }

    #[must_use]
    pub const fn get(&self) -> Option<StatusCode> {
        self.0
    }

    #[must_use]
    pub fn resolve(&self) -> StatusCode {
        self.0.unwrap_or(StatusCode::OK)
    }
}
