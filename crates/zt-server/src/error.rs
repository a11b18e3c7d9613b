//! Response envelopes and the mapping from tracker errors to HTTP statuses.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use zt_core::TrackerError;

/// Successful response: `{success: true, data?, message?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl<T> Envelope<T> {
    pub const fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub const fn with_message(data: T, message: &'static str) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

impl Envelope<()> {
    pub const fn message(message: &'static str) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

/// Failed response: `{success: false, error}` with a matching status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Nicht angemeldet")
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::debug!(error = %err, "rejected JSON body");
        Self::bad_request("Ungültige Anfrage")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected query string");
        Self::bad_request("Ungültige Anfrage")
    }
}

/// Maps a tracker error to a response, using `context` as the message for
/// storage failures so no internal detail reaches the caller.
pub fn failure(context: &'static str) -> impl Fn(TrackerError) -> ApiError {
    move |err| match err {
        TrackerError::Validation(message) | TrackerError::Conflict(message) => {
            ApiError::bad_request(message)
        }
        TrackerError::NotFound(message) => ApiError::new(StatusCode::NOT_FOUND, message),
        TrackerError::Storage(source) => {
            tracing::error!(error = %source, context, "storage failure");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_per_error_kind() {
        let map = failure("Fehler beim Laden");
        assert_eq!(
            map(TrackerError::Conflict("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            map(TrackerError::Validation("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            map(TrackerError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn storage_failure_hides_detail() {
        let err = TrackerError::storage(std::io::Error::other("disk I/O error at page 7"));
        let api = failure("Fehler beim Laden")(err);
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "Fehler beim Laden");
    }

    #[test]
    fn envelope_omits_missing_parts() {
        let json = serde_json::to_string(&Envelope::message("Eintrag gelöscht")).unwrap();
        assert_eq!(json, r#"{"success":true,"message":"Eintrag gelöscht"}"#);
        let json = serde_json::to_string(&Envelope::data(3)).unwrap();
        assert_eq!(json, r#"{"success":true,"data":3}"#);
    }
}
