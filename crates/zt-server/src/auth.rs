//! Caller identity supplied by the session layer in front of the server.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use zt_core::OwnerId;

use crate::error::ApiError;

pub const OWNER_ID_HEADER: &str = "x-owner-id";
pub const OWNER_NAME_HEADER: &str = "x-owner-name";

/// The authenticated owner of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: OwnerId,
    pub name: Option<String>,
}

impl Owner {
    /// Name shown on printable reports, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.id.as_str())
    }

    fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let id = header_text(headers, OWNER_ID_HEADER)
            .and_then(|raw| OwnerId::new(raw).ok())
            .ok_or_else(ApiError::unauthorized)?;
        let name = header_text(headers, OWNER_NAME_HEADER)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);
        Ok(Self { id, name })
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
