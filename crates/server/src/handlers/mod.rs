//! HTTP request handlers

pub mod health;
pub mod tenants;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use serde::Serialize;
use std::convert::Infallible;
use uuid::Uuid;

use tenantgrid_common::errors::Error;

/// Success envelope: every 2xx body wraps its payload as `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// JSON extractor whose rejection uses the service error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct AppJson<T>(pub T);

/// Per-request context: the id from `X-Request-ID` (set by the request-id
/// layer) doubles as the correlation id on published events.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        let request_id = parts
            .headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self { request_id })
    }
}

/// Parse a path segment as a UUID, mapping failures to `INVALID_ID`.
pub fn parse_id(raw: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::InvalidId(raw.to_string()))
}
