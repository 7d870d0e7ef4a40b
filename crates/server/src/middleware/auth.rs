//! Bearer-token authentication middleware
//!
//! Tenant management routes require a valid RS256 JWT carrying the
//! administrator role. When no public key is configured the verifier is
//! absent and requests pass through (development mode; logged at startup).

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::AppState;
use tenantgrid_common::{
    auth::{extract_bearer, ADMIN_ROLE},
    errors::{Error, Result},
};

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let Some(verifier) = &state.verifier else {
        return Ok(next.run(request).await);
    };

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::Unauthorized("missing Authorization header".into()))?;

    let token = extract_bearer(header)
        .ok_or_else(|| Error::Unauthorized("Authorization header must be a Bearer token".into()))?;

    let claims = verifier.verify(token)?;
    claims.require_role(ADMIN_ROLE)?;

    debug!(user_id = %claims.sub, path = %request.uri().path(), "Request authenticated");
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
