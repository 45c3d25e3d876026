use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::types::identity::{
    CallerIdentity, ALT_FIRST_NAME_HEADER, ALT_LAST_NAME_HEADER, FIRST_NAME_HEADER,
    LAST_NAME_HEADER, USER_ID_HEADER,
};

pub const MISSING_IDENTITY: &str = "Missing user identity headers";

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_headers(&parts.headers)
    }
}

/// Resolves the caller from request headers.
///
/// Name components fall back to the `X-User-*` spelling when the primary
/// header is absent. Blank values count as absent.
pub fn identity_from_headers(headers: &HeaderMap) -> Result<CallerIdentity, AppError> {
    let user_id = header_value(headers, USER_ID_HEADER);
    let first_name = header_value(headers, FIRST_NAME_HEADER)
        .or_else(|| header_value(headers, ALT_FIRST_NAME_HEADER));
    let last_name = header_value(headers, LAST_NAME_HEADER)
        .or_else(|| header_value(headers, ALT_LAST_NAME_HEADER));

    match (user_id, first_name, last_name) {
        (Some(user_id), Some(first_name), Some(last_name)) => Ok(CallerIdentity {
            user_id,
            first_name,
            last_name,
        }),
        _ => Err(AppError::unauthorized(MISSING_IDENTITY)),
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
