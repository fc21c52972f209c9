// Identity boundary: authentication lives in an external provider, so the
// only thing handlers ever see is the opaque clerk user id it forwarded.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const CLERK_USER_HEADER: &str = "x-clerk-user-id";

/// The authenticated caller's clerk user id, taken from the
/// `x-clerk-user-id` header the auth middleware sets. Requests without it
/// are rejected before the handler runs.
#[derive(Debug, Clone)]
pub struct ClerkUser(pub String);

impl<S> FromRequestParts<S> for ClerkUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let result = parts
            .headers
            .get(CLERK_USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| ClerkUser(value.to_string()))
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing {} header", CLERK_USER_HEADER))
            });

        async move { result }
    }
}
