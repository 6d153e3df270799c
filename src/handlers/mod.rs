pub mod cart;
pub mod orders;
pub mod products;
pub mod sessions;
pub mod webhook;

use crate::domain::session::SessionId;
use crate::errors::AppError;

/// Validate a `{session_id}` path segment.
pub(crate) fn session_from_path(raw: &str) -> Result<SessionId, AppError> {
    SessionId::parse(raw).map_err(AppError::from)
}
