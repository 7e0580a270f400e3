//! Caller identity extraction.
//!
//! Authentication happens upstream; by the time a request reaches this
//! service the auth layer has installed an `X-User-Id` header. The extractor
//! only validates presence and shape, it never verifies credentials.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use audora_core::AppError;

use crate::error::HttpAppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller context for handlers.
#[derive(Debug, Clone, Copy)]
pub struct UserContext {
    pub user_id: Uuid,
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?;

        let value = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header".to_string()))?;

        let user_id = Uuid::parse_str(value)
            .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header".to_string()))?;

        Ok(UserContext { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<UserContext, HttpAppError> {
        let (mut parts, _) = request.into_parts();
        UserContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_valid_user_id() {
        let user_id = Uuid::new_v4();
        let request = Request::builder()
            .header("X-User-Id", user_id.to_string())
            .body(())
            .unwrap();
        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.user_id, user_id);
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let request = Request::builder().body(()).unwrap();
        let err = extract(request).await.unwrap_err();
        assert!(matches!(err.0, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_user_id() {
        let request = Request::builder()
            .header("X-User-Id", "not-a-uuid")
            .body(())
            .unwrap();
        let err = extract(request).await.unwrap_err();
        assert!(matches!(err.0, AppError::Unauthorized(_)));
    }
}
