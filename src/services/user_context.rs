use actix_web::{FromRequest, HttpRequest, dev::Payload};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::Claims;

/// The authenticated caller, injected into handlers via `FromRequest`.
///
/// Extraction fails with `Unauthorized` before the body is read, so an anonymous request
/// never reaches validation or data access.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub email: String,
}

impl UserContext {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
}

impl From<Claims> for UserContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

impl FromRequest for UserContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        ready(
            Claims::from_request(req, payload)
                .into_inner()
                .map(UserContext::from),
        )
    }
}
