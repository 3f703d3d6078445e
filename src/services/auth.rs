use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

/// Bearer-token claims. Tokens are issued by the sign-in flow; this service only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub exp: usize, // expiration time
}

impl Claims {
    pub fn new(user_id: Uuid, email: impl Into<String>, ttl: Duration) -> Self {
        let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
        Self {
            sub: user_id,
            email: email.into(),
            exp,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    pub fn encode(&self, secret: &str) -> Result<String, AppError> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .map_err(|e| AppError::internal_server_error_message(format!("token encoding: {}", e)))
    }

    pub fn decode(token: &str, secret: &str) -> Result<Self, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized
        })
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Compares a presented secret with the configured one without short-circuiting on the
/// first differing byte.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    if presented.len() != expected.len() {
        return false;
    }

    presented
        .bytes()
        .zip(expected.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::Unauthorized));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            log::error!("Config missing from app data; cannot verify tokens");
            return ready(Err(AppError::InternalServerError(None)));
        };

        ready(Claims::decode(token, &config.jwt_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn secrets_match_only_on_identical_input() {
        assert!(secrets_match("cron-secret-1", "cron-secret-1"));
        assert!(!secrets_match("cron-secret-2", "cron-secret-1"));
        assert!(!secrets_match("cron-secret", "cron-secret-1"));
        assert!(!secrets_match("", "cron-secret-1"));
    }

    #[test]
    fn round_trips_through_a_signed_token() {
        let user_id = Uuid::new_v4();
        let token = Claims::new(user_id, "drummer@example.com", Duration::hours(1))
            .encode(SECRET)
            .unwrap();

        let claims = Claims::decode(&token, SECRET).unwrap();
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.email, "drummer@example.com");
    }

    #[test]
    fn rejects_expired_and_foreign_tokens() {
        let expired = Claims::new(Uuid::new_v4(), "a@example.com", Duration::hours(-2))
            .encode(SECRET)
            .unwrap();
        assert!(matches!(
            Claims::decode(&expired, SECRET),
            Err(AppError::Unauthorized)
        ));

        let foreign = Claims::new(Uuid::new_v4(), "a@example.com", Duration::hours(1))
            .encode("another-secret")
            .unwrap();
        assert!(matches!(
            Claims::decode(&foreign, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn extracts_bearer_tokens_only() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        let basic = TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(&basic), None);

        assert_eq!(bearer_token(&TestRequest::default().to_http_request()), None);
    }
}
