use actix_web::{HttpRequest, error::JsonPayloadError, web};

use crate::error::AppError;

pub mod cron;
pub mod events;
pub mod notifications;
pub mod polls;
pub mod rsvps;
pub mod shared;
pub mod visibility;

/// Malformed JSON bodies become `ValidationError`s in the usual envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        AppError::validation(err.to_string()).into()
    })
}

/// Malformed query strings likewise.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| AppError::validation(err.to_string()).into())
}

/// Malformed path ids (e.g. not a UUID) read as missing resources.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(err.to_string()).into())
}
