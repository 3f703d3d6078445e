use actix_web::{HttpRequest, HttpResponse, Result, web::Data};
use chrono::Utc;

use crate::{
    AppState,
    config::Config,
    error::AppError,
    handlers::shared::ApiResponse,
    middleware::RequestIdExt,
    services::auth::{bearer_token, secrets_match},
};

/// Reminder trigger for the external scheduler, authenticated with the shared cron secret.
pub async fn run_reminders(
    req: HttpRequest,
    state: Data<AppState>,
    config: Data<Config>,
) -> Result<HttpResponse> {
    let Some(secret) = config.cron_secret.as_deref() else {
        log::warn!("Reminder trigger called but CRON_SECRET is not configured");
        return Err(AppError::Unauthorized.into());
    };
    let authorized = bearer_token(&req).is_some_and(|token| secrets_match(token, secret));
    if !authorized {
        return Err(AppError::Unauthorized.into());
    }

    log::info!(
        "Reminder run triggered (correlation_id={})",
        req.correlation_id().as_deref().unwrap_or("-")
    );
    let report = state.reminders.run(Utc::now()).await?;

    Ok(ApiResponse::success(report))
}
