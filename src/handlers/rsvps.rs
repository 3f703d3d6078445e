use actix_web::{
    HttpResponse, Result,
    web::{Data, Json, Path},
};
use uuid::Uuid;

use crate::{
    AppState, database::models::SetRsvpInput, handlers::shared::ApiResponse,
    services::UserContext,
};

pub async fn set_rsvp(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    input: Json<SetRsvpInput>,
) -> Result<HttpResponse> {
    let rsvp = state
        .rsvps
        .set_rsvp(path.into_inner(), ctx.user_id(), input.into_inner())
        .await?;

    Ok(ApiResponse::success(rsvp))
}

pub async fn get_user_rsvp(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let rsvp = state
        .rsvps
        .get_user_rsvp(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(rsvp))
}

pub async fn get_event_rsvps(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let rsvps = state
        .rsvps
        .get_event_rsvps(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(rsvps))
}

pub async fn remove_rsvp(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .rsvps
        .remove_rsvp(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success_message("RSVP removed"))
}
