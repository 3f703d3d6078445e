use actix_web::{
    HttpResponse, Result,
    web::{Data, Json, Path, Query},
};
use uuid::Uuid;

use crate::{
    AppState,
    database::models::{
        CreateEventInput, EventQuery, ResolvePollInput, UpcomingQuery, UpdateEventInput,
    },
    handlers::shared::ApiResponse,
    services::UserContext,
};

pub async fn create_event(
    ctx: UserContext,
    state: Data<AppState>,
    input: Json<CreateEventInput>,
) -> Result<HttpResponse> {
    let event = state
        .events
        .create_event(ctx.user_id(), input.into_inner())
        .await?;

    Ok(ApiResponse::created(event))
}

pub async fn get_event(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let event = state.events.get_event(path.into_inner(), ctx.user_id()).await?;

    Ok(ApiResponse::success(event))
}

pub async fn update_event(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    input: Json<UpdateEventInput>,
) -> Result<HttpResponse> {
    let event = state
        .events
        .update_event(path.into_inner(), ctx.user_id(), input.into_inner())
        .await?;

    Ok(ApiResponse::success(event))
}

pub async fn delete_event(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .events
        .delete_event(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success_message("Event deleted"))
}

pub async fn cancel_event(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let event = state
        .events
        .cancel_event(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(event))
}

pub async fn close_event(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let event = state
        .events
        .close_event(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(event))
}

pub async fn resolve_poll(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    input: Json<ResolvePollInput>,
) -> Result<HttpResponse> {
    let event = state
        .events
        .resolve_poll(path.into_inner(), ctx.user_id(), &input.slot_key)
        .await?;

    Ok(ApiResponse::success(event))
}

pub async fn get_band_events(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    query: Query<EventQuery>,
) -> Result<HttpResponse> {
    let events = state
        .events
        .get_band_events(path.into_inner(), ctx.user_id(), query.into_inner())
        .await?;

    Ok(ApiResponse::success(events))
}

pub async fn get_visible_events(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let events = state
        .events
        .get_visible_events(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(events))
}

pub async fn get_upcoming_events(
    ctx: UserContext,
    state: Data<AppState>,
    query: Query<UpcomingQuery>,
) -> Result<HttpResponse> {
    let events = state
        .events
        .get_upcoming_events(ctx.user_id(), query.limit)
        .await?;

    Ok(ApiResponse::success(events))
}
