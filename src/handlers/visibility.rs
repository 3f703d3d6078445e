use actix_web::{
    HttpResponse, Result,
    web::{Data, Json, Path},
};
use uuid::Uuid;

use crate::{
    AppState, database::models::VisibleUsersInput, handlers::shared::ApiResponse,
    services::UserContext,
};

pub async fn get_event_visibility(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let user_ids = state
        .visibility
        .get_event_visibility(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(user_ids))
}

pub async fn set_event_visibility(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    input: Json<VisibleUsersInput>,
) -> Result<HttpResponse> {
    let user_ids = state
        .visibility
        .set_event_visibility(path.into_inner(), ctx.user_id(), input.into_inner().user_ids)
        .await?;

    Ok(ApiResponse::success(user_ids))
}

pub async fn add_visible_users(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    input: Json<VisibleUsersInput>,
) -> Result<HttpResponse> {
    let user_ids = state
        .visibility
        .add_visible_users(path.into_inner(), ctx.user_id(), input.into_inner().user_ids)
        .await?;

    Ok(ApiResponse::success(user_ids))
}

pub async fn remove_visible_users(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    input: Json<VisibleUsersInput>,
) -> Result<HttpResponse> {
    let user_ids = state
        .visibility
        .remove_visible_users(path.into_inner(), ctx.user_id(), input.into_inner().user_ids)
        .await?;

    Ok(ApiResponse::success(user_ids))
}
