use actix_web::{
    HttpResponse, Result,
    web::{Data, Json, Path},
};
use uuid::Uuid;

use crate::{
    AppState, database::models::SubmitVoteInput, handlers::shared::ApiResponse,
    services::UserContext,
};

pub async fn submit_vote(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
    input: Json<SubmitVoteInput>,
) -> Result<HttpResponse> {
    let vote = state
        .polls
        .submit_vote(path.into_inner(), ctx.user_id(), input.into_inner())
        .await?;

    Ok(ApiResponse::success(vote))
}

pub async fn get_user_votes(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let votes = state
        .polls
        .get_user_votes(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(votes))
}

pub async fn get_poll_results(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let results = state
        .polls
        .get_poll_results(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(results))
}

pub async fn get_poll_summary(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let summary = state
        .polls
        .get_poll_summary(path.into_inner(), ctx.user_id())
        .await?;

    Ok(ApiResponse::success(summary))
}
