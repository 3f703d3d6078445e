use actix_web::{
    HttpResponse, Result,
    web::{Data, Json, Path, Query},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    database::models::{
        NotificationQuery, SubscribePushInput, UnsubscribePushInput, UpdatePreferencesInput,
    },
    handlers::shared::ApiResponse,
    services::UserContext,
};

pub async fn list_notifications(
    ctx: UserContext,
    state: Data<AppState>,
    query: Query<NotificationQuery>,
) -> Result<HttpResponse> {
    let notifications = state
        .notifications
        .list_notifications(ctx.user_id(), query.into_inner())
        .await?;

    Ok(ApiResponse::success(notifications))
}

pub async fn get_unread_count(ctx: UserContext, state: Data<AppState>) -> Result<HttpResponse> {
    let count = state.notifications.unread_count(ctx.user_id()).await?;

    Ok(ApiResponse::success(json!({ "count": count })))
}

pub async fn mark_notification_read(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    let notification = state
        .notifications
        .mark_read(ctx.user_id(), path.into_inner())
        .await?;

    Ok(ApiResponse::success(notification))
}

pub async fn mark_all_notifications_read(
    ctx: UserContext,
    state: Data<AppState>,
) -> Result<HttpResponse> {
    let updated = state.notifications.mark_all_read(ctx.user_id()).await?;

    Ok(ApiResponse::success(json!({ "updated": updated })))
}

pub async fn delete_notification(
    ctx: UserContext,
    state: Data<AppState>,
    path: Path<Uuid>,
) -> Result<HttpResponse> {
    state
        .notifications
        .delete(ctx.user_id(), path.into_inner())
        .await?;

    Ok(ApiResponse::success_message("Notification deleted"))
}

pub async fn get_preferences(ctx: UserContext, state: Data<AppState>) -> Result<HttpResponse> {
    let preferences = state.notifications.get_preferences(ctx.user_id()).await?;

    Ok(ApiResponse::success(preferences))
}

pub async fn update_preferences(
    ctx: UserContext,
    state: Data<AppState>,
    input: Json<UpdatePreferencesInput>,
) -> Result<HttpResponse> {
    let preferences = state
        .notifications
        .update_preferences(ctx.user_id(), input.into_inner())
        .await?;

    Ok(ApiResponse::success(preferences))
}

pub async fn subscribe_push(
    ctx: UserContext,
    state: Data<AppState>,
    input: Json<SubscribePushInput>,
) -> Result<HttpResponse> {
    let subscription = state
        .notifications
        .subscribe_push(ctx.user_id(), input.into_inner())
        .await?;

    Ok(ApiResponse::created(subscription))
}

pub async fn unsubscribe_push(
    ctx: UserContext,
    state: Data<AppState>,
    input: Json<UnsubscribePushInput>,
) -> Result<HttpResponse> {
    state
        .notifications
        .unsubscribe_push(ctx.user_id(), &input.endpoint)
        .await?;

    Ok(ApiResponse::success_message("Unsubscribed from push"))
}
