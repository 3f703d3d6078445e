use actix_web::web;

use crate::handlers::notifications;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notifications")
            .route("", web::get().to(notifications::list_notifications))
            .route(
                "/unread-count",
                web::get().to(notifications::get_unread_count),
            )
            .route(
                "/read-all",
                web::post().to(notifications::mark_all_notifications_read),
            )
            .route("/preferences", web::get().to(notifications::get_preferences))
            .route(
                "/preferences",
                web::put().to(notifications::update_preferences),
            )
            .route(
                "/push-subscriptions",
                web::post().to(notifications::subscribe_push),
            )
            .route(
                "/push-subscriptions",
                web::delete().to(notifications::unsubscribe_push),
            )
            .route(
                "/{id}/read",
                web::post().to(notifications::mark_notification_read),
            )
            .route("/{id}", web::delete().to(notifications::delete_notification)),
    );
}
