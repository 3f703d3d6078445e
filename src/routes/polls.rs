use actix_web::web;

use crate::handlers::polls;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/events/{id}/votes", web::post().to(polls::submit_vote))
        .route("/events/{id}/votes/me", web::get().to(polls::get_user_votes))
        .route(
            "/events/{id}/poll/results",
            web::get().to(polls::get_poll_results),
        )
        .route(
            "/events/{id}/poll/summary",
            web::get().to(polls::get_poll_summary),
        );
}
