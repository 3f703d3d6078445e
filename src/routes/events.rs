use actix_web::web;

use crate::handlers::events;

// No "/events" scope: sibling modules register their own "/events/{id}/..." paths.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/events", web::post().to(events::create_event))
        // Registered before "/events/{id}" so "upcoming" is not taken for an id
        .route("/events/upcoming", web::get().to(events::get_upcoming_events))
        .service(
            web::resource("/events/{id}")
                .route(web::get().to(events::get_event))
                .route(web::put().to(events::update_event))
                .route(web::delete().to(events::delete_event)),
        )
        .route("/events/{id}/cancel", web::post().to(events::cancel_event))
        .route("/events/{id}/close", web::post().to(events::close_event))
        .route("/events/{id}/resolve", web::post().to(events::resolve_poll))
        .service(
            web::scope("/bands/{band_id}/events")
                .route("", web::get().to(events::get_band_events))
                .route("/visible", web::get().to(events::get_visible_events)),
        );
}
