use actix_web::web;

use crate::handlers::rsvps;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/events/{id}/rsvp")
            .route(web::put().to(rsvps::set_rsvp))
            .route(web::get().to(rsvps::get_user_rsvp))
            .route(web::delete().to(rsvps::remove_rsvp)),
    )
    .route("/events/{id}/rsvps", web::get().to(rsvps::get_event_rsvps));
}
