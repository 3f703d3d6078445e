use actix_web::web;

use crate::handlers::visibility;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/events/{id}/visibility")
            .route(web::get().to(visibility::get_event_visibility))
            .route(web::put().to(visibility::set_event_visibility))
            .route(web::post().to(visibility::add_visible_users))
            .route(web::delete().to(visibility::remove_visible_users)),
    );
}
