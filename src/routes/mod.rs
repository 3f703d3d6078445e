use actix_web::web;

use crate::handlers;

pub mod cron;
pub mod events;
pub mod notifications;
pub mod polls;
pub mod rsvps;
pub mod visibility;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .app_data(handlers::query_config())
        .app_data(handlers::path_config())
        .service(
            web::scope("/api/v1")
                .configure(events::configure)
                .configure(visibility::configure)
                .configure(polls::configure)
                .configure(rsvps::configure)
                .configure(notifications::configure)
                .configure(cron::configure),
        );
}
