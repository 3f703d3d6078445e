use actix_web::web;

use crate::handlers::cron;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/cron").route("/reminders", web::post().to(cron::run_reminders)));
}
