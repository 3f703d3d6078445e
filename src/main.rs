use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use anyhow::Result;

use bandsync::{
    AppState, Config,
    database::{connect, init_database},
    middleware::RequestIdMiddleware,
    services::reminders::run_reminder_loop,
};

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now()
    }))
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "Starting bandsync API (environment: {})",
        config.environment
    );

    let pool = init_database(&config.database_url).await?;
    let service_pool = connect(&config.service_database_url).await?;
    log::info!("Database initialized");

    let app_state = web::Data::new(AppState::new(pool, service_pool, &config));

    if config.run_reminder_loop {
        log::info!(
            "Reminder loop enabled (every {}h, {}h window)",
            config.reminder_interval_hours,
            config.reminder_window_hours
        );
        tokio::spawn(run_reminder_loop(
            app_state.reminders.clone(),
            config.reminder_interval_hours,
        ));
    }
    if config.cron_secret.is_none() {
        log::warn!("CRON_SECRET is not set; the reminder endpoint will reject every call");
    }

    let server_address = config.server_address();
    let config_data = web::Data::new(config.clone());
    log::info!("Listening on http://{}", server_address);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&config.client_base_url)
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                    .allowed_headers(vec![
                        "Authorization",
                        "Content-Type",
                        "Accept",
                        "X-Requested-With",
                        "X-Correlation-ID",
                    ])
                    .max_age(3600),
            )
            .wrap(RequestIdMiddleware)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T correlation_id=%{x-correlation-id}o"#,
            ))
            .service(health)
            .configure(bandsync::configure)
    })
    .bind(&server_address)?
    .run()
    .await
    .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
