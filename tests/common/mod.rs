#![allow(dead_code)]

use actix_web::web;
use bandsync::{
    AppState, Config,
    database::{init_database, models::BandRole},
    services::auth::Claims,
};
use chrono::Duration;
use fake::{Fake, faker::internet::en::SafeEmail, faker::name::en::Name};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

pub fn setup_test_env() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// App state over a pool that never connects. Enough for requests rejected before data
/// access (authentication, validation, cron secret).
pub fn lazy_state(config: &Config) -> web::Data<AppState> {
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("valid database url");
    web::Data::new(AppState::new(pool.clone(), pool, config))
}

/// Builds the routed test service for `state` and `config`.
#[macro_export]
macro_rules! test_app {
    ($state:expr, $config:expr) => {{
        let state = $state;
        let config = $config;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(config))
                .app_data(state)
                .configure(bandsync::configure),
        )
        .await
    }};
}

pub fn bearer(user_id: Uuid, config: &Config) -> String {
    let token = Claims::new(user_id, "member@example.com", Duration::hours(1))
        .encode(&config.jwt_secret)
        .expect("token encodes");
    format!("Bearer {}", token)
}

/// A migrated database plus state over it. `None` when `TEST_DATABASE_URL` is unset, in
/// which case database-backed tests return early.
pub struct TestContext {
    pub pool: PgPool,
    pub config: Config,
    pub state: AppState,
}

impl TestContext {
    pub async fn new() -> Option<Self> {
        setup_test_env();
        if std::env::var("TEST_DATABASE_URL").is_err() {
            eprintln!("TEST_DATABASE_URL not set; skipping database test");
            return None;
        }

        let config = Config::test_config();
        let pool = init_database(&config.database_url)
            .await
            .expect("test database is reachable");
        let state = AppState::new(pool.clone(), pool.clone(), &config);

        Some(Self {
            pool,
            config,
            state,
        })
    }

    pub async fn create_user(&self) -> Uuid {
        let email: String = SafeEmail().fake();
        let name: String = Name().fake();
        sqlx::query_scalar(
            "INSERT INTO users (email, display_name) VALUES ($1, $2) RETURNING id",
        )
        .bind(format!("{}.{}", Uuid::new_v4().simple(), email))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .expect("user inserted")
    }

    /// A band whose creator is its admin.
    pub async fn create_band(&self, admin_id: Uuid) -> Uuid {
        let band_id: Uuid =
            sqlx::query_scalar("INSERT INTO bands (name, created_by) VALUES ($1, $2) RETURNING id")
                .bind("The Test Band")
                .bind(admin_id)
                .fetch_one(&self.pool)
                .await
                .expect("band inserted");
        self.add_member(band_id, admin_id, BandRole::Admin).await;
        band_id
    }

    pub async fn add_member(&self, band_id: Uuid, user_id: Uuid, role: BandRole) {
        sqlx::query("INSERT INTO band_members (band_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(band_id)
            .bind(user_id)
            .bind(role.to_string())
            .execute(&self.pool)
            .await
            .expect("member inserted");
    }

    pub async fn notification_count(&self, user_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .expect("count notifications")
    }
}
