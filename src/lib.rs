pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use sqlx::PgPool;

pub use config::Config;
pub use error::AppError;
pub use routes::configure;

use database::{
    ServiceRole,
    repositories::{
        BandRepository, EventRepository, NotificationRepository, PollVoteRepository,
        PreferencesRepository, PushSubscriptionRepository, RsvpRepository, VisibilityRepository,
    },
};
use services::{
    AccessGuard, EventService, NotificationFanout, NotificationService, PollService, PushClient,
    ReminderScheduler, RsvpService, VisibilityService,
};

/// Services shared by every worker, registered as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub visibility: VisibilityService,
    pub polls: PollService,
    pub rsvps: RsvpService,
    pub notifications: NotificationService,
    pub reminders: ReminderScheduler,
}

impl AppState {
    /// `pool` serves caller-scoped reads and writes. `service_pool` backs the elevated role
    /// that only the fan-out and the reminder scheduler receive.
    pub fn new(pool: PgPool, service_pool: PgPool, config: &Config) -> Self {
        let role = ServiceRole::new(service_pool);
        let push = PushClient::new(
            config.push_gateway_url.clone(),
            config.client_base_url.clone(),
        );
        let fanout = NotificationFanout::new(role.clone(), push);

        let bands = BandRepository::new(pool.clone());
        let visibility = VisibilityRepository::new(pool.clone());
        let guard = AccessGuard::new(
            bands.clone(),
            EventRepository::new(pool.clone()),
            visibility.clone(),
        );
        let visibility_service = VisibilityService::new(guard.clone(), bands, visibility);

        Self {
            events: EventService::new(
                pool.clone(),
                guard.clone(),
                visibility_service.clone(),
                fanout.clone(),
            ),
            visibility: visibility_service,
            polls: PollService::new(guard.clone(), PollVoteRepository::new(pool.clone())),
            rsvps: RsvpService::new(guard, RsvpRepository::new(pool.clone())),
            notifications: NotificationService::new(
                NotificationRepository::new(pool.clone()),
                PreferencesRepository::new(pool.clone()),
                PushSubscriptionRepository::new(pool),
            ),
            reminders: ReminderScheduler::new(role, fanout, config.reminder_window_hours),
        }
    }
}
