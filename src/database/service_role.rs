use sqlx::PgPool;

/// Elevated data access for rows written on behalf of users other than the caller.
///
/// The constructor is crate-private: `AppState::new` builds the only instance and hands it
/// to the notification fan-out and the reminder scheduler. Request handlers never see it.
#[derive(Clone)]
pub struct ServiceRole {
    pool: PgPool,
}

impl ServiceRole {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
