/// Schema migrations
///
/// SQL files under `taskboard-shared/migrations/` are embedded at compile
/// time with `sqlx::migrate!` and applied in timestamp order. Applied
/// versions are tracked in `_sqlx_migrations`.

use sqlx::{migrate::Migrator, postgres::PgPool};
use tracing::{info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies all pending migrations
///
/// # Errors
///
/// Returns an error if a migration fails or a previously applied migration
/// was modified.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(available = MIGRATOR.iter().count(), "Running database migrations");

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("Database migrations complete");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}
