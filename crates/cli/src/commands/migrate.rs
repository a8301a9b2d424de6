//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pizza-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PIZZA_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/app/migrations/`:
//! ```text
//! migrations/
//! ├── 20260601000001_create_documents.sql
//! └── 20260601000002_create_accounts.sql
//! ```

use tracing::info;

use pizza_cafe_app::config::AppConfig;
use pizza_cafe_app::db;

use super::CliError;

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if no database URL is configured, the connection fails,
/// or a migration fails.
pub async fn run(config: &AppConfig) -> Result<(), CliError> {
    let database_url = config.require_database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(database_url, config.db_max_connections).await?;

    db::run_migrations(&pool).await?;
    Ok(())
}
