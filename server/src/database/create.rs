use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{info, warn};

use shared::types::DatabaseConfig;

/// Current schema version. Bump this whenever the schema changes and add a
/// corresponding migration arm in `run_migrations`.
const SCHEMA_VERSION: i64 = 1;

/// Open (and create if missing) the SQLite database described by the
/// config, with foreign keys enforced.
pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_schema(pool).await?;
    run_migrations(pool).await?;
    Ok(())
}

/// Create all tables for a brand-new database (version 1 schema).
async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Account table — phone is the login identifier and globally unique.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS account (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            phone    TEXT    NOT NULL UNIQUE,
            password TEXT    NOT NULL,
            age      INTEGER NOT NULL,
            role     TEXT    NOT NULL DEFAULT 'user',
            created  INTEGER NOT NULL,
            modified INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Session table — the refresh token is the primary handle. Deleting a
    // row is the only form of revocation.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS session (
            refresh_token TEXT    PRIMARY KEY,
            account_id    INTEGER NOT NULL,
            role          TEXT    NOT NULL,
            request_host  TEXT    NOT NULL,
            user_agent    TEXT    NOT NULL,
            client_ip     TEXT    NOT NULL,
            expired       INTEGER NOT NULL,
            created       INTEGER NOT NULL,
            FOREIGN KEY (account_id) REFERENCES account(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    // --- Indexes --------------------------------------------------------
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_session_account_id ON session(account_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_session_expired    ON session(expired)")
        .execute(pool)
        .await?;

    // --- Version bookkeeping --------------------------------------------
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let existing = sqlx::query("SELECT version FROM schema_version LIMIT 1")
        .fetch_optional(pool)
        .await?;

    if existing.is_none() {
        sqlx::query("INSERT INTO schema_version (version) VALUES (?1)")
            .bind(SCHEMA_VERSION)
            .execute(pool)
            .await?;
        info!("Initialized schema at version {}", SCHEMA_VERSION);
    }

    Ok(())
}

/// Apply migrations from the stored version up to `SCHEMA_VERSION`.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let row = sqlx::query("SELECT version FROM schema_version LIMIT 1")
        .fetch_one(pool)
        .await?;
    let version: i64 = row.try_get("version")?;

    if version > SCHEMA_VERSION {
        warn!(
            "Database schema version {} is newer than this binary supports ({})",
            version, SCHEMA_VERSION
        );
        return Ok(());
    }

    // Version 1 is the initial schema; future arms go here.

    if version < SCHEMA_VERSION {
        sqlx::query("UPDATE schema_version SET version = ?1")
            .bind(SCHEMA_VERSION)
            .execute(pool)
            .await?;
        info!("Migrated schema from version {} to {}", version, SCHEMA_VERSION);
    }

    Ok(())
}
