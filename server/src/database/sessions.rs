use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use shared::types::{Role, Session, SessionSeed};

fn session_from_row(row: &SqliteRow) -> Result<Session, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role: Role = role
        .parse()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Session {
        refresh_token: row.try_get("refresh_token")?,
        account_id: row.try_get("account_id")?,
        role,
        request_host: row.try_get("request_host")?,
        user_agent: row.try_get("user_agent")?,
        client_ip: row.try_get("client_ip")?,
        expired: row.try_get("expired")?,
        created: row.try_get("created")?,
    })
}

/// Insert a fully-populated session row.
pub async fn insert_session(pool: &SqlitePool, session: &Session) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO session
            (refresh_token, account_id, role, request_host, user_agent, client_ip, expired, created)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&session.refresh_token)
    .bind(session.account_id)
    .bind(session.role.as_str())
    .bind(&session.request_host)
    .bind(&session.user_agent)
    .bind(&session.client_ip)
    .bind(session.expired)
    .bind(session.created)
    .execute(pool)
    .await?;

    Ok(())
}

/// Look a session up by its composite key: refresh token plus the full
/// client fingerprint. A stolen refresh token presented from a different
/// host, agent or IP matches nothing.
pub async fn select_session(
    pool: &SqlitePool,
    seed: &SessionSeed,
) -> Result<Option<Session>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT refresh_token, account_id, role, request_host, user_agent, client_ip,
                expired, created
         FROM session
         WHERE refresh_token = ?1 AND request_host = ?2 AND user_agent = ?3 AND client_ip = ?4",
    )
    .bind(&seed.refresh_token)
    .bind(&seed.request_host)
    .bind(&seed.user_agent)
    .bind(&seed.client_ip)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(session_from_row).transpose()
}

/// Push a session's expiry forward, but only while it is still live.
///
/// The `expired > ?3` guard makes the read-then-extend path safe against
/// a concurrent refresh or lapse between the caller's read and this
/// write: the returned row count is 0 when the guard lost, and the caller
/// decides what that means.
pub async fn extend_session(
    pool: &SqlitePool,
    refresh_token: &str,
    new_expired: i64,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE session SET expired = ?1 WHERE refresh_token = ?2 AND expired > ?3",
    )
    .bind(new_expired)
    .bind(refresh_token)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete every session the account owns (logout everywhere). Returns the
/// number of sessions removed.
pub async fn delete_account_sessions(
    pool: &SqlitePool,
    account_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM session WHERE account_id = ?1")
        .bind(account_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Sweep sessions whose expiry has lapsed. Expiry is otherwise detected
/// lazily on the next refresh attempt; this keeps the table from
/// accumulating dead rows across restarts.
pub async fn delete_expired_sessions(pool: &SqlitePool, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM session WHERE expired < ?1")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
