use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use shared::types::{Account, NewAccount, Role};

fn account_from_row(row: &SqliteRow) -> Result<Account, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role: Role = role
        .parse()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Account {
        id: row.try_get("id")?,
        phone: row.try_get("phone")?,
        password: row.try_get("password")?,
        age: row.try_get("age")?,
        role,
        created: row.try_get("created")?,
        modified: row.try_get("modified")?,
    })
}

/// Insert a new account and return its id. `password_digest` is the
/// already-digested password — plaintext never reaches this layer.
/// A UNIQUE violation on `phone` surfaces as the underlying database
/// error; classification happens at the service boundary.
pub async fn insert_account(
    pool: &SqlitePool,
    account: &NewAccount,
    password_digest: &str,
    now: i64,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO account (phone, password, age, role, created, modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )
    .bind(&account.phone)
    .bind(password_digest)
    .bind(account.age)
    .bind(account.role.as_str())
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Look an account up by its unique phone number.
pub async fn select_account_by_phone(
    pool: &SqlitePool,
    phone: &str,
) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, phone, password, age, role, created, modified
         FROM account WHERE phone = ?1",
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(account_from_row).transpose()
}

/// Look an account up by id.
pub async fn select_account_by_id(
    pool: &SqlitePool,
    account_id: i64,
) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, phone, password, age, role, created, modified
         FROM account WHERE id = ?1",
    )
    .bind(account_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(account_from_row).transpose()
}
