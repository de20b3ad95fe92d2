use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use shared::types::{
    AccessClaims, AuthError, NewAccount, Role, Session, SessionSeed, TokenPair,
};

use crate::auth::{now_unix, PasswordDigest, TokenCodec};
use crate::database;

/// Orchestrates signup, login, token refresh and logout over the account
/// and session tables.
///
/// Holds no mutable state: the pool, codec, digest and TTLs are fixed at
/// construction, so concurrent requests share nothing but the storage
/// handle. Every failure crossing this boundary is an [`AuthError`].
#[derive(Debug, Clone)]
pub struct AccountService {
    db: SqlitePool,
    codec: TokenCodec,
    digest: PasswordDigest,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl AccountService {
    pub fn new(
        db: SqlitePool,
        jwt_secret: &str,
        password_salt: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            db,
            codec: TokenCodec::new(jwt_secret),
            digest: PasswordDigest::new(password_salt),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Digest the password and store the account. Returns the new id.
    pub async fn create_user(&self, account: NewAccount) -> Result<i64, AuthError> {
        let password_digest = self.digest.digest(&account.password);

        let id = match database::insert_account(&self.db, &account, &password_digest, now_unix())
            .await
        {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => return Err(AuthError::DuplicatePhone),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context("create_user: account insert failed")
                    .into());
            }
        };

        info!("Account created: id={}, phone={}", id, account.phone);

        Ok(id)
    }

    /// Verify credentials, open a session bound to the caller's
    /// fingerprint, and mint the first token pair for it.
    pub async fn login(
        &self,
        phone: &str,
        password: &str,
        seed: SessionSeed,
    ) -> Result<TokenPair, AuthError> {
        let account = database::select_account_by_phone(&self.db, phone)
            .await
            .context("login: account lookup failed")?
            .ok_or(AuthError::UserNotFound)?;

        if self.digest.digest(password) != account.password {
            warn!("Login rejected, wrong password: phone={}", phone);
            return Err(AuthError::WrongPassword);
        }

        let now = now_unix();
        let session = Session {
            refresh_token: Uuid::new_v4().to_string(),
            account_id: account.id,
            role: account.role,
            request_host: seed.request_host,
            user_agent: seed.user_agent,
            client_ip: seed.client_ip,
            expired: now + self.refresh_ttl.as_secs() as i64,
            created: now,
        };

        database::insert_session(&self.db, &session)
            .await
            .context("login: session insert failed")?;

        let access_token = self
            .mint_access_token(&session, now)
            .context("login: access token signing failed")?;

        info!("Login successful: account_id={}", session.account_id);

        Ok(TokenPair {
            access_token,
            refresh_token: session.refresh_token,
        })
    }

    /// Exchange a live refresh token (presented with the same fingerprint
    /// it was issued to) for a fresh token pair. The refresh token itself
    /// is unchanged; only its expiry moves forward.
    pub async fn refresh_token_pair(&self, seed: SessionSeed) -> Result<TokenPair, AuthError> {
        let mut session = database::select_session(&self.db, &seed)
            .await
            .context("refresh: session lookup failed")?
            .ok_or(AuthError::SessionNotFound)?;

        let now = now_unix();

        if session.expired < now {
            return Err(AuthError::RefreshTokenExpired);
        }

        let new_expired = now + self.refresh_ttl.as_secs() as i64;

        let rows = database::extend_session(&self.db, &session.refresh_token, new_expired, now)
            .await
            .context("refresh: session update failed")?;

        // The conditional update lost: the session lapsed or was deleted
        // between the read above and this write.
        if rows == 0 {
            return Err(AuthError::RefreshTokenExpired);
        }

        session.expired = new_expired;

        let access_token = self
            .mint_access_token(&session, now)
            .context("refresh: access token signing failed")?;

        Ok(TokenPair {
            access_token,
            refresh_token: session.refresh_token,
        })
    }

    /// Remove every session the account owns — all devices, not just the
    /// caller's. An account with nothing to remove reports the soft
    /// `NoRowsAffected`.
    pub async fn logout(&self, account_id: i64) -> Result<(), AuthError> {
        let rows = database::delete_account_sessions(&self.db, account_id)
            .await
            .context("logout: session delete failed")?;

        if rows == 0 {
            return Err(AuthError::NoRowsAffected);
        }

        info!("Logout: account_id={}, sessions_removed={}", account_id, rows);

        Ok(())
    }

    /// Verify an access token and extract the caller's identity. Every
    /// codec-level failure (bad signature, foreign algorithm, expiry,
    /// missing claims) folds into `Unauthenticated`.
    pub fn parse_token(&self, access_token: &str) -> Result<(i64, Role), AuthError> {
        let claims = self
            .codec
            .decode(access_token)
            .map_err(|e| AuthError::Unauthenticated(e.to_string()))?;

        Ok((claims.account_id, claims.role))
    }

    fn mint_access_token(
        &self,
        session: &Session,
        now: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = AccessClaims {
            account_id: session.account_id,
            role: session.role,
            refresh_token: session.refresh_token.clone(),
            request_host: session.request_host.clone(),
            user_agent: session.user_agent.clone(),
            client_ip: session.client_ip.clone(),
            exp: (now + self.access_ttl.as_secs() as i64) as usize,
            iat: now as usize,
        };

        self.codec.encode(&claims)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
