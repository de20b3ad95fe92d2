use serde::{Deserialize, Serialize};

use crate::types::account::Role;

/// Claims embedded in every access token issued by the server.
///
/// The token is self-contained: verifying the HMAC signature and expiry is
/// enough to authenticate a request with zero storage reads. The
/// `refresh_token` field binds the access token to the session it was
/// minted from, and the fingerprint fields record the client the session
/// belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Numeric account ID (matches `account.id`).
    pub account_id: i64,

    /// Role snapshot taken from the session. A promoted or demoted
    /// account must log in again for this to change.
    pub role: Role,

    /// Refresh token of the session this access token was minted from.
    pub refresh_token: String,

    /// Request host captured at login time.
    pub request_host: String,

    /// Full user-agent string captured at login time.
    pub user_agent: String,

    /// Client IP captured at login time.
    pub client_ip: String,

    /// Standard expiry (Unix timestamp, seconds).
    pub exp: usize,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: usize,
}
