use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::account::Role;

// ---------------------------------------------------------------------------
// Session rows
// ---------------------------------------------------------------------------

/// One refresh-token-backed login instance. The refresh token is the
/// primary handle: unique across all sessions, generated server-side at
/// login and never regenerated afterwards — a successful refresh only
/// pushes `expired` forward.
#[derive(Debug, Clone)]
pub struct Session {
    pub refresh_token: String,
    pub account_id: i64,
    /// Role copied from the account at login, not re-derived afterwards.
    pub role: Role,
    pub request_host: String,
    pub user_agent: String,
    pub client_ip: String,
    /// Unix seconds. Always in the future at creation and after a
    /// successful refresh.
    pub expired: i64,
    pub created: i64,
}

/// The caller-supplied part of a session: the client fingerprint captured
/// from the request, plus — on refresh — the presented refresh token.
/// Login leaves `refresh_token` empty; the server generates one.
#[derive(Debug, Clone)]
pub struct SessionSeed {
    pub refresh_token: String,
    pub request_host: String,
    pub user_agent: String,
    pub client_ip: String,
}

impl fmt::Display for SessionSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={}, agent={}, ip={}",
            self.request_host, self.user_agent, self.client_ip
        )
    }
}

// ---------------------------------------------------------------------------
// Token pair
// ---------------------------------------------------------------------------

/// Transient result of login / refresh, returned to the caller and never
/// persisted. Serialized key names are part of the HTTP contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "RefreshToken")]
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshData {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_serializes_contract_keys() {
        let pair = TokenPair {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["AccessToken"], "a");
        assert_eq!(json["RefreshToken"], "r");
    }

    #[test]
    fn refresh_data_binds_camel_case_key() {
        let d: RefreshData =
            serde_json::from_str(r#"{"refreshToken":"550e8400-e29b-41d4-a716-446655440000"}"#)
                .unwrap();
        assert_eq!(d.refresh_token, "550e8400-e29b-41d4-a716-446655440000");
    }
}
