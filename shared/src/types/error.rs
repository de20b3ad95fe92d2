use thiserror::Error;

/// Failure taxonomy of the session-lifecycle service.
///
/// Storage and codec errors are wrapped with operation context and
/// re-classified into these variants at the service boundary; nothing
/// rawer reaches the transport layer. `NoRowsAffected` is the one soft
/// member — logout of an account with no live sessions reports it, and
/// the transport maps it to an "already logged out" status rather than a
/// hard failure.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("phone already exists in the database")]
    DuplicatePhone,

    #[error("user is not found with such credentials")]
    UserNotFound,

    #[error("wrong password")]
    WrongPassword,

    #[error("session is not found with such credentials")]
    SessionNotFound,

    #[error("refresh token has expired")]
    RefreshTokenExpired,

    #[error("account has no active sessions")]
    NoRowsAffected,

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Stable machine-readable code used in JSON error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicatePhone => "DUPLICATE_PHONE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            Self::NoRowsAffected => "NO_ROWS_AFFECTED",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure is attributable to the caller (4xx family) as
    /// opposed to the server (`Internal`).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}
