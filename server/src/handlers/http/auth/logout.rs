use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use tracing::{error, info, warn};

use shared::types::{AuthError, Role};

use crate::handlers::http::utils::{deliver_error_json, deliver_serialized_json};
use crate::AppState;

/// `GET /auth/logout` — invalidate every session the account owns.
///
/// The router has already verified the access token; this handler only
/// sees the extracted account id. Deliberately account-wide: logging out
/// on one device logs out all of them. An account with no live sessions
/// gets `202` — already logged out is not an error worth a failure page.
pub async fn handle_logout(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
    account_id: i64,
    _role: Role,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match state.accounts.logout(account_id).await {
        Ok(()) => {
            info!("User logged out: account_id={}", account_id);
            deliver_serialized_json(&json!({ "action": "successful" }), StatusCode::OK)
        }
        Err(err @ AuthError::NoRowsAffected) => {
            warn!("Logout no-op: account_id={}", account_id);
            deliver_error_json(err.code(), &err.to_string(), StatusCode::ACCEPTED)
        }
        Err(err) => {
            error!("Logout failed: {}", err);
            deliver_error_json(
                err.code(),
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
