use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde_json::json;
use tracing::{error, info, warn};

use shared::types::{AuthError, NewAccount};

use crate::handlers::http::auth::bind_json;
use crate::handlers::http::utils::{deliver_error_json, deliver_serialized_json};
use crate::AppState;

/// `POST /auth/` — create an account.
///
/// `201 {"userID": id}` on success; `400` for bind/validation failures and
/// duplicate phone numbers; `500` for anything the caller can't fix.
pub async fn handle_signup(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let account: NewAccount = match bind_json(req).await {
        Ok(account) => account,
        Err(reason) => {
            warn!("Signup binding failed: {}", reason);
            return deliver_error_json("INVALID_BODY", &reason, StatusCode::BAD_REQUEST);
        }
    };

    if let Err(reason) = account.validate() {
        warn!("Signup validation failed: {}", reason);
        return deliver_error_json("VALIDATION", &reason, StatusCode::BAD_REQUEST);
    }

    info!("Processing signup: phone={}, age={}", account.phone, account.age);

    match state.accounts.create_user(account).await {
        Ok(user_id) => deliver_serialized_json(&json!({ "userID": user_id }), StatusCode::CREATED),
        Err(err @ AuthError::DuplicatePhone) => {
            warn!("Signup rejected: {}", err);
            deliver_error_json(err.code(), &err.to_string(), StatusCode::BAD_REQUEST)
        }
        Err(err) => {
            error!("Signup failed: {}", err);
            deliver_error_json(err.code(), "An internal error occurred", StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
