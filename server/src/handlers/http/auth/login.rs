use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info, warn};

use shared::types::{AuthError, LoginData};

use crate::handlers::http::auth::bind_json;
use crate::handlers::http::utils::{capture_seed, deliver_error_json, deliver_serialized_json};
use crate::AppState;

/// `POST /auth/login` — exchange credentials for a token pair.
///
/// The client fingerprint (host, user-agent, IP) is captured here and
/// stored with the session; a later refresh must present the same one.
/// `200 {"AccessToken","RefreshToken"}` on success; `404` for an unknown
/// phone; `400` for a bad body or wrong password; `500` otherwise.
pub async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let seed = capture_seed(&req, String::new());

    let login: LoginData = match bind_json(req).await {
        Ok(login) => login,
        Err(reason) => {
            warn!("Login binding failed: {}", reason);
            return deliver_error_json("INVALID_BODY", &reason, StatusCode::BAD_REQUEST);
        }
    };

    info!("Processing login: phone={}", login.phone);

    match state
        .accounts
        .login(&login.phone, &login.password, seed)
        .await
    {
        Ok(pair) => deliver_serialized_json(&pair, StatusCode::OK),
        Err(err @ AuthError::UserNotFound) => {
            warn!("Login rejected: {}", err);
            deliver_error_json(err.code(), &err.to_string(), StatusCode::NOT_FOUND)
        }
        Err(err @ AuthError::WrongPassword) => {
            warn!("Login rejected: {}", err);
            deliver_error_json(err.code(), &err.to_string(), StatusCode::BAD_REQUEST)
        }
        Err(err) => {
            error!("Login failed: {}", err);
            deliver_error_json(
                err.code(),
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
