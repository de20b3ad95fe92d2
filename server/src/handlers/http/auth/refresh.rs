use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use tracing::{error, warn};
use uuid::Uuid;

use shared::types::RefreshData;

use crate::handlers::http::auth::bind_json;
use crate::handlers::http::utils::{capture_seed, deliver_error_json, deliver_serialized_json};
use crate::AppState;

/// `POST /auth/refresh` — exchange a live refresh token for a fresh pair.
///
/// The current fingerprint is captured and must match the one the session
/// was created with; a stolen token replayed from elsewhere gets the same
/// `400` as an unknown one. `500` only for server-side failures.
pub async fn handle_refresh(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let fingerprint = capture_seed(&req, String::new());

    let refresh: RefreshData = match bind_json(req).await {
        Ok(refresh) => refresh,
        Err(reason) => {
            warn!("Refresh binding failed: {}", reason);
            return deliver_error_json("INVALID_BODY", &reason, StatusCode::BAD_REQUEST);
        }
    };

    // Refresh tokens are server-generated UUIDs; anything else can be
    // rejected before touching storage.
    if Uuid::parse_str(&refresh.refresh_token).is_err() {
        warn!("Refresh rejected: token is not a UUID");
        return deliver_error_json(
            "INVALID_REFRESH_TOKEN",
            "invalid refresh token",
            StatusCode::BAD_REQUEST,
        );
    }

    let seed = shared::types::SessionSeed {
        refresh_token: refresh.refresh_token,
        ..fingerprint
    };

    match state.accounts.refresh_token_pair(seed).await {
        Ok(pair) => deliver_serialized_json(&pair, StatusCode::OK),
        Err(err) if err.is_client_error() => {
            warn!("Refresh rejected: {}", err);
            deliver_error_json(err.code(), &err.to_string(), StatusCode::BAD_REQUEST)
        }
        Err(err) => {
            error!("Refresh failed: {}", err);
            deliver_error_json(
                err.code(),
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
        }
    }
}
