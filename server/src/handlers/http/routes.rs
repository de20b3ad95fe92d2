use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use tracing::{error, warn};

use shared::types::Role;

use crate::handlers::http::auth;
use crate::handlers::http::utils::{deliver_error_json, deliver_serialized_json, get_bearer_token};
use crate::AppState;

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two security tiers:
//
//   OpenHandler — no auth.  Receives (req, state).
//                 Use for: signup, login, refresh, health.
//
//   AuthHandler — requires `Authorization: Bearer <access token>`.
//                 The router verifies signature + expiry and hands the
//                 handler the (account_id, role) extracted from the claims.
//                 Use for: logout and anything else behind a login.

type OpenHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

type AuthHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
            i64,  // account_id — extracted and verified by the router
            Role, // role snapshot carried in the claims
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

enum RouteKind {
    /// No authentication check.
    Open(OpenHandler),

    /// Bearer-token auth: signature + expiry, zero storage reads.
    Auth(AuthHandler),
}

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    // ── Open (no auth) ────────────────────────────────────────────────────────

    /// GET with no authentication — use for health checks.
    pub fn get<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    /// POST with no authentication — use only for signup / login / refresh.
    pub fn post<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    // ── Bearer auth ───────────────────────────────────────────────────────────
    //
    // The router extracts and verifies the access token before the handler
    // is called. Handlers receive the verified (account_id, role) and must
    // NOT re-parse the token themselves — the work is already done.

    /// GET guarded by bearer-token auth.
    pub fn get_auth<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, i64, Role) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            kind: RouteKind::Auth(Box::new(move |req, state, account_id, role| {
                Box::pin(handler(req, state, account_id, role))
            })),
        });
        self
    }

    /// POST guarded by bearer-token auth.
    pub fn post_auth<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState, i64, Role) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::POST,
            path: path.to_string(),
            kind: RouteKind::Auth(Box::new(move |req, state, account_id, role| {
                Box::pin(handler(req, state, account_id, role))
            })),
        });
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        for route in &self.routes {
            if route.method != method || !Self::path_matches(&route.path, &path) {
                continue;
            }

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Auth(h) => {
                    let token = match get_bearer_token(&req) {
                        Ok(token) => token,
                        Err(reason) => {
                            warn!("Auth rejected {} {}: {}", method, path, reason.message());
                            return unauthorized(reason.message());
                        }
                    };

                    match state.accounts.parse_token(&token) {
                        Ok((account_id, role)) => h(req, state, account_id, role).await,
                        Err(reason) => {
                            warn!("Auth rejected {} {}: {}", method, path, reason);
                            unauthorized("invalid or expired access token")
                        }
                    }
                }
            };
        }

        deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        route_path == clean
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

/// The full HTTP surface of the auth subsystem.
pub fn build_router() -> Router {
    Router::new()
        .post("/auth/", auth::handle_signup)
        .post("/auth/login", auth::handle_login)
        .post("/auth/refresh", auth::handle_refresh)
        .get_auth("/auth/logout", auth::handle_logout)
        .get("/health", handle_health)
}

async fn handle_health(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    if let Err(err) = sqlx::query("SELECT 1").execute(&state.db).await {
        error!("Health check failed: {}", err);
        return deliver_error_json(
            "UNHEALTHY",
            "database unreachable",
            StatusCode::SERVICE_UNAVAILABLE,
        );
    }

    deliver_serialized_json(&json!({"status": "ok"}), StatusCode::OK)
}

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn unauthorized(message: &str) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_error_json("UNAUTHORIZED", message, StatusCode::UNAUTHORIZED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_paths_match() {
        assert!(Router::path_matches("/auth/login", "/auth/login"));
        assert!(Router::path_matches("/auth/", "/auth/"));
        assert!(!Router::path_matches("/auth/", "/auth"));
        assert!(!Router::path_matches("/auth/login", "/auth/logout"));
    }

    #[test]
    fn query_strings_are_ignored() {
        assert!(Router::path_matches("/auth/logout", "/auth/logout?source=web"));
        assert!(Router::path_matches("/health", "/health?verbose=1"));
    }
}
