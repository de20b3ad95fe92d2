pub mod auth;
pub mod database;
pub mod handlers;

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::{TokioIo, TokioTimer};
use sqlx::sqlite::SqlitePool;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use shared::types::AppConfig;

use crate::auth::AccountService;
use crate::handlers::http::utils::deliver_error_json;
use crate::handlers::http::{build_router, Router};

/// Everything a request handler can reach. Cloned per connection; all
/// fields are cheap handles, read-only after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub accounts: AccountService,
}

impl AppState {
    /// Wire the service layer up from a validated config and an open pool.
    ///
    /// Both secrets were checked resolvable by `validate_config`, so a
    /// `None` here is a programming error, not a user one.
    pub fn new(config: AppConfig, db: SqlitePool) -> Result<Self> {
        let jwt_secret = config
            .auth
            .resolved_jwt_secret()
            .context("jwt_secret missing after config validation")?;
        let password_salt = config
            .auth
            .resolved_password_salt()
            .context("password_salt missing after config validation")?;

        let accounts = AccountService::new(
            db.clone(),
            &jwt_secret,
            &password_salt,
            config.auth.access_ttl(),
            config.auth.refresh_ttl(),
        );

        Ok(Self {
            config: Arc::new(config),
            db,
            accounts,
        })
    }
}

/// Accept loop: serve HTTP/1 connections off the listener until the task
/// is dropped. Extracted from `main` so integration tests can run the
/// full stack on an ephemeral port.
pub async fn run(listener: TcpListener, state: AppState) -> Result<()> {
    let router = Arc::new(build_router());

    loop {
        let (stream, _) = listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        let io = TokioIo::new(stream);

        let state = state.clone();
        let router = Arc::clone(&router);

        tokio::task::spawn(async move {
            // Handle the connection using HTTP1 and pass any requests
            // received on it to the router.
            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(
                    io,
                    service_fn(move |req| handle(req, state.clone(), Arc::clone(&router))),
                )
                .await
            {
                warn!("Error serving connection: {:?}", err);
            }
        });
    }
}

type ResponseBody = http_body_util::combinators::BoxBody<bytes::Bytes, Infallible>;

async fn handle(
    req: hyper::Request<hyper::body::Incoming>,
    state: AppState,
    router: Arc<Router>,
) -> Result<hyper::Response<ResponseBody>, Infallible> {
    match router.route(req, state).await {
        Ok(response) => Ok(response),
        Err(err) => {
            // A handler failed to even build a response. Last-resort 500.
            error!("Handler error: {:?}", err);
            Ok(deliver_error_json(
                "INTERNAL_ERROR",
                "An internal error occurred",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .unwrap_or_else(|_| plain_500()))
        }
    }
}

fn plain_500() -> hyper::Response<ResponseBody> {
    let mut response = hyper::Response::new(crate::handlers::http::utils::full("internal error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Open the database, apply the schema and sweep lapsed sessions.
pub async fn init_database(config: &AppConfig) -> Result<SqlitePool> {
    let pool = database::connect(&config.database)
        .await
        .context("Failed to open database")?;

    database::create_tables(&pool)
        .await
        .context("Failed to initialize database schema")?;

    let swept = database::delete_expired_sessions(&pool, auth::now_unix())
        .await
        .context("Failed to sweep expired sessions")?;
    if swept > 0 {
        info!("Swept {} expired sessions", swept);
    }

    Ok(pool)
}
