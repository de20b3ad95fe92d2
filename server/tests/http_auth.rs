//! End-to-end tests over a real socket: the full stack from TCP accept
//! loop to SQLite, driven with a raw hyper HTTP/1 client.

use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::net::{TcpListener, TcpStream};

use server::AppState;
use shared::types::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};

const JWT_SECRET: &str = "0123456789abcdef0123456789abcdef";

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            path: ":memory:".to_string(),
            max_connections: 1,
        },
        auth: AuthConfig {
            access_token_ttl_minutes: 15,
            refresh_token_ttl_hours: 24,
            jwt_secret: Some(JWT_SECRET.to_string()),
            password_salt: Some("pepper".to_string()),
        },
    }
}

/// Boot the whole stack on an ephemeral port and return its address.
async fn spawn_server() -> SocketAddr {
    let config = test_config();

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(":memory:")
                .foreign_keys(true),
        )
        .await
        .unwrap();
    server::database::create_tables(&pool).await.unwrap();

    let state = AppState::new(config, pool).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server::run(listener, state).await;
    });

    addr
}

async fn send(addr: SocketAddr, req: Request<Full<Bytes>>) -> (StatusCode, Value) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await.unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let response = sender.send_request(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

/// Request builder with the fingerprint headers every test client sends.
fn request(method: &str, path: &str, body: Value) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("host", "api.test.local")
        .header("user-agent", "e2e-client")
        .header("x-forwarded-for", "198.51.100.7")
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn signup_body(phone: &str) -> Value {
    json!({"phone": phone, "password": "pw123456", "age": 30, "role": "user"})
}

// ---------------------------------------------------------------------------
// Health and routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_answers_ok() {
    let addr = spawn_server().await;
    let (status, body) = send(addr, request("GET", "/health", Value::Null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let addr = spawn_server().await;
    let (status, body) = send(addr, request("GET", "/nope", Value::Null)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_creates_an_account() {
    let addr = spawn_server().await;

    let (status, body) = send(addr, request("POST", "/auth/", signup_body("+15551234567"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["userID"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn duplicate_signup_is_rejected() {
    let addr = spawn_server().await;

    send(addr, request("POST", "/auth/", signup_body("+15551234567"))).await;
    let (status, body) = send(addr, request("POST", "/auth/", signup_body("+15551234567"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_PHONE");
}

#[tokio::test]
async fn signup_validation_failures_are_400() {
    let addr = spawn_server().await;

    // Phone without the leading +.
    let (status, body) = send(
        addr,
        request(
            "POST",
            "/auth/",
            json!({"phone": "15551234567", "password": "pw123456", "age": 30, "role": "user"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    // Role outside the enumeration fails at the binding step.
    let (status, body) = send(
        addr,
        request(
            "POST",
            "/auth/",
            json!({"phone": "+15551234567", "password": "pw123456", "age": 30, "role": "owner"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");

    // Not JSON at all.
    let req = Request::builder()
        .method("POST")
        .uri("/auth/")
        .header("host", "api.test.local")
        .body(Full::new(Bytes::from_static(b"phone=123")))
        .unwrap();
    let (status, body) = send(addr, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_with_unknown_phone_is_404() {
    let addr = spawn_server().await;

    let (status, body) = send(
        addr,
        request(
            "POST",
            "/auth/login",
            json!({"phone": "+15550000000", "password": "pw123456"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn login_with_wrong_password_is_400() {
    let addr = spawn_server().await;

    send(addr, request("POST", "/auth/", signup_body("+15551234567"))).await;
    let (status, body) = send(
        addr,
        request(
            "POST",
            "/auth/login",
            json!({"phone": "+15551234567", "password": "not-the-password"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WRONG_PASSWORD");
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_requires_a_uuid_token() {
    let addr = spawn_server().await;

    let (status, body) = send(
        addr,
        request("POST", "/auth/refresh", json!({"refreshToken": "not-a-uuid"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn refresh_with_foreign_fingerprint_is_400() {
    let addr = spawn_server().await;

    send(addr, request("POST", "/auth/", signup_body("+15551234567"))).await;
    let (_, login_body) = send(
        addr,
        request(
            "POST",
            "/auth/login",
            json!({"phone": "+15551234567", "password": "pw123456"}),
        ),
    )
    .await;
    let refresh_token = login_body["RefreshToken"].as_str().unwrap().to_string();

    // Same token, different client IP.
    let mut req = request(
        "POST",
        "/auth/refresh",
        json!({"refreshToken": refresh_token}),
    );
    req.headers_mut()
        .insert("x-forwarded-for", "203.0.113.99".parse().unwrap());

    let (status, body) = send(addr, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Logout auth gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_without_a_token_is_401() {
    let addr = spawn_server().await;

    let (status, body) = send(addr, request("GET", "/auth/logout", Value::Null)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn logout_with_a_malformed_header_is_401() {
    let addr = spawn_server().await;

    for value in ["Token abc", "Bearer", "Bearer a b"] {
        let mut req = request("GET", "/auth/logout", Value::Null);
        req.headers_mut()
            .insert("authorization", value.parse().unwrap());
        let (status, _) = send(addr, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header: {value:?}");
    }
}

#[tokio::test]
async fn logout_with_a_garbage_token_is_401() {
    let addr = spawn_server().await;

    let mut req = request("GET", "/auth/logout", Value::Null);
    req.headers_mut()
        .insert("authorization", "Bearer not.a.token".parse().unwrap());

    let (status, _) = send(addr, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Full scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signup_login_refresh_logout_over_http() {
    let addr = spawn_server().await;

    // Signup.
    let (status, body) = send(addr, request("POST", "/auth/", signup_body("+15551234567"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["userID"].as_i64().unwrap();
    assert!(user_id > 0);

    // Login.
    let (status, body) = send(
        addr,
        request(
            "POST",
            "/auth/login",
            json!({"phone": "+15551234567", "password": "pw123456"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access_token = body["AccessToken"].as_str().unwrap().to_string();
    let refresh_token = body["RefreshToken"].as_str().unwrap().to_string();
    assert!(!access_token.is_empty());
    assert!(!refresh_token.is_empty());

    // Refresh with the same fingerprint: same refresh token, new access token.
    let (status, body) = send(
        addr,
        request(
            "POST",
            "/auth/refresh",
            json!({"refreshToken": refresh_token}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["RefreshToken"].as_str().unwrap(), refresh_token);
    let refreshed_access = body["AccessToken"].as_str().unwrap().to_string();
    assert!(!refreshed_access.is_empty());

    // Logout with the refreshed access token.
    let mut req = request("GET", "/auth/logout", Value::Null);
    req.headers_mut().insert(
        "authorization",
        format!("Bearer {}", refreshed_access).parse().unwrap(),
    );
    let (status, body) = send(addr, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "successful");

    // Second logout: nothing left to remove.
    let mut req = request("GET", "/auth/logout", Value::Null);
    req.headers_mut().insert(
        "authorization",
        format!("Bearer {}", access_token).parse().unwrap(),
    );
    let (status, body) = send(addr, req).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["code"], "NO_ROWS_AFFECTED");

    // The refresh token died with the session.
    let (status, body) = send(
        addr,
        request(
            "POST",
            "/auth/refresh",
            json!({"refreshToken": refresh_token}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "SESSION_NOT_FOUND");
}
