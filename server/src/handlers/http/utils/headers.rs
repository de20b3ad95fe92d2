use hyper::header::HeaderMap;
use hyper::Request;
use tracing::debug;

use shared::types::SessionSeed;

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract the client IP address from the request
pub fn get_client_ip<B>(req: &Request<B>) -> Option<String> {
    // Check X-Forwarded-For header first (for proxied requests)
    if let Some(forwarded) = get_header_value(req.headers(), "x-forwarded-for") {
        return forwarded.split(',').next().map(|s| s.trim().to_string());
    }

    // Check X-Real-IP header
    if let Some(real_ip) = get_header_value(req.headers(), "x-real-ip") {
        return Some(real_ip);
    }

    None
}

/// Extract the user agent string
pub fn get_user_agent<B>(req: &Request<B>) -> Option<String> {
    get_header_value(req.headers(), "user-agent")
}

/// Extract the request host (the `Host` header for HTTP/1.1, the URI
/// authority for HTTP/2-style requests).
pub fn get_request_host<B>(req: &Request<B>) -> Option<String> {
    get_header_value(req.headers(), "host")
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
}

/// Capture the client fingerprint from a request into a session seed.
/// Missing pieces fall back to `"unknown"` so the same request always
/// produces the same fingerprint.
pub fn capture_seed<B>(req: &Request<B>, refresh_token: String) -> SessionSeed {
    SessionSeed {
        refresh_token,
        request_host: get_request_host(req).unwrap_or_else(|| "unknown".to_string()),
        user_agent: get_user_agent(req).unwrap_or_else(|| "unknown".to_string()),
        client_ip: get_client_ip(req).unwrap_or_else(|| "unknown".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Bearer extraction
// ---------------------------------------------------------------------------

/// Why a request failed bearer-token extraction. All of these map to 401;
/// the distinction only feeds the response message and the log line.
#[derive(Debug, PartialEq, Eq)]
pub enum BearerError {
    MissingHeader,
    MalformedHeader,
    EmptyToken,
}

impl BearerError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "empty header",
            Self::MalformedHeader => "invalid header",
            Self::EmptyToken => "empty token",
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn get_bearer_token<B>(req: &Request<B>) -> Result<String, BearerError> {
    let header =
        get_header_value(req.headers(), "authorization").ok_or(BearerError::MissingHeader)?;

    let mut parts = header.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(BearerError::MalformedHeader),
    };

    if scheme != "Bearer" {
        return Err(BearerError::MalformedHeader);
    }

    if token.is_empty() {
        return Err(BearerError::EmptyToken);
    }

    debug!("Bearer token extracted");

    Ok(token.to_string())
}
