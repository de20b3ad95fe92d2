pub mod login;
pub mod logout;
pub mod refresh;
pub mod signup;

// Re-export main handlers
pub use login::handle_login;
pub use logout::handle_logout;
pub use refresh::handle_refresh;
pub use signup::handle_signup;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::Request;
use serde::de::DeserializeOwned;

/// Collect and bind a JSON request body. The error string feeds a 400
/// response, mirroring the bind-or-reject step every auth route starts
/// with. Callers that need request headers (fingerprint capture) must
/// read them before handing the request over.
pub async fn bind_json<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T, String> {
    let bytes = req
        .collect()
        .await
        .map_err(|e| format!("failed to read request body: {}", e))?
        .to_bytes();

    serde_json::from_slice::<T>(&bytes).map_err(|e| e.to_string())
}
