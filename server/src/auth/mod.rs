pub mod digest;
pub mod service;
pub mod token;

pub use digest::PasswordDigest;
pub use service::AccountService;
pub use token::TokenCodec;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix timestamp in seconds.
pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}
