pub mod auth;
pub mod routes;
pub mod utils;

pub use routes::{build_router, Router};
