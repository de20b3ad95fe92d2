pub mod accounts;
pub mod create;
pub mod sessions;

pub use accounts::*;
pub use create::*;
pub use sessions::*;
