pub mod auth;
pub mod logging;

pub use auth::api_key_auth;
pub use logging::request_logger;
