//! API middleware components

pub mod api_key;
pub mod logging;
pub mod security;
pub mod session;

pub use api_key::ApiKeyHeader;
pub use logging::logging_middleware;
pub use security::{security_headers_middleware, MAX_BODY_SIZE};
pub use session::RequireAccount;
