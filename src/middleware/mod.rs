pub mod auth;
pub mod response;

pub use auth::{expired_session_cookie, identity_middleware, session_cookie};
pub use response::{ApiResponse, ApiResult};
