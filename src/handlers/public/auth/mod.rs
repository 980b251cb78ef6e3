// handlers/public/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints; no identity required.

pub mod login; // POST /auth/login - authenticate and get JWT
pub mod logout; // POST /auth/logout - clear the session cookie
pub mod register; // POST /auth/register - create new account

pub use login::login_post;
pub use logout::logout_post;
pub use register::register_post;
