// handlers/public/mod.rs - pages reachable without a session
//
// GET  /login          - login page, behind the public-only guard
// GET  /auth/callback  - turns an upstream access token into a session cookie
// POST /logout         - drops the session cookie

pub mod callback;
pub mod login;
pub mod logout;

pub use callback::auth_callback;
pub use login::login_page;
pub use logout::logout;
