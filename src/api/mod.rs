mod auth;
pub mod public;
pub mod routes;
mod server;
mod state;

pub use auth::{CurrentUser, SESSION_COOKIE};
pub use server::{app, init_tracing, serve};
pub use state::AppState;
