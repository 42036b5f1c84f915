//! Chat client: talks to the backend and reveals responses.
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod reveal;
pub mod surface;
pub mod timestamp;

pub use api::{ChatBackend, HttpBackend};
pub use config::ClientConfig;
pub use error::ChatError;
pub use orchestrator::{Navigator, Orchestrator, Phase};
pub use reveal::{RevealEngine, RevealState};
