pub mod api;
pub mod cli;
pub mod client;
pub mod core;
pub mod jobs;
pub mod llm;
