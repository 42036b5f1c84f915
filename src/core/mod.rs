pub mod config;
pub mod db;
pub mod object_id;

pub use config::AppConfig;
