//! Public types for the user API
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}
