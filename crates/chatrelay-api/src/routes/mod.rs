use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod health;
pub mod history;
pub mod settings;

/// `{"status": "success"}` acknowledgement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}
