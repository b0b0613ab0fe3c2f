use std::sync::Arc;

use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::providers::Clock;
use crate::types::dto::common::HealthResponse;

/// Health check API
pub struct HealthApi {
    clock: Arc<dyn Clock>,
}

#[derive(Tags)]
enum ApiTags {
    /// Health check endpoints
    Health,
}

impl HealthApi {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[OpenApi]
impl HealthApi {
    /// Health check endpoint
    ///
    /// Returns the current status of the API service
    #[oai(path = "/health", method = "get", tag = "ApiTags::Health")]
    async fn health(&self) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: self.clock.now().to_rfc3339(),
        })
    }
}
