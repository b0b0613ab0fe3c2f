// API layer - HTTP endpoints
pub mod admin;
pub mod auth;
pub mod health;
pub mod helpers;
pub mod routes;

use std::sync::Arc;

use poem::Route;
use poem_openapi::OpenApiService;

pub use admin::AdminApi;
pub use auth::{AuthApi, BearerAuth};
pub use health::HealthApi;

use crate::app_data::AppData;

#[cfg(test)]
mod helpers_test;

/// OpenAPI service combining every endpoint group
pub fn api_service(
    app_data: Arc<AppData>,
    server_url: &str,
) -> OpenApiService<(HealthApi, AuthApi, AdminApi), ()> {
    OpenApiService::new(
        (
            HealthApi::new(Arc::clone(&app_data.clock)),
            AuthApi::new(Arc::clone(&app_data)),
            AdminApi::new(app_data),
        ),
        "HMS Auth API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(server_url)
}

/// API nested under `/api`, Swagger UI under `/swagger`
pub fn routes(app_data: Arc<AppData>, server_url: &str) -> Route {
    let service = api_service(app_data, server_url);
    let ui = service.swagger_ui();
    Route::new().nest("/api", service).nest("/swagger", ui)
}
