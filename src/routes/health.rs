// Liveness endpoints. They never touch the Auth API.
use actix_web::{get, HttpResponse, Result};

use crate::time;
use crate::types::HealthResponse;

fn health_body() -> HealthResponse {
    HealthResponse {
        status: "ok".to_string(),
        time: time::now(),
        version: option_env!("APP_BUILD_VERSION")
            .or(option_env!("CARGO_PKG_VERSION"))
            .map(|s| s.to_string()),
    }
}

#[get("/healthz")]
pub async fn healthz() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(health_body()))
}

#[get("/health")]
pub async fn health() -> Result<HttpResponse> {
    // Alias for load balancers that probe /health
    Ok(HttpResponse::Ok().json(health_body()))
}
