use actix_web::{HttpResponse, Result, ResponseError, web};
use chrono::Utc;
use crate::error::AppError;
use crate::models::HealthResponse;
use crate::services::OtpService;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health(otp_service: web::Data<OtpService>) -> Result<HttpResponse> {
    let database = if otp_service.store_healthy().await {
        "connected"
    } else {
        "disconnected"
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "OK".to_string(),
        database: database.to_string(),
        timestamp: Utc::now(),
    }))
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().body("South Bay Mart API Running...")
}

pub async fn not_found() -> HttpResponse {
    AppError::NotFound("Route not found".to_string()).error_response()
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health));
}
