use actix_web::{web, HttpRequest, HttpResponse, Result, ResponseError};
use chrono::DateTime;
use crate::error::AppError;
use crate::middlewares::get_authenticated_phone;
use crate::models::*;

#[utoipa::path(
    get,
    path = "/api/session",
    tag = "session",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Missing or invalid session token", body = ErrorResponse)
    )
)]
pub async fn get_session(req: HttpRequest) -> Result<HttpResponse> {
    let Some(auth) = get_authenticated_phone(&req) else {
        return Ok(AppError::AuthError("Unauthorized".to_string()).error_response());
    };

    let expires_at = DateTime::from_timestamp(auth.expires_at, 0)
        .ok_or_else(|| AppError::InternalError("Invalid token expiry".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionResponse {
        phone: auth.phone,
        expires_at,
    })))
}

pub fn session_config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(get_session));
}
