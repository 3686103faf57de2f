use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("OTP expired or invalid")]
    OtpNotFound,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Invalid OTP")]
    OtpMismatch,

    /// 验证成功但删除时记录已被并发请求消费
    #[error("OTP already consumed")]
    OtpAlreadyConsumed,

    #[error("Too many invalid attempts")]
    TooManyAttempts,

    /// 短信发送失败；已保存的验证码记录仍然有效
    #[error("SMS delivery error: {0}")]
    DeliveryError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl AppError {
    /// 机器可读的错误码，放在响应体的 `error` 字段
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::OtpNotFound => "OTP_NOT_FOUND",
            AppError::OtpExpired => "OTP_EXPIRED",
            AppError::OtpMismatch => "OTP_INVALID",
            AppError::OtpAlreadyConsumed => "OTP_CONSUMED",
            AppError::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            AppError::DeliveryError(_) => "DELIVERY_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// 返回给客户端的文案；服务端故障不暴露内部细节
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::OtpNotFound | AppError::OtpAlreadyConsumed => {
                "OTP expired or invalid".to_string()
            }
            AppError::OtpExpired => "OTP expired".to_string(),
            AppError::OtpMismatch => "Invalid OTP".to_string(),
            AppError::TooManyAttempts => {
                "Too many invalid attempts. Please request a new OTP.".to_string()
            }
            AppError::DeliveryError(_) => "Failed to send SMS. Please try again.".to_string(),
            AppError::JwtError(_) => "Invalid session token".to_string(),
            AppError::DatabaseError(_) => "Database error".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl AppError {
    /// 开发环境下附带内部原因，便于排查短信通道问题
    pub fn detail(&self) -> Option<&str> {
        match self {
            AppError::DeliveryError(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn error_response_with_detail(&self) -> HttpResponse {
        self.build_response(true)
    }

    fn build_response(&self, with_detail: bool) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }

        let mut body = json!({
            "success": false,
            "message": self.public_message(),
            "error": self.code()
        });
        if with_detail && let Some(detail) = self.detail() {
            body["detail"] = json!(detail);
        }
        HttpResponse::build(status_code).json(body)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::OtpNotFound
            | AppError::OtpExpired
            | AppError::OtpMismatch
            | AppError::OtpAlreadyConsumed => StatusCode::BAD_REQUEST,
            AppError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.build_response(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_otp_errors_map_to_bad_request() {
        let (status, body) = body_json(AppError::OtpExpired).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "OTP expired");
        assert_eq!(body["error"], "OTP_EXPIRED");

        let (status, body) = body_json(AppError::OtpAlreadyConsumed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "OTP expired or invalid");
    }

    #[actix_web::test]
    async fn test_delivery_error_hides_provider_detail() {
        let (status, body) =
            body_json(AppError::DeliveryError("provider said no".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to send SMS. Please try again.");
        assert_eq!(body["error"], "DELIVERY_ERROR");
        assert!(body.get("detail").is_none());
    }

    #[actix_web::test]
    async fn test_detailed_response_carries_delivery_reason() {
        let resp = AppError::DeliveryError("provider said no".to_string())
            .error_response_with_detail();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Failed to send SMS. Please try again.");
        assert_eq!(body["error"], "DELIVERY_ERROR");
        assert_eq!(body["detail"], "provider said no");

        // 非投递错误没有可附带的原因
        let resp = AppError::OtpExpired.error_response_with_detail();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body.get("detail").is_none());
    }

    #[actix_web::test]
    async fn test_too_many_attempts_status() {
        let (status, _) = body_json(AppError::TooManyAttempts).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }
}
