pub mod health;
pub mod otp;
pub mod session;

use actix_web::web;
use crate::error::AppError;

pub use health::{health_config, not_found};
pub use otp::otp_config;
pub use session::session_config;

/// JSON 请求体解析失败时返回统一的校验错误
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(10 * 1024 * 1024)
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}
