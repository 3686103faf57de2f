use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 通过会话令牌认证的当前用户，由鉴权中间件写入请求扩展
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPhone {
    pub phone: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    #[schema(example = "9876543210")]
    pub phone: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "OK")]
    pub status: String,
    #[schema(example = "connected")]
    pub database: String,
    pub timestamp: DateTime<Utc>,
}
