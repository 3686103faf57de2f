use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::otp_record_entity as otp_records;

/// 已持久化的验证码记录；记录存在即代表“待验证”状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub id: Uuid,
    pub phone: String,
    pub code_hash: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn new(phone: String, code_hash: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            phone,
            code_hash,
            attempts: 0,
            created_at,
        }
    }

    /// 超过 TTL（严格大于）即视为过期
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.created_at) > ttl
    }
}

impl From<otp_records::Model> for OtpRecord {
    fn from(m: otp_records::Model) -> Self {
        Self {
            id: m.id,
            phone: m.phone,
            code_hash: m.code_hash,
            attempts: m.attempts,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendOtpRequest {
    #[schema(example = "+919876543210")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    #[schema(example = "9876543210")]
    pub phone: Option<String>,
    #[schema(example = "482913")]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}
