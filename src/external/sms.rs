use async_trait::async_trait;

use crate::error::AppResult;

/// 短信投递能力。实现方只需保证：成功返回 Ok(())，
/// 任何失败（网络、超时、服务商拒绝、响应格式异常）都返回 `AppError::DeliveryError`。
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn deliver(&self, phone: &str, code: &str) -> AppResult<()>;
}
