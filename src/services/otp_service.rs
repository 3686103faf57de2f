use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::config::OtpConfig;
use crate::database::OtpStore;
use crate::error::{AppError, AppResult};
use crate::external::SmsSender;
use crate::models::*;
use crate::utils::*;

/// 手机验证码的签发与校验。
///
/// 签发时先写库再发短信：短信失败时不会回滚记录，用户仍可用已收到
/// （或稍后送达）的验证码完成校验。这是有意保留的取舍，调用方会收到
/// `AppError::DeliveryError`，但记录依然有效。
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    sms_sender: Arc<dyn SmsSender>,
    jwt_service: JwtService,
    config: OtpConfig,
}

impl OtpService {
    pub fn new(
        store: Arc<dyn OtpStore>,
        sms_sender: Arc<dyn SmsSender>,
        jwt_service: JwtService,
        config: OtpConfig,
    ) -> Self {
        Self {
            store,
            sms_sender,
            jwt_service,
            config,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.config.ttl_secs)
    }

    pub fn delivery_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.config.delivery_timeout_ms)
    }

    pub async fn send_otp(&self, phone: Option<&str>) -> AppResult<SendOtpResponse> {
        let phone = phone
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::ValidationError("Phone number required".to_string()))?;
        let phone = normalize_phone(phone)?;

        let code = generate_six_digit_code();
        let code_hash = hash_code_blocking(code.clone(), self.config.hash_cost).await?;

        // 只保留最新一条验证码
        let removed = self.store.delete_by_phone(&phone).await?;
        if removed > 0 {
            log::debug!("Superseded {removed} pending OTP record(s) for {phone}");
        }
        self.store
            .insert(OtpRecord::new(phone.clone(), code_hash, Utc::now()))
            .await?;

        // 记录已落库，短信失败不回滚；任何 SmsSender 都受同一超时约束
        let delivery = tokio::time::timeout(
            self.delivery_timeout(),
            self.sms_sender.deliver(&phone, &code),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::DeliveryError(format!(
                "SMS delivery timed out after {}ms",
                self.config.delivery_timeout_ms
            )))
        });
        if let Err(e) = delivery {
            log::error!("SMS sending failed for {phone}: {e}");
            return Err(match e {
                AppError::DeliveryError(_) => e,
                other => AppError::DeliveryError(other.to_string()),
            });
        }

        Ok(SendOtpResponse {
            success: true,
            message: "OTP sent successfully via SMS".to_string(),
        })
    }

    pub async fn verify_otp(
        &self,
        phone: Option<&str>,
        otp: Option<&str>,
    ) -> AppResult<VerifyOtpResponse> {
        let (phone, otp) = match (phone, otp) {
            (Some(p), Some(o)) if !p.is_empty() && !o.is_empty() => (p, o),
            _ => {
                return Err(AppError::ValidationError(
                    "Phone and OTP required".to_string(),
                ));
            }
        };
        let phone = normalize_phone(phone)?;

        let record = self
            .store
            .find_latest(&phone)
            .await?
            .ok_or(AppError::OtpNotFound)?;

        if record.is_expired(Utc::now(), self.ttl()) {
            self.store.delete_by_id(record.id).await?;
            log::info!("Expired OTP consumed for {phone}");
            return Err(AppError::OtpExpired);
        }

        let is_valid = verify_code_blocking(otp.to_string(), record.code_hash.clone()).await?;
        if !is_valid {
            return Err(self.record_failed_attempt(&record).await?);
        }

        // 一次性使用：删除失败说明已被并发请求消费
        if self.store.delete_by_id(record.id).await? == 0 {
            log::warn!("OTP for {phone} was consumed by a concurrent request");
            return Err(AppError::OtpAlreadyConsumed);
        }

        let token = self.jwt_service.issue_session_token(&phone)?;
        log::info!("OTP verified for {phone}");

        Ok(VerifyOtpResponse {
            success: true,
            message: "OTP verified successfully".to_string(),
            token,
        })
    }

    /// 校验失败时累加次数；达到上限后作废该记录
    async fn record_failed_attempt(&self, record: &OtpRecord) -> AppResult<AppError> {
        let Some(attempts) = self.store.increment_attempts(record.id).await? else {
            return Ok(AppError::OtpNotFound);
        };

        if self.config.max_attempts > 0 && attempts >= self.config.max_attempts {
            self.store.delete_by_id(record.id).await?;
            log::warn!(
                "OTP for {} locked out after {attempts} invalid attempts",
                record.phone
            );
            return Ok(AppError::TooManyAttempts);
        }

        Ok(AppError::OtpMismatch)
    }

    /// 清理已过 TTL 的记录，返回清理条数
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.store.delete_created_before(Utc::now() - self.ttl()).await
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}
