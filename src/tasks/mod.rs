//! Background scheduled tasks for the application.
//!
//! The only recurring job purges OTP records whose TTL has elapsed without
//! being verified. Call `spawn_all` once during startup to launch it.

use std::time::Duration;

use crate::services::OtpService;

/// Spawn all background tasks.
///
/// This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(otp_service: OtpService, purge_interval_secs: u64) {
    // 过期验证码清理
    tokio::spawn(async move {
        let interval = Duration::from_secs(purge_interval_secs.max(1));
        loop {
            match otp_service.purge_expired().await {
                Ok(n) if n > 0 => log::info!("Expired OTP records purged: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to purge expired OTP records: {e:?}"),
            }
            tokio::time::sleep(interval).await;
        }
    });
}
