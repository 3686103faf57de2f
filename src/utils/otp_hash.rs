use bcrypt::{hash, verify};
use crate::error::{AppError, AppResult};

/// 对验证码做加盐哈希（bcrypt），明文不落库
pub fn hash_code(code: &str, cost: u32) -> AppResult<String> {
    hash(code, cost).map_err(|e| AppError::InternalError(format!("OTP hashing failed: {e}")))
}

/// 校验验证码与哈希是否匹配
pub fn verify_code(code: &str, code_hash: &str) -> AppResult<bool> {
    verify(code, code_hash)
        .map_err(|e| AppError::InternalError(format!("OTP hash verification failed: {e}")))
}

/// bcrypt 是 CPU 密集型操作，放到阻塞线程池中执行
pub async fn hash_code_blocking(code: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_code(&code, cost))
        .await
        .map_err(|e| AppError::InternalError(format!("OTP hashing task failed: {e}")))?
}

pub async fn verify_code_blocking(code: String, code_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_code(&code, &code_hash))
        .await
        .map_err(|e| AppError::InternalError(format!("OTP verification task failed: {e}")))?
}
