use regex::Regex;
use std::sync::LazyLock;
use crate::error::{AppError, AppResult};

/// 支持地区（印度）的国家码前缀
pub const COUNTRY_CODE_PREFIX: &str = "+91";

/// 规范化后手机号的位数
pub const PHONE_DIGITS: usize = 10;

static NON_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());

/// 规范化手机号：去掉 +91 前缀和所有非数字字符，必须剩下 10 位数字
pub fn normalize_phone(phone: &str) -> AppResult<String> {
    let trimmed = phone.trim();
    let without_prefix = trimmed.strip_prefix(COUNTRY_CODE_PREFIX).unwrap_or(trimmed);
    let digits = NON_DIGIT.replace_all(without_prefix, "").into_owned();

    if digits.len() != PHONE_DIGITS {
        return Err(AppError::ValidationError("Invalid phone number".to_string()));
    }

    Ok(digits)
}
