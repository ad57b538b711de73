use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use regex::Regex;

/// 校验邮箱格式并归一化为小写（全库统一小写存储）
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let email_regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

    if !email_regex.is_match(&email) {
        return Err(AppError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }

    Ok(email)
}

/// 必填字段非空校验
pub fn require_non_empty(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

/// 解析活动日期 (YYYY-MM-DD)
pub fn parse_draw_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::ValidationError("Invalid draw date format".to_string()))
}
