//! 年龄计算服务 - 业务能力层

use crate::error::ParseError;
use crate::infrastructure::Clock;
use crate::models::AgeDetails;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// 成年年龄
pub const ADULT_AGE: i32 = 18;

static STRICT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("日期正则无效"));

/// 年龄计算服务
///
/// 使用注入的时钟作为"今天"
#[derive(Clone)]
pub struct AgeCalculator {
    clock: Arc<dyn Clock>,
}

impl AgeCalculator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn calculate(&self, date_of_birth: &str) -> Result<AgeDetails, ParseError> {
        calculate_age(date_of_birth, self.clock.today())
    }
}

/// 计算年龄
///
/// # 参数
/// - `date_of_birth`: dd/mm/yyyy
/// - `today`: 计算基准日
///
/// # 返回
/// 年龄、是否未成年以及原始出生日期
pub fn calculate_age(date_of_birth: &str, today: NaiveDate) -> Result<AgeDetails, ParseError> {
    if !STRICT_DATE.is_match(date_of_birth) {
        return Err(ParseError::Malformed(date_of_birth.to_string()));
    }

    let dob = NaiveDate::parse_from_str(date_of_birth, "%d/%m/%Y")
        .map_err(|_| ParseError::InvalidDate(date_of_birth.to_string()))?;

    let mut age = today.year() - dob.year();
    // 今年生日还没到
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }

    Ok(AgeDetails {
        age,
        is_underage: age < ADULT_AGE,
        date_of_birth: date_of_birth.to_string(),
    })
}
