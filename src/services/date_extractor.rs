//! 出生日期提取服务 - 业务能力层
//!
//! 从 OCR 文本中找出最可能的出生日期。
//!
//! 规则：证件上通常印有出生日期和签发/有效期日期，取最早的那个作为出生日期。
//! 只出现一个日期时，通常是签发日期，认为没有可靠的出生日期。

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// dd/mm/yyyy，不校验日、月范围
static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("日期正则无效"));

const DATE_FORMAT: &str = "%d/%m/%Y";

/// 出生日期合理性检查（默认不启用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plausibility {
    /// 早于"今天"这么多年的日期被丢弃
    pub max_age_years: Option<u32>,
    /// 丢弃晚于"今天"的日期
    pub reject_future: bool,
}

impl Plausibility {
    pub fn is_enabled(&self) -> bool {
        self.max_age_years.is_some() || self.reject_future
    }

    fn accepts(&self, date: NaiveDate, today: NaiveDate) -> bool {
        if self.reject_future && date > today {
            return false;
        }
        // 年份溢出时视为没有下限
        let oldest_year = self
            .max_age_years
            .and_then(|max_age| i32::try_from(max_age).ok())
            .and_then(|max_age| today.year().checked_sub(max_age));
        if let Some(year) = oldest_year {
            // 2月29日 往前推到非闰年时退到 2月28日
            let oldest = today
                .with_year(year)
                .or_else(|| NaiveDate::from_ymd_opt(year, today.month(), 28));
            if matches!(oldest, Some(oldest) if date < oldest) {
                return false;
            }
        }
        true
    }
}

/// 出生日期提取服务
#[derive(Debug, Clone, Default)]
pub struct DateExtractor {
    plausibility: Plausibility,
}

impl DateExtractor {
    pub fn new(plausibility: Plausibility) -> Self {
        Self { plausibility }
    }

    /// 提取出生日期
    ///
    /// # 参数
    /// - `text`: OCR 文本
    /// - `today`: 合理性检查使用的"今天"
    ///
    /// # 返回
    /// 原文中的 dd/mm/yyyy 字符串，找不到返回 None
    pub fn extract(&self, text: &str, today: NaiveDate) -> Option<String> {
        let tokens = distinct_tokens(text);
        debug!("找到 {} 个不同的日期: {:?}", tokens.len(), tokens);

        if tokens.len() < 2 {
            return None;
        }

        tokens
            .into_iter()
            .filter_map(|token| {
                NaiveDate::parse_from_str(token, DATE_FORMAT)
                    .ok()
                    .map(|date| (date, token))
            })
            .filter(|(date, _)| {
                !self.plausibility.is_enabled() || self.plausibility.accepts(*date, today)
            })
            .min_by_key(|(date, _)| *date)
            .map(|(_, token)| token.to_string())
    }
}

/// 不做合理性检查的提取
pub fn extract_date_of_birth(text: &str) -> Option<String> {
    DateExtractor::default().extract(text, NaiveDate::MAX)
}

/// 按出现顺序去重
fn distinct_tokens(text: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    DATE_TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| seen.insert(*token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_date_or_single_date_is_absent() {
        assert_eq!(extract_date_of_birth("REGISTRO GERAL"), None);
        assert_eq!(extract_date_of_birth("EXPEDIÇÃO 01/01/2020"), None);
    }

    #[test]
    fn test_repeated_single_date_is_absent() {
        assert_eq!(
            extract_date_of_birth("EMISSÃO 01/01/2020\nVALIDADE 01/01/2020"),
            None
        );
    }

    #[test]
    fn test_earliest_date_regardless_of_order() {
        assert_eq!(
            extract_date_of_birth("NASC 10/05/1990\nEXP 01/01/2020"),
            Some("10/05/1990".to_string())
        );
        assert_eq!(
            extract_date_of_birth("EXP 01/01/2020\nNASC 10/05/1990"),
            Some("10/05/1990".to_string())
        );
        assert_eq!(
            extract_date_of_birth("VAL 03/04/2031 EMIS 02/03/2021 NASC 15/08/2009"),
            Some("15/08/2009".to_string())
        );
    }

    #[test]
    fn test_unparseable_tokens_are_discarded() {
        // 31/02 不存在，99/99 也不存在
        assert_eq!(
            extract_date_of_birth("31/02/1980 99/99/1970 07/07/2001 01/01/2020"),
            Some("07/07/2001".to_string())
        );
        assert_eq!(extract_date_of_birth("31/02/1980 99/99/1970"), None);
    }

    #[test]
    fn test_plausibility_window() {
        let today = date(2025, 6, 1);
        let extractor = DateExtractor::new(Plausibility {
            max_age_years: Some(120),
            reject_future: true,
        });

        // 1850 太早，2030 是未来
        assert_eq!(
            extractor.extract("01/01/1850 12/12/2010 01/01/2030", today),
            Some("12/12/2010".to_string())
        );
        assert_eq!(extractor.extract("01/01/1850 01/01/2030", today), None);

        // 默认不检查
        assert_eq!(
            DateExtractor::default().extract("01/01/1850 12/12/2010", today),
            Some("01/01/1850".to_string())
        );
    }

    #[test]
    fn test_plausibility_huge_max_age_has_no_lower_bound() {
        let today = date(2025, 6, 1);
        for max_age in [u32::MAX, i32::MAX as u32 + 1, 1_000_000] {
            let window = Plausibility {
                max_age_years: Some(max_age),
                reject_future: true,
            };
            assert!(window.accepts(date(1850, 1, 1), today), "{}", max_age);
            assert!(!window.accepts(date(2030, 1, 1), today), "{}", max_age);
        }
    }

    #[test]
    fn test_plausibility_leap_day_today() {
        let window = Plausibility {
            max_age_years: Some(1),
            reject_future: false,
        };
        let today = date(2024, 2, 29);
        assert!(window.accepts(date(2023, 2, 28), today));
        assert!(!window.accepts(date(2023, 2, 27), today));
    }
}
