//! 批次汇总
//!
//! 所有文档结果产生之后一次性构建

use crate::models::document::{AgeInfo, DocumentResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 未成年名单条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderageEntry {
    pub name: String,
    pub age: i32,
    pub date_of_birth: String,
    pub filename: String,
}

/// 错误文件条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub filename: String,
    pub error: String,
}

/// 批次统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_processed: usize,
    pub underage_count: usize,
    pub adult_count: usize,
    pub error_count: usize,
    pub underage_list: Vec<UnderageEntry>,
    pub error_files: Vec<ErrorEntry>,
}

impl BatchSummary {
    /// 对每个文档结果分类
    ///
    /// `age_info` 为错误标记的文档也计入错误，保证
    /// `total_processed == underage_count + adult_count + error_count`
    pub fn from_results(results: &[DocumentResult]) -> Self {
        let mut summary = BatchSummary {
            total_processed: results.len(),
            ..Default::default()
        };

        for result in results {
            match result {
                DocumentResult::Failed { filename, error } => {
                    summary.push_error(filename, error);
                }
                DocumentResult::Processed {
                    filename,
                    age_info: AgeInfo::Error { error },
                    ..
                } => {
                    summary.push_error(filename, error);
                }
                DocumentResult::Processed {
                    filename,
                    age_info: AgeInfo::Verified(details),
                    found_names,
                    ..
                } => {
                    if details.is_underage {
                        summary.underage_count += 1;
                        summary.underage_list.push(UnderageEntry {
                            name: holder_name(filename, found_names),
                            age: details.age,
                            date_of_birth: details.date_of_birth.clone(),
                            filename: filename.clone(),
                        });
                    } else {
                        summary.adult_count += 1;
                    }
                }
            }
        }

        summary
    }

    /// 有未成年或错误时才需要生成报告
    pub fn needs_report(&self) -> bool {
        !self.underage_list.is_empty() || !self.error_files.is_empty()
    }

    fn push_error(&mut self, filename: &str, error: &str) {
        self.error_count += 1;
        self.error_files.push(ErrorEntry {
            filename: filename.to_string(),
            error: error.to_string(),
        });
    }
}

/// 证件持有人姓名：文本中最早出现的登记姓名，否则用去掉扩展名的文件名
fn holder_name(filename: &str, found_names: &BTreeMap<String, Vec<usize>>) -> String {
    found_names
        .iter()
        .filter_map(|(name, lines)| lines.first().map(|line| (*line, name)))
        .min()
        .map(|(_, name)| name.clone())
        .unwrap_or_else(|| {
            Path::new(filename)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| filename.to_string())
        })
}

/// 最终结果：文档列表 + 汇总 + 报告文件名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub documents: Vec<DocumentResult>,
    pub summary: BatchSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_filename: Option<String>,
}
