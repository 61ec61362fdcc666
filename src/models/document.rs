use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 没有找到出生日期时的错误标记
pub const DOB_NOT_FOUND: &str = "Data de nascimento não encontrada no documento";

/// 从压缩包中读出的文档
#[derive(Debug, Clone)]
pub struct Document {
    /// 规范化后的文件名
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// 年龄计算结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeDetails {
    pub age: i32,
    pub is_underage: bool,
    pub date_of_birth: String,
}

/// 年龄信息：计算成功，或者一个错误标记
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeInfo {
    Verified(AgeDetails),
    Error { error: String },
}

impl AgeInfo {
    pub fn error(message: impl Into<String>) -> Self {
        AgeInfo::Error {
            error: message.into(),
        }
    }
}

/// 单个文档的处理结果
///
/// 生成后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentResult {
    Processed {
        filename: String,
        text: String,
        age_info: AgeInfo,
        /// 登记姓名 -> 出现的行号（从 1 开始）
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        found_names: BTreeMap<String, Vec<usize>>,
    },
    Failed {
        filename: String,
        error: String,
    },
}

impl DocumentResult {
    pub fn failed(filename: impl Into<String>, error: impl Into<String>) -> Self {
        DocumentResult::Failed {
            filename: filename.into(),
            error: error.into(),
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            DocumentResult::Processed { filename, .. } | DocumentResult::Failed { filename, .. } => {
                filename
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DocumentResult::Failed { .. })
    }
}
