//! 文档处理上下文
//!
//! 封装"我正在处理哪个批次的第几个文档"这一信息

use std::fmt::Display;

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocumentCtx {
    /// 批次 ID，隔离不同批次的临时存储键
    pub run_id: String,

    /// 文档在压缩包中的序号（从1开始）
    pub index: usize,

    /// 本批次文档总数（仅用于日志显示）
    pub total: usize,

    /// 规范化后的文件名
    pub filename: String,
}

impl DocumentCtx {
    /// 创建新的文档上下文
    pub fn new(run_id: impl Into<String>, index: usize, total: usize, filename: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            index,
            total,
            filename: filename.into(),
        }
    }

    /// 临时存储键
    ///
    /// 带上序号，两个规范化后同名的条目也不会冲突
    pub fn storage_key(&self) -> String {
        format!("{}/{:04}_{}", self.run_id, self.index, self.filename)
    }
}

impl Display for DocumentCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 {}/{} {}]", self.index, self.total, self.filename)
    }
}
