//! 流式输出给调用方的事件
//!
//! 每个事件序列化成一行 JSON（NDJSON），用 `type` 字段区分

use crate::models::summary::BatchReport;
use serde::Serialize;

/// 批次运行阶段
///
/// 处理中的文档用 `Progress` 事件表示，完成和失败分别是 `Result` / `Error` 事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Unpacking,
    Dispatching,
    Aggregating,
    Reporting,
}

/// 批次事件
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    /// 阶段切换
    Stage {
        stage: BatchStage,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
    },
    /// 一个文档处理完成（按完成顺序）
    Progress {
        processed: usize,
        total: usize,
        current_file: String,
        message: String,
    },
    /// 最终结果，总是最后一个事件
    Result(BatchReport),
    /// 整批失败，代替最终结果
    Error { stage: BatchStage, message: String },
}

impl BatchEvent {
    pub fn stage(stage: BatchStage, message: impl Into<String>) -> Self {
        BatchEvent::Stage {
            stage,
            message: message.into(),
            total: None,
        }
    }

    /// 是否是流的最后一个事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchEvent::Result(_) | BatchEvent::Error { .. })
    }
}
