//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `archive` - 压缩包解包
//! - 校验压缩包格式
//! - 按扩展名筛选条目
//! - 规范化文件名
//!
//! ### `batch_processor` - 批量文档处理器
//! - 控制并发数量（Semaphore）
//! - 发出阶段 / 进度 / 结果事件
//! - 汇总结果、生成报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Document>)
//!     ↓
//! workflow::DocumentFlow (处理单个 Document)
//!     ↓
//! services (能力层：日期提取 / 年龄计算 / 姓名查找 / 报告)
//!     ↓
//! infrastructure (基础设施：ScratchStore / OcrProvider / Clock)
//! ```

pub mod archive;
pub mod batch_processor;

// 重新导出主要类型
pub use archive::{normalize_filename, validate_upload_name};
pub use batch_processor::BatchProcessor;
