//! # Age Verification
//!
//! 批量证件年龄核验：上传一个压缩包，逐个文档做 OCR，
//! 从文本中推断出生日期，计算年龄并标记未成年，最后汇总成报告。
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部资源，只暴露能力
//! - `ScratchStore` - 临时存储（内存 / 本地目录）
//! - `OcrProvider` - 基于任务的 OCR 服务（HTTP）
//! - `Clock` - 可注入的时钟
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个文本 / 单个汇总
//! - `DateExtractor` - 出生日期提取
//! - `AgeCalculator` - 年龄计算
//! - `search_names` - 登记姓名查找
//! - `ReportWriter` - 写核验报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文档"的完整处理流程
//! - `DocumentCtx` - 上下文封装（批次 ID + 文档序号）
//! - `DocumentFlow` - 流程编排（存储 → OCR → 解析 → 清理）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/archive` - 压缩包解包
//! - `orchestrator/batch_processor` - 批量处理器，管理并发和事件流
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, DispatchMode};
pub use error::{AppResult, ParseError, PipelineError, ProviderError, StorageError};
pub use infrastructure::PipelineServices;
pub use models::{BatchEvent, BatchReport, BatchStage, BatchSummary, DocumentResult};
pub use orchestrator::BatchProcessor;
pub use workflow::{DocumentCtx, DocumentFlow};
