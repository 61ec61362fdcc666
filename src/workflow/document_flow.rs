//! 文档处理流程 - 流程层
//!
//! 核心职责：定义"一个文档"的完整处理流程
//!
//! 流程顺序（严格串行）：
//! 1. 写入临时存储
//! 2. 提交 OCR 任务 → 轮询直到完成 / 失败 / 超时
//! 3. 拼接文本 → 提取出生日期 → 计算年龄
//! 4. 删除临时存储对象（无论前面成功与否，只删一次）

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, ProviderError};
use crate::infrastructure::{Clock, JobPoll, JobStatus, OcrProvider, PipelineServices, ScratchStore};
use crate::models::{AgeInfo, DocumentResult, DOB_NOT_FOUND};
use crate::services::{search_names, AgeCalculator, DateExtractor, Plausibility};
use crate::utils::truncate_text;
use crate::workflow::document_ctx::DocumentCtx;

/// OCR 轮询参数
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_poll_attempts.max(1),
        }
    }
}

/// 文档处理流程
///
/// - 编排单个文档的存储、识别、解析和清理
/// - 每一步都返回 Result，错误只影响当前文档
/// - 不持有批次状态
pub struct DocumentFlow {
    store: Arc<dyn ScratchStore>,
    ocr: Arc<dyn OcrProvider>,
    clock: Arc<dyn Clock>,
    extractor: DateExtractor,
    calculator: AgeCalculator,
    registered_names: Vec<String>,
    poll: PollSettings,
    verbose_logging: bool,
}

impl DocumentFlow {
    /// 创建新的文档处理流程
    pub fn new(config: &Config, services: &PipelineServices) -> Self {
        let plausibility = Plausibility {
            max_age_years: config.dob_max_age_years,
            reject_future: config.dob_reject_future,
        };

        Self {
            store: services.store.clone(),
            ocr: services.ocr.clone(),
            clock: services.clock.clone(),
            extractor: DateExtractor::new(plausibility),
            calculator: AgeCalculator::new(services.clock.clone()),
            registered_names: config.registered_names.clone(),
            poll: PollSettings::from_config(config),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 单独处理一个文档（使用新的批次 ID）
    pub async fn process(&self, filename: &str, bytes: Vec<u8>) -> DocumentResult {
        let ctx = DocumentCtx::new(uuid::Uuid::new_v4().simple().to_string(), 1, 1, filename);
        self.run(&ctx, bytes).await
    }

    pub async fn run(&self, ctx: &DocumentCtx, bytes: Vec<u8>) -> DocumentResult {
        info!("{} 📄 开始处理 ({} 字节)", ctx, bytes.len());

        let key = ctx.storage_key();
        let outcome = self.extract_text(ctx, &key, bytes).await;

        // 清理只做一次，失败不影响结果
        self.cleanup(ctx, &key).await;

        match outcome {
            Ok(text) => self.build_result(ctx, text),
            Err(e) => {
                warn!("{} ❌ 处理失败: {}", ctx, e);
                DocumentResult::failed(ctx.filename.clone(), e.to_string())
            }
        }
    }

    /// 存储 → 提交 → 轮询 → 拼接文本
    async fn extract_text(&self, ctx: &DocumentCtx, key: &str, bytes: Vec<u8>) -> AppResult<String> {
        let storage_ref = self.store.put(key, bytes).await?;
        debug!("{} 已写入临时存储: {}", ctx, storage_ref.uri);

        let job_id = self.ocr.submit(&storage_ref).await?;
        info!("{} 🔍 OCR 任务已提交: {}", ctx, job_id);

        let poll = self.wait_for_job(ctx, &job_id).await?;
        Ok(poll.line_text())
    }

    /// 按固定间隔轮询，超过最大次数判定超时
    async fn wait_for_job(&self, ctx: &DocumentCtx, job_id: &str) -> Result<JobPoll, ProviderError> {
        for attempt in 1..=self.poll.max_attempts {
            let poll = self.ocr.poll(job_id).await?;

            match poll.status {
                JobStatus::Succeeded => {
                    debug!("{} OCR 任务完成 (第 {} 次查询)", ctx, attempt);
                    return Ok(poll);
                }
                JobStatus::Failed => {
                    return Err(ProviderError::JobFailed {
                        job_id: job_id.to_string(),
                        reason: poll.status_message,
                    });
                }
                JobStatus::Pending => {
                    if attempt < self.poll.max_attempts {
                        sleep(self.poll.interval).await;
                    }
                }
            }
        }

        Err(ProviderError::Timeout {
            job_id: job_id.to_string(),
            attempts: self.poll.max_attempts,
        })
    }

    /// 文本 → 出生日期 → 年龄
    fn build_result(&self, ctx: &DocumentCtx, text: String) -> DocumentResult {
        if self.verbose_logging {
            info!("{} 文本: {}", ctx, truncate_text(&text.replace('\n', " | "), 120));
        }

        let found_names = search_names(&text, &self.registered_names);

        let age_info = match self.extractor.extract(&text, self.clock.today()) {
            None => {
                warn!("{} ⚠️ 未找到出生日期", ctx);
                AgeInfo::error(DOB_NOT_FOUND)
            }
            Some(date_of_birth) => match self.calculator.calculate(&date_of_birth) {
                Ok(details) => {
                    info!(
                        "{} ✓ 出生日期 {} | 年龄 {} | 未成年: {}",
                        ctx, details.date_of_birth, details.age, details.is_underage
                    );
                    AgeInfo::Verified(details)
                }
                Err(e) => {
                    warn!("{} ⚠️ 年龄计算失败: {}", ctx, e);
                    AgeInfo::error(format!("Erro ao calcular idade: {}", e))
                }
            },
        };

        DocumentResult::Processed {
            filename: ctx.filename.clone(),
            text,
            age_info,
            found_names,
        }
    }

    /// 删除临时存储对象
    async fn cleanup(&self, ctx: &DocumentCtx, key: &str) {
        match self.store.delete(key).await {
            Ok(()) => debug!("{} 🗑️ 临时对象已删除", ctx),
            Err(e) => warn!("{} ⚠️ 删除临时对象失败（已忽略）: {}", ctx, e),
        }
    }
}
