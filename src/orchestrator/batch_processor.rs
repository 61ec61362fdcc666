//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是流水线的入口，负责一个压缩包（一个批次）的完整处理。
//!
//! ## 核心功能
//!
//! 1. **解包**：校验压缩包，筛选并规范化文档条目
//! 2. **并发控制**：使用 Semaphore 限制同时处理的文档数量
//! 3. **分发**：工作池（默认）或分批两种方式
//! 4. **进度流**：每完成一个文档发出一个进度事件（按完成顺序）
//! 5. **汇总**：构建 BatchSummary，需要时写出报告
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个文档的细节，委托 `DocumentFlow`
//! - **错误隔离**：单个文档的错误不影响其它文档，只有压缩包损坏才整批失败
//! - **事件流**：`run()` 返回一次性的事件流，最后一个事件是结果或错误

use crate::config::{Config, DispatchMode};
use crate::error::{AppResult, PipelineError};
use crate::infrastructure::{
    Clock, HttpOcrProvider, LocalDirStore, PipelineServices, ScratchStore, SystemClock,
};
use crate::models::{BatchEvent, BatchReport, BatchStage, BatchSummary, DocumentResult};
use crate::orchestrator::archive::{self, ArchiveEntry, UnpackedArchive};
use crate::services::ReportWriter;
use crate::utils::logging::{
    log_batch_complete, log_batch_start, log_documents_loaded, print_final_stats,
};
use crate::workflow::{DocumentCtx, DocumentFlow};
use futures::channel::mpsc::{self, UnboundedSender};
use futures::{Stream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id as TaskId, JoinSet};
use tracing::{debug, error, info, warn};

/// 批量文档处理器
#[derive(Clone)]
pub struct BatchProcessor {
    flow: Arc<DocumentFlow>,
    report_writer: Arc<ReportWriter>,
    store: Arc<dyn ScratchStore>,
    clock: Arc<dyn Clock>,
    max_concurrent: usize,
    dispatch_mode: DispatchMode,
}

impl BatchProcessor {
    /// 使用注入的外部服务创建
    pub fn new(config: &Config, services: PipelineServices) -> Self {
        Self {
            flow: Arc::new(DocumentFlow::new(config, &services)),
            report_writer: Arc::new(ReportWriter::new(&config.report_dir)),
            store: services.store.clone(),
            clock: services.clock.clone(),
            max_concurrent: config.max_concurrent_documents.max(1),
            dispatch_mode: config.dispatch_mode,
        }
    }

    /// 使用 HTTP OCR 服务、本地目录临时存储和系统时钟创建
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let ocr = HttpOcrProvider::new(
            config.ocr_api_base_url.clone(),
            config.ocr_api_key.clone(),
            Duration::from_secs(config.ocr_request_timeout_secs),
        )?;

        let services = PipelineServices::new(
            Arc::new(LocalDirStore::new(&config.scratch_dir)),
            Arc::new(ocr),
            Arc::new(SystemClock),
        );

        Ok(Self::new(config, services))
    }

    /// 运行一个批次
    ///
    /// 需要在 tokio 运行时中调用。返回的事件流只能消费一次，
    /// 再次调用会开始一个新的独立批次。
    pub fn run(&self, archive: Vec<u8>) -> impl Stream<Item = BatchEvent> + Send + Unpin + 'static {
        let (tx, rx) = mpsc::unbounded();
        let processor = self.clone();
        tokio::spawn(async move {
            processor.drive(archive, EventSink { tx }).await;
        });
        rx
    }

    /// 运行一个批次并等待最终结果
    pub async fn run_to_completion(&self, archive: Vec<u8>) -> AppResult<BatchReport> {
        let mut events = self.run(archive);
        while let Some(event) = events.next().await {
            match event {
                BatchEvent::Result(report) => return Ok(report),
                BatchEvent::Error { message, .. } => {
                    return Err(PipelineError::Aborted(message));
                }
                _ => {}
            }
        }
        Err(PipelineError::Aborted(
            "processamento encerrado sem resultado".to_string(),
        ))
    }

    /// 状态机：解包 → 分发 → 处理 → 汇总 → 报告
    async fn drive(self, archive: Vec<u8>, events: EventSink) {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        info!("📥 收到压缩包 ({} 字节)，批次 {}", archive.len(), run_id);

        events.emit(BatchEvent::stage(
            BatchStage::Unpacking,
            "Descompactando arquivo",
        ));

        let unpacked = match unpack_blocking(archive).await {
            Ok(unpacked) => unpacked,
            Err(e) => {
                error!("❌ 批次 {} 失败: {}", run_id, e);
                events.emit(BatchEvent::Error {
                    stage: BatchStage::Unpacking,
                    message: e.to_string(),
                });
                return;
            }
        };

        let total = unpacked.entries.len();
        log_documents_loaded(total, unpacked.ignored.len(), self.max_concurrent);
        if !unpacked.ignored.is_empty() {
            debug!("忽略的条目: {:?}", unpacked.ignored);
        }

        events.emit(BatchEvent::Stage {
            stage: BatchStage::Dispatching,
            message: format!("Processando {} documentos", total),
            total: Some(total),
        });

        let documents = self.dispatch(&run_id, unpacked.entries, &events).await;

        // 所有文档都已清理，释放批次目录
        if let Err(e) = self.store.release_run(&run_id).await {
            warn!("⚠️ 释放批次 {} 的临时存储失败（已忽略）: {}", run_id, e);
        }

        events.emit(BatchEvent::stage(
            BatchStage::Aggregating,
            "Consolidando resultados",
        ));
        let summary = BatchSummary::from_results(&documents);

        let report_filename = if summary.needs_report() {
            events.emit(BatchEvent::stage(BatchStage::Reporting, "Gerando relatório"));
            self.write_report(&summary).await
        } else {
            None
        };

        print_final_stats(
            summary.underage_count,
            summary.adult_count,
            summary.error_count,
            summary.total_processed,
            report_filename.as_deref(),
            self.clock.now(),
        );

        events.emit(BatchEvent::Result(BatchReport {
            documents,
            summary,
            report_filename,
        }));
    }

    /// 按配置的方式分发所有文档，结果按完成顺序返回
    async fn dispatch(
        &self,
        run_id: &str,
        entries: Vec<ArchiveEntry>,
        events: &EventSink,
    ) -> Vec<DocumentResult> {
        let total = entries.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut progress = Progress::new(total);

        let contexts: Vec<(DocumentCtx, ArchiveEntry)> = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                let ctx = DocumentCtx::new(run_id, idx + 1, total, entry.filename());
                (ctx, entry)
            })
            .collect();

        match self.dispatch_mode {
            DispatchMode::Pool => {
                let mut tasks = DocumentTasks::default();
                for (ctx, entry) in contexts {
                    self.spawn_document(&mut tasks, &semaphore, ctx, entry);
                }
                tasks.drain(&mut progress, events).await;
            }
            DispatchMode::Chunked => {
                let total_batches = total.div_ceil(self.max_concurrent);
                let mut contexts = contexts.into_iter().peekable();
                let mut batch_num = 0;

                while contexts.peek().is_some() {
                    batch_num += 1;
                    let batch_start = (batch_num - 1) * self.max_concurrent;
                    let batch: Vec<_> = contexts.by_ref().take(self.max_concurrent).collect();
                    log_batch_start(
                        batch_num,
                        total_batches,
                        batch_start + 1,
                        batch_start + batch.len(),
                        total,
                    );

                    // 本批全部完成后再开始下一批
                    let batch_len = batch.len();
                    let mut tasks = DocumentTasks::default();
                    for (ctx, entry) in batch {
                        self.spawn_document(&mut tasks, &semaphore, ctx, entry);
                    }
                    let failed = tasks.drain(&mut progress, events).await;

                    log_batch_complete(batch_num, failed, batch_len);
                }
            }
        }

        progress.into_results()
    }

    /// 为一个文档创建任务，任务内部等待空闲槽位
    fn spawn_document(
        &self,
        tasks: &mut DocumentTasks,
        semaphore: &Arc<Semaphore>,
        ctx: DocumentCtx,
        entry: ArchiveEntry,
    ) {
        let flow = self.flow.clone();
        let semaphore = semaphore.clone();
        let filename = ctx.filename.clone();

        let handle = tasks.set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            match entry {
                ArchiveEntry::Ready(doc) => flow.run(&ctx, doc.bytes).await,
                ArchiveEntry::Unreadable { filename, error } => {
                    warn!("{} ⚠️ 条目无法读取: {}", ctx, error);
                    DocumentResult::failed(filename, error)
                }
            }
        });
        tasks.names.insert(handle.id(), filename);
    }

    /// 写出报告，失败只记录日志
    async fn write_report(&self, summary: &BatchSummary) -> Option<String> {
        match self.report_writer.write(summary, self.clock.now()).await {
            Ok(filename) => {
                info!("📝 报告已生成: {}", filename);
                Some(filename)
            }
            Err(e) => {
                error!(
                    "❌ 报告写入失败 ({}): {}",
                    self.report_writer.report_dir().display(),
                    e
                );
                None
            }
        }
    }
}

/// 在阻塞线程池中解包
async fn unpack_blocking(archive: Vec<u8>) -> AppResult<UnpackedArchive> {
    tokio::task::spawn_blocking(move || archive::unpack(&archive))
        .await
        .map_err(|e| PipelineError::Format(format!("falha ao descompactar: {}", e)))?
}

/// 事件发送端，接收方关闭后静默丢弃
struct EventSink {
    tx: UnboundedSender<BatchEvent>,
}

impl EventSink {
    fn emit(&self, event: BatchEvent) {
        if self.tx.unbounded_send(event).is_err() {
            debug!("事件接收方已关闭，丢弃事件");
        }
    }
}

/// 正在运行的文档任务
#[derive(Default)]
struct DocumentTasks {
    set: JoinSet<DocumentResult>,
    /// 任务 ID -> 文件名，任务 panic 时用来生成错误结果
    names: HashMap<TaskId, String>,
}

impl DocumentTasks {
    /// 按完成顺序收集结果，返回失败数量
    async fn drain(&mut self, progress: &mut Progress, events: &EventSink) -> usize {
        let mut failed = 0;

        while let Some(joined) = self.set.join_next_with_id().await {
            let result = match joined {
                Ok((id, result)) => {
                    self.names.remove(&id);
                    result
                }
                Err(e) => {
                    let filename = self.names.remove(&e.id()).unwrap_or_default();
                    error!("[文档 {}] 任务执行失败: {}", filename, e);
                    DocumentResult::failed(
                        filename,
                        format!("Erro interno ao processar documento: {}", e),
                    )
                }
            };

            if result.is_failed() {
                failed += 1;
            }
            progress.record(result, events);
        }

        failed
    }
}

/// 进度统计
struct Progress {
    total: usize,
    results: Vec<DocumentResult>,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            results: Vec::with_capacity(total),
        }
    }

    fn record(&mut self, result: DocumentResult, events: &EventSink) {
        let processed = self.results.len() + 1;
        let current_file = result.filename().to_string();
        info!("📊 进度 {}/{}: {}", processed, self.total, current_file);

        events.emit(BatchEvent::Progress {
            processed,
            total: self.total,
            message: format!("Processado {}/{}: {}", processed, self.total, current_file),
            current_file,
        });
        self.results.push(result);
    }

    fn into_results(self) -> Vec<DocumentResult> {
        self.results
    }
}
