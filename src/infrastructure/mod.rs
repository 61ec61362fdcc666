//! 基础设施层（Infrastructure）
//!
//! 持有外部资源（临时存储、OCR 服务、时钟），只暴露能力。
//! 由调用方显式构造后注入，测试时可以换成假实现。

pub mod clock;
pub mod ocr_provider;
pub mod scratch_store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ocr_provider::{BlockType, HttpOcrProvider, JobPoll, JobStatus, OcrBlock, OcrProvider};
pub use scratch_store::{LocalDirStore, MemoryStore, ScratchStore, StorageRef};

use std::sync::Arc;

/// 流水线依赖的外部服务
#[derive(Clone)]
pub struct PipelineServices {
    pub store: Arc<dyn ScratchStore>,
    pub ocr: Arc<dyn OcrProvider>,
    pub clock: Arc<dyn Clock>,
}

impl PipelineServices {
    pub fn new(
        store: Arc<dyn ScratchStore>,
        ocr: Arc<dyn OcrProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, ocr, clock }
    }
}
