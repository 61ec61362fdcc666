//! 集成测试用的假服务
#![allow(dead_code)]

use age_verification::infrastructure::{
    FixedClock, JobPoll, MemoryStore, OcrBlock, OcrProvider, PipelineServices, ScratchStore,
    StorageRef,
};
use age_verification::{Config, ProviderError, StorageError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// 统计 put / delete 次数和同时在处理中的文档数
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

#[async_trait]
impl ScratchStore for CountingStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<StorageRef, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.inner.put(key, bytes).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }
}

/// 一个文件的预设识别结果
#[derive(Clone)]
pub struct FakeJob {
    pub filename: String,
    pub lines: Vec<String>,
    pub delay: Duration,
    pub fail: bool,
    pub panic: bool,
}

impl FakeJob {
    pub fn ok(filename: &str, lines: &[&str], delay_ms: u64) -> Self {
        Self {
            filename: filename.to_string(),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            delay: Duration::from_millis(delay_ms),
            fail: false,
            panic: false,
        }
    }

    pub fn failing(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            lines: Vec::new(),
            delay: Duration::from_millis(1),
            fail: true,
            panic: false,
        }
    }

    /// 轮询时直接 panic
    pub fn panicking(filename: &str) -> Self {
        Self {
            panic: true,
            fail: false,
            ..Self::failing(filename)
        }
    }
}

/// 按存储键的文件名后缀匹配预设结果；job_id 就是存储键
pub struct FakeOcr {
    jobs: Vec<FakeJob>,
    pub submits: AtomicUsize,
}

impl FakeOcr {
    pub fn new(jobs: Vec<FakeJob>) -> Self {
        Self {
            jobs,
            submits: AtomicUsize::new(0),
        }
    }

    fn job_for(&self, key: &str) -> Option<&FakeJob> {
        self.jobs
            .iter()
            .find(|job| key.ends_with(&format!("_{}", job.filename)))
    }
}

#[async_trait]
impl OcrProvider for FakeOcr {
    async fn submit(&self, document: &StorageRef) -> Result<String, ProviderError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(document.key.clone())
    }

    async fn poll(&self, job_id: &str) -> Result<JobPoll, ProviderError> {
        let job = self
            .job_for(job_id)
            .ok_or_else(|| ProviderError::PollFailed {
                job_id: job_id.to_string(),
                message: "job desconhecido".into(),
            })?;

        tokio::time::sleep(job.delay).await;

        if job.panic {
            panic!("OCR fake exploded for {}", job.filename);
        }
        if job.fail {
            Ok(JobPoll::failed(None))
        } else {
            Ok(JobPoll::succeeded(
                job.lines.iter().map(|l| OcrBlock::line(l.clone())).collect(),
            ))
        }
    }
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap(),
    ))
}

pub fn services(store: Arc<CountingStore>, ocr: Arc<FakeOcr>) -> PipelineServices {
    PipelineServices::new(store, ocr, fixed_clock())
}

pub fn test_config() -> Config {
    Config {
        poll_interval_ms: 1,
        max_poll_attempts: 20,
        report_dir: std::env::temp_dir()
            .join(format!("age-verify-it-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned(),
        ..Config::default()
    }
}

/// 在内存中构建 zip（Stored，不压缩）
pub fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub const ADULT_LINES: &[&str] = &["REGISTRO GERAL", "NASCIMENTO 10/05/1990", "EXPEDIÇÃO 01/01/2020"];
pub const MINOR_LINES: &[&str] = &["REGISTRO GERAL", "NASCIMENTO 02/03/2012", "EXPEDIÇÃO 01/01/2022"];
