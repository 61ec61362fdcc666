use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 文档分发方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// 工作池：任一槽位空出就立刻开始下一个文档
    Pool,
    /// 分批：每批完成后再开始下一批
    Chunked,
}

impl DispatchMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pool" => Some(DispatchMode::Pool),
            "chunked" => Some(DispatchMode::Chunked),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 同时处理的文档数量
    pub max_concurrent_documents: usize,
    /// 分发方式
    pub dispatch_mode: DispatchMode,
    // --- OCR 任务轮询 ---
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    // --- OCR 服务配置 ---
    pub ocr_api_base_url: String,
    pub ocr_api_key: Option<String>,
    pub ocr_request_timeout_secs: u64,
    /// 临时文件目录
    pub scratch_dir: String,
    /// 报告输出目录
    pub report_dir: String,
    /// 需要在文本中查找的登记姓名
    pub registered_names: Vec<String>,
    // --- 出生日期合理性检查（默认关闭） ---
    pub dob_max_age_years: Option<u32>,
    pub dob_reject_future: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 5,
            dispatch_mode: DispatchMode::Pool,
            poll_interval_ms: 1000,
            max_poll_attempts: 300,
            ocr_api_base_url: "http://localhost:8080".to_string(),
            ocr_api_key: None,
            ocr_request_timeout_secs: 30,
            scratch_dir: "scratch".to_string(),
            report_dir: "reports".to_string(),
            registered_names: Vec::new(),
            dob_max_age_years: None,
            dob_reject_future: false,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 如果设置了 `AGE_VERIFY_CONFIG` 则先读取文件，然后用环境变量覆盖
    pub fn load() -> Result<Self> {
        let base = match std::env::var("AGE_VERIFY_CONFIG") {
            Ok(path) => Self::from_toml_file(path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        let base = self;
        Self {
            max_concurrent_documents: std::env::var("MAX_CONCURRENT_DOCUMENTS").ok().and_then(|v| v.parse().ok()).filter(|n| *n > 0).unwrap_or(base.max_concurrent_documents),
            dispatch_mode: std::env::var("DISPATCH_MODE").ok().and_then(|v| DispatchMode::parse(&v)).unwrap_or(base.dispatch_mode),
            poll_interval_ms: std::env::var("OCR_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.poll_interval_ms),
            max_poll_attempts: std::env::var("OCR_MAX_POLL_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_poll_attempts),
            ocr_api_base_url: std::env::var("OCR_API_BASE_URL").unwrap_or(base.ocr_api_base_url),
            ocr_api_key: std::env::var("OCR_API_KEY").ok().or(base.ocr_api_key),
            ocr_request_timeout_secs: std::env::var("OCR_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.ocr_request_timeout_secs),
            scratch_dir: std::env::var("SCRATCH_DIR").unwrap_or(base.scratch_dir),
            report_dir: std::env::var("REPORT_DIR").unwrap_or(base.report_dir),
            registered_names: std::env::var("REGISTERED_NAMES").ok().map(|v| parse_name_list(&v)).unwrap_or(base.registered_names),
            dob_max_age_years: std::env::var("DOB_MAX_AGE_YEARS").ok().and_then(|v| v.parse().ok()).or(base.dob_max_age_years),
            dob_reject_future: std::env::var("DOB_REJECT_FUTURE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.dob_reject_future),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
        }
    }
}

/// 逗号分隔的姓名列表
fn parse_name_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
