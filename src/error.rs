//! 错误类型
//!
//! 按流水线的错误分类组织：
//! - `Format`：压缩包无法打开 / 上传文件扩展名不对，整批失败
//! - `Aborted`：批次已经以错误事件结束，消息就是事件里的原文
//! - `Provider`：OCR 提交、轮询失败，只影响单个文档
//! - `Parse`：出生日期格式错误，只影响 `age_info`
//! - `Storage`：临时存储读写失败，只影响单个文档；删除失败只记录日志
//!
//! 错误信息会直接出现在报告和 `error_files` 中，所以使用葡萄牙语。

use thiserror::Error;

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 压缩包格式错误（整批失败）
    #[error("Arquivo inválido: {0}")]
    Format(String),

    /// 批次以错误事件结束（整批失败）
    #[error("{0}")]
    Aborted(String),

    /// OCR 服务错误
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// 日期解析错误
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// 临时存储错误
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// 是否是整批致命错误
    pub fn is_batch_fatal(&self) -> bool {
        matches!(self, PipelineError::Format(_) | PipelineError::Aborted(_))
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Format(err.to_string())
    }
}

/// OCR 服务错误
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 提交任务失败
    #[error("Erro ao enviar documento para OCR: {0}")]
    SubmitFailed(String),

    /// 查询任务状态失败
    #[error("Erro ao consultar job de OCR {job_id}: {message}")]
    PollFailed { job_id: String, message: String },

    /// 服务端报告任务失败
    #[error("Falha na extração do texto (job {job_id}){}", .reason.as_deref().map(|r| format!(": {}", r)).unwrap_or_default())]
    JobFailed {
        job_id: String,
        reason: Option<String>,
    },

    /// 轮询次数用尽
    #[error("Tempo esgotado aguardando o job de OCR {job_id} após {attempts} tentativas")]
    Timeout { job_id: String, attempts: u32 },
}

/// 出生日期解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// 不是 dd/mm/yyyy 格式
    #[error("Data fora do formato dd/mm/aaaa: '{0}'")]
    Malformed(String),

    /// 格式正确但不是合法日期（如 31/02/2000）
    #[error("Data inexistente no calendário: '{0}'")]
    InvalidDate(String),
}

/// 临时存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Erro no upload para o armazenamento ({key}): {message}")]
    PutFailed { key: String, message: String },

    #[error("Erro ao ler do armazenamento ({key}): {message}")]
    GetFailed { key: String, message: String },

    #[error("Erro ao remover do armazenamento ({key}): {message}")]
    DeleteFailed { key: String, message: String },

    #[error("Objeto não encontrado no armazenamento: {key}")]
    NotFound { key: String },
}

// ========== Result 类型别名 ==========

/// 流水线结果类型
pub type AppResult<T> = Result<T, PipelineError>;
