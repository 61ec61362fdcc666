//! OCR 服务 - 基础设施层
//!
//! 基于任务的异步接口：提交任务拿到 job_id，然后轮询直到完成或失败。
//! 只暴露能力，不关心文档、年龄或者批次。

use crate::error::ProviderError;
use crate::infrastructure::scratch_store::StorageRef;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[serde(alias = "IN_PROGRESS")]
    Pending,
    Succeeded,
    Failed,
}

/// 识别块类型，只有 `Line` 会被拼进文本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    #[serde(other)]
    Other,
}

/// 识别块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrBlock {
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub text: String,
}

impl OcrBlock {
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            block_type: BlockType::Line,
            text: text.into(),
        }
    }
}

/// 一次轮询的结果
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobPoll {
    pub status: JobStatus,
    #[serde(default)]
    pub blocks: Vec<OcrBlock>,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl JobPoll {
    pub fn pending() -> Self {
        Self {
            status: JobStatus::Pending,
            blocks: Vec::new(),
            status_message: None,
        }
    }

    pub fn succeeded(blocks: Vec<OcrBlock>) -> Self {
        Self {
            status: JobStatus::Succeeded,
            blocks,
            status_message: None,
        }
    }

    pub fn failed(message: Option<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            blocks: Vec::new(),
            status_message: message,
        }
    }

    /// 按文档顺序用换行拼接所有 LINE 块
    pub fn line_text(&self) -> String {
        self.blocks
            .iter()
            .filter(|block| block.block_type == BlockType::Line)
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// OCR 服务
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// 提交识别任务，返回 job_id
    async fn submit(&self, document: &StorageRef) -> Result<String, ProviderError>;

    /// 查询任务状态
    async fn poll(&self, job_id: &str) -> Result<JobPoll, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

/// HTTP OCR 服务客户端
///
/// - `POST {base}/jobs` 提交任务
/// - `GET {base}/jobs/{job_id}` 查询状态
pub struct HttpOcrProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpOcrProvider {
    /// 创建新的 OCR 客户端
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::SubmitFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl OcrProvider for HttpOcrProvider {
    async fn submit(&self, document: &StorageRef) -> Result<String, ProviderError> {
        let endpoint = format!("{}/jobs", self.base_url);
        debug!("提交 OCR 任务: {} -> {}", document.uri, endpoint);

        let body = json!({
            "document_uri": document.uri,
            "key": document.key,
        });

        let response = self
            .authorized(self.client.post(&endpoint).json(&body))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::SubmitFailed(e.to_string()))?;

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::SubmitFailed(e.to_string()))?;

        Ok(submitted.job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<JobPoll, ProviderError> {
        let endpoint = format!("{}/jobs/{}", self.base_url, job_id);
        let poll_failed = |e: reqwest::Error| ProviderError::PollFailed {
            job_id: job_id.to_string(),
            message: e.to_string(),
        };

        let response = self
            .authorized(self.client.get(&endpoint))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(poll_failed)?;

        response.json::<JobPoll>().await.map_err(poll_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_text_keeps_only_lines_in_order() {
        let poll = JobPoll::succeeded(vec![
            OcrBlock {
                block_type: BlockType::Page,
                text: String::new(),
            },
            OcrBlock::line("REPÚBLICA FEDERATIVA DO BRASIL"),
            OcrBlock {
                block_type: BlockType::Word,
                text: "REPÚBLICA".into(),
            },
            OcrBlock::line("NASCIMENTO 10/05/1990"),
        ]);

        assert_eq!(
            poll.line_text(),
            "REPÚBLICA FEDERATIVA DO BRASIL\nNASCIMENTO 10/05/1990"
        );
    }

    #[test]
    fn test_poll_response_deserialize() {
        let poll: JobPoll = serde_json::from_str(
            r#"{"status":"SUCCEEDED","blocks":[{"type":"LINE","text":"a"},{"type":"KEY_VALUE_SET"}]}"#,
        )
        .unwrap();
        assert_eq!(poll.status, JobStatus::Succeeded);
        assert_eq!(poll.blocks[1].block_type, BlockType::Other);
        assert_eq!(poll.line_text(), "a");

        let pending: JobPoll = serde_json::from_str(r#"{"status":"IN_PROGRESS"}"#).unwrap();
        assert_eq!(pending, JobPoll::pending());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let provider =
            HttpOcrProvider::new("http://ocr.local/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.base_url, "http://ocr.local");
    }
}
