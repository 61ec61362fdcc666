use age_verification::orchestrator::validate_upload_name;
use age_verification::utils::logging;
use age_verification::{BatchEvent, BatchProcessor, Config};
use anyhow::{bail, Context, Result};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(config.max_concurrent_documents);

    let archive_path = std::env::args()
        .nth(1)
        .context("用法: age-verify <arquivo.zip>")?;
    validate_upload_name(&archive_path)?;

    let archive = tokio::fs::read(&archive_path)
        .await
        .with_context(|| format!("无法读取压缩包: {}", archive_path))?;

    let processor = BatchProcessor::from_config(&config)?;

    // 事件逐行输出到 stdout
    let mut events = processor.run(archive);
    let mut stdout = tokio::io::stdout();
    let mut fatal = None;

    while let Some(event) = events.next().await {
        if let BatchEvent::Error { message, .. } = &event {
            fatal = Some(message.clone());
        }
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
        stdout.flush().await?;
    }

    if let Some(message) = fatal {
        bail!("批次处理失败: {}", message);
    }

    Ok(())
}
