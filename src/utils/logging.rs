/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use chrono::NaiveDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 日志写到 stderr，stdout 只输出 NDJSON 事件
///
/// # 参数
/// - `verbose`: 未设置 `RUST_LOG` 时是否使用 debug 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能重复初始化，忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_concurrent`: 最大并发数
pub fn log_startup(max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量证件年龄核验模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录文档加载信息
///
/// # 参数
/// - `total`: 待处理文档数
/// - `ignored`: 被忽略的条目数
/// - `max_concurrent`: 最大并发数
pub fn log_documents_loaded(total: usize, ignored: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个待处理的文档 (忽略 {} 个条目)", total, ignored);
    info!("📋 最多同时处理 {} 个", max_concurrent);
}

/// 记录批次开始信息
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批文档: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, failed: usize, total: usize) {
    info!("{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 成功 {}/{}",
        batch_num,
        total - failed,
        total
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `underage`: 未成年数量
/// - `adult`: 成年数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `report_filename`: 报告文件名（如果生成了）
/// - `finished_at`: 完成时间
pub fn print_final_stats(
    underage: usize,
    adult: usize,
    failed: usize,
    total: usize,
    report_filename: Option<&str>,
    finished_at: NaiveDateTime,
) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", finished_at.format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("📄 文档总数: {}", total);
    info!("🧒 未成年: {}", underage);
    info!("✅ 成年: {}", adult);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    if let Some(name) = report_filename {
        info!("报告已保存至: {}", name);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("RG nº 12345", 5), "RG nº...");
    }
}
