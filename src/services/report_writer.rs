//! 报告写入服务 - 业务能力层
//!
//! 只负责"生成并写出核验报告"能力，不关心流程

use crate::models::BatchSummary;
use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const TITLE: &str = "RELATÓRIO DE VERIFICAÇÃO DE IDADE";

/// 报告写入服务
///
/// 职责：
/// - 把批次汇总渲染成纯文本报告
/// - 写入报告目录，返回文件名
/// - 不决定是否需要报告
pub struct ReportWriter {
    report_dir: PathBuf,
}

impl ReportWriter {
    /// 使用报告目录创建
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// 写入报告
    ///
    /// # 参数
    /// - `summary`: 批次汇总
    /// - `now`: 用于生成文件名的时间
    ///
    /// # 返回
    /// 报告文件名（不含目录）
    pub async fn write(
        &self,
        summary: &BatchSummary,
        now: NaiveDateTime,
    ) -> std::io::Result<String> {
        let filename = report_filename(now);
        let content = render_report(summary);

        debug!(
            "写入报告: {} | 未成年 {} | 错误 {}",
            filename,
            summary.underage_list.len(),
            summary.error_files.len()
        );

        fs::create_dir_all(&self.report_dir).await?;
        fs::write(self.report_dir.join(&filename), content).await?;

        Ok(filename)
    }
}

/// 报告文件名：relatorio_verificacao_YYYYMMDD_HHMMSS.txt
pub fn report_filename(now: NaiveDateTime) -> String {
    format!("relatorio_verificacao_{}.txt", now.format("%Y%m%d_%H%M%S"))
}

/// 渲染报告文本，空的部分不输出
pub fn render_report(summary: &BatchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TITLE);
    let _ = writeln!(out, "{}", "=".repeat(50));
    out.push('\n');

    if !summary.underage_list.is_empty() {
        let _ = writeln!(out, "MENORES DE IDADE ENCONTRADOS:");
        let _ = writeln!(out, "{}", "-".repeat(30));
        for entry in &summary.underage_list {
            let _ = writeln!(out, "Nome: {}", entry.name);
            let _ = writeln!(out, "Idade: {}", entry.age);
            let _ = writeln!(out, "Data de Nascimento: {}", entry.date_of_birth);
            let _ = writeln!(out, "Arquivo: {}", entry.filename);
            out.push('\n');
        }
    }

    if !summary.error_files.is_empty() {
        let _ = writeln!(out, "ARQUIVOS COM ERRO:");
        let _ = writeln!(out, "{}", "-".repeat(30));
        for entry in &summary.error_files {
            let _ = writeln!(out, "Arquivo: {}", entry.filename);
            let _ = writeln!(out, "Erro: {}", entry.error);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorEntry, UnderageEntry};
    use chrono::NaiveDate;

    fn summary() -> BatchSummary {
        BatchSummary {
            total_processed: 3,
            underage_count: 1,
            adult_count: 1,
            error_count: 1,
            underage_list: vec![UnderageEntry {
                name: "maria".into(),
                age: 16,
                date_of_birth: "02/03/2009".into(),
                filename: "rg_maria.png".into(),
            }],
            error_files: vec![ErrorEntry {
                filename: "cnh.pdf".into(),
                error: "Falha na extração do texto".into(),
            }],
        }
    }

    #[test]
    fn test_render_full_report() {
        let expected = "\
RELATÓRIO DE VERIFICAÇÃO DE IDADE
==================================================

MENORES DE IDADE ENCONTRADOS:
------------------------------
Nome: maria
Idade: 16
Data de Nascimento: 02/03/2009
Arquivo: rg_maria.png

ARQUIVOS COM ERRO:
------------------------------
Arquivo: cnh.pdf
Erro: Falha na extração do texto

";
        assert_eq!(render_report(&summary()), expected);
    }

    #[test]
    fn test_render_skips_empty_sections() {
        let mut only_errors = summary();
        only_errors.underage_list.clear();
        let text = render_report(&only_errors);
        assert!(!text.contains("MENORES DE IDADE"));
        assert!(text.contains("ARQUIVOS COM ERRO:"));
    }

    #[test]
    fn test_report_filename_pattern() {
        let now = NaiveDate::from_ymd_opt(2025, 1, 9)
            .unwrap()
            .and_hms_opt(8, 5, 3)
            .unwrap();
        assert_eq!(
            report_filename(now),
            "relatorio_verificacao_20250109_080503.txt"
        );
    }

    #[tokio::test]
    async fn test_write_creates_file() {
        let dir = std::env::temp_dir().join(format!("age-verify-report-{}", uuid::Uuid::new_v4()));
        let writer = ReportWriter::new(&dir);
        let now = NaiveDate::from_ymd_opt(2025, 1, 9)
            .unwrap()
            .and_hms_opt(8, 5, 3)
            .unwrap();

        let filename = writer.write(&summary(), now).await.unwrap();
        let content = std::fs::read_to_string(dir.join(&filename)).unwrap();
        assert!(content.starts_with("RELATÓRIO DE VERIFICAÇÃO DE IDADE\n"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
