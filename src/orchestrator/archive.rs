//! 压缩包解包
//!
//! - 打不开 / 不是 zip：整批失败（`PipelineError::Format`）
//! - 扩展名不在白名单：静默忽略
//! - 单个条目读取失败：只影响这个条目

use crate::error::{AppResult, PipelineError};
use crate::models::Document;
use phf::phf_set;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

/// 接受的文档扩展名（小写）
static ACCEPTED_EXTENSIONS: phf::Set<&'static str> = phf_set! {
    "pdf",
    "png",
    "jpg",
    "jpeg",
};

/// 预分配缓冲区的上限，条目头里声明的大小不可信
const MAX_PREALLOC_BYTES: u64 = 16 * 1024 * 1024;

/// 解包得到的条目
#[derive(Debug, Clone)]
pub enum ArchiveEntry {
    Ready(Document),
    /// 条目存在但读取失败
    Unreadable { filename: String, error: String },
}

impl ArchiveEntry {
    pub fn filename(&self) -> &str {
        match self {
            ArchiveEntry::Ready(doc) => &doc.filename,
            ArchiveEntry::Unreadable { filename, .. } => filename,
        }
    }
}

/// 解包结果
#[derive(Debug, Default)]
pub struct UnpackedArchive {
    /// 按压缩包顺序
    pub entries: Vec<ArchiveEntry>,
    /// 被忽略的条目名
    pub ignored: Vec<String>,
}

/// 扩展名是否被接受（不区分大小写）
pub fn is_accepted(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ACCEPTED_EXTENSIONS.contains(ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// 规范化文件名：`[A-Za-z0-9_.-]` 以外的字符替换成 `_`
pub fn normalize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 上传的文件必须是 .zip
pub fn validate_upload_name(name: &str) -> AppResult<()> {
    let is_zip = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    if is_zip {
        Ok(())
    } else {
        Err(PipelineError::Format(format!(
            "o arquivo enviado deve ser .zip: {}",
            name
        )))
    }
}

/// 解包
///
/// # 参数
/// - `bytes`: 压缩包内容
///
/// # 返回
/// 接受的条目（已规范化名称）和被忽略的条目名
pub fn unpack(bytes: &[u8]) -> AppResult<UnpackedArchive> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut unpacked = UnpackedArchive::default();

    for i in 0..archive.len() {
        let raw_name = match archive.name_for_index(i) {
            Some(name) => name.to_string(),
            None => continue,
        };

        // 目录和 macOS 元数据
        if raw_name.ends_with('/') || raw_name.starts_with("__MACOSX") {
            debug!("跳过条目: {}", raw_name);
            continue;
        }

        if !is_accepted(&raw_name) {
            debug!("忽略不支持的文件: {}", raw_name);
            unpacked.ignored.push(raw_name);
            continue;
        }

        let filename = normalize_filename(&raw_name);
        let entry = match read_entry(&mut archive, i) {
            Ok(bytes) => ArchiveEntry::Ready(Document::new(filename, bytes)),
            Err(e) => {
                warn!("⚠️ 读取条目失败 {}: {}", raw_name, e);
                ArchiveEntry::Unreadable {
                    filename,
                    error: format!("Erro ao ler arquivo do pacote: {}", e),
                }
            }
        };
        unpacked.entries.push(entry);
    }

    Ok(unpacked)
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, index: usize) -> zip::result::ZipResult<Vec<u8>> {
    let mut file = archive.by_index(index)?;
    let capacity = file.size().min(MAX_PREALLOC_BYTES) as usize;
    let mut bytes = Vec::with_capacity(capacity);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
