//! 登记姓名查找 - 业务能力层
//!
//! 在 OCR 文本中查找登记过的姓名，返回出现的行号

use std::collections::BTreeMap;

/// 查找登记姓名
///
/// # 参数
/// - `text`: OCR 文本
/// - `registered_names`: 登记的姓名列表
///
/// # 返回
/// 小写姓名 -> 出现的行号（从 1 开始），没出现的姓名不返回
pub fn search_names(text: &str, registered_names: &[String]) -> BTreeMap<String, Vec<usize>> {
    let lines: Vec<String> = text.lines().map(str::to_lowercase).collect();
    let mut results = BTreeMap::new();

    for name in registered_names {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }

        let positions: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.contains(&name))
            .map(|(i, _)| i + 1)
            .collect();

        if !positions.is_empty() {
            results.insert(name, positions);
        }
    }

    results
}
