use crate::domain::model::{DuplicateWarning, PlayerRecord};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static TRANSFERMARKT_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"spieler/(\d+)").ok());

/// 小寫、去除重音 (NFD 後移除 U+0300..U+036F)、只保留 ASCII 字母數字與空白、合併連續空白
pub fn normalize_text(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 球員識別鍵：`名稱_國籍_出生年`
pub fn player_key(record: &PlayerRecord) -> String {
    let nationality = record.nationality.as_deref().map(normalize_text).unwrap_or_default();
    let birth_year = record.birth_year.map(|y| y.to_string()).unwrap_or_default();
    format!("{}_{}_{}", normalize_text(&record.name), nationality, birth_year)
}

/// 取出 Transfermarkt 連結中的球員編號 (`.../spieler/123456`)
pub fn transfermarkt_id(url: &str) -> Option<&str> {
    let captures = TRANSFERMARKT_ID.as_ref()?.captures(url)?;
    captures.get(1).map(|m| m.as_str())
}

/// 找出同一份資料中重複出現的球員；只回報，不剔除
pub fn find_duplicates(records: &[PlayerRecord], source_rows: &[usize]) -> Vec<DuplicateWarning> {
    let mut seen_keys: HashMap<String, usize> = HashMap::new();
    let mut seen_tm_ids: HashMap<String, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let row_number = source_rows.get(index).copied().unwrap_or(index + 1);
        let key = player_key(record);

        if let Some(&first_seen_row) = seen_keys.get(&key) {
            warnings.push(DuplicateWarning {
                row_number,
                first_seen_row,
                key,
            });
            continue;
        }
        seen_keys.insert(key, row_number);

        let tm_id = record.transfermarket_link.as_deref().and_then(transfermarkt_id);
        if let Some(tm_id) = tm_id {
            let tm_key = format!("transfermarkt:{}", tm_id);
            if let Some(&first_seen_row) = seen_tm_ids.get(&tm_key) {
                warnings.push(DuplicateWarning {
                    row_number,
                    first_seen_row,
                    key: tm_key,
                });
            } else {
                seen_tm_ids.insert(tm_key, row_number);
            }
        }
    }

    warnings
}
