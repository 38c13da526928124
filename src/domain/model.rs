use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

/// 試算表儲存格的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::Bool(_) => false,
        }
    }

    /// 轉為去頭尾空白的文字；空白儲存格回傳 None
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => return None,
            CellValue::Text(text) => text.trim().to_string(),
            CellValue::Number(n) => format_number(*n)?,
            CellValue::Bool(b) => b.to_string(),
        };

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// 整數值不帶小數點 (2001 而非 2001.0)
fn format_number(n: f64) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some((n as i64).to_string())
    } else {
        Some(n.to_string())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// 試算表中的一列，以欄位標題 (原樣，不去空白) 為鍵
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalRow {
    /// 來源工作表中的列號 (標題列為第 1 列)
    pub row_number: usize,
    pub cells: HashMap<String, CellValue>,
}

impl ExternalRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: HashMap::new(),
        }
    }

    pub fn with_cell(mut self, label: &str, value: impl Into<CellValue>) -> Self {
        self.insert(label, value);
        self
    }

    pub fn insert(&mut self, label: &str, value: impl Into<CellValue>) {
        self.cells.insert(label.to_string(), value.into());
    }

    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.cells.get(label)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreferredFoot {
    Destro,
    Sinistro,
    Ambidestro,
}

impl PreferredFoot {
    /// 依等價表正規化；無法辨識的值回傳 None
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Dx" | "Destro" => Some(PreferredFoot::Destro),
            "Sx" | "Sinistro" => Some(PreferredFoot::Sinistro),
            "Entrambi" | "Ambidestro" => Some(PreferredFoot::Ambidestro),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredFoot::Destro => "Destro",
            PreferredFoot::Sinistro => "Sinistro",
            PreferredFoot::Ambidestro => "Ambidestro",
        }
    }
}

impl fmt::Display for PreferredFoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 欄位映射後的部分球員資料，尚未檢查必填欄位
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerDraft {
    pub name: Option<String>,
    pub birth_year: Option<i32>,
    pub team: Option<String>,
    pub nationality: Option<String>,
    pub general_role: Option<String>,
    pub specific_position: Option<String>,
    pub functions_labels: Option<String>,
    pub preferred_foot: Option<PreferredFoot>,
    pub athleticism: Option<String>,
    pub athletic_evaluation: Option<i32>,
    pub key_characteristics: Option<String>,
    pub potential_value: Option<i32>,
    pub current_value: Option<i32>,
    pub data_potential_value: Option<i32>,
    pub notes: Option<String>,
    pub transfermarket_link: Option<String>,
    pub director_feedback: Option<String>,
    pub check_type: Option<String>,
    pub outcome: Option<String>,
}

impl PlayerDraft {
    /// 名稱缺少或為空白時回傳 None
    pub fn into_record(mut self) -> Option<PlayerRecord> {
        let name = self.name.take()?.trim().to_string();
        if name.is_empty() {
            return None;
        }
        self.name = Some(name);
        Some(self.into_record_unchecked())
    }

    fn into_record_unchecked(self) -> PlayerRecord {
        PlayerRecord {
            name: self.name.unwrap_or_default(),
            birth_year: self.birth_year,
            team: self.team,
            nationality: self.nationality,
            general_role: self.general_role,
            specific_position: self.specific_position,
            functions_labels: self.functions_labels,
            preferred_foot: self.preferred_foot,
            athleticism: self.athleticism,
            athletic_evaluation: self.athletic_evaluation,
            key_characteristics: self.key_characteristics,
            potential_value: self.potential_value,
            current_value: self.current_value,
            data_potential_value: self.data_potential_value,
            notes: self.notes,
            transfermarket_link: self.transfermarket_link,
            director_feedback: self.director_feedback,
            check_type: self.check_type,
            outcome: self.outcome,
            created_by: None,
            updated_by: None,
        }
    }
}

/// 寫入儲存端的標準球員資料。缺少的選填欄位不會序列化；
/// `created_by` / `updated_by` 一律輸出 (匯入時為 null)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions_labels: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_foot: Option<PreferredFoot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athleticism: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athletic_evaluation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_characteristics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_potential_value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfermarket_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl PlayerRecord {
    pub fn new(name: &str) -> Self {
        PlayerDraft {
            name: Some(name.trim().to_string()),
            ..Default::default()
        }
        .into_record_unchecked()
    }
}

/// 儲存端回傳的球員 (含主鍵與時間戳)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlayer {
    pub id: String,
    #[serde(flatten)]
    pub record: PlayerRecord,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// 查詢條件：search_term 比對 name 或 team (不分大小寫)，role 比對 general_role
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerFilter {
    pub search_term: Option<String>,
    pub role: Option<String>,
}

/// 欲更新的欄位 (欄位名 -> 新值)
pub type PlayerPatch = serde_json::Map<String, serde_json::Value>;

/// 儲存端變更通知
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerChange {
    Inserted { records: Vec<PlayerRecord> },
    Updated { player: StoredPlayer },
    Deleted { id: String },
}

/// 某欄位有值但無法轉換 (例如數字欄位內容為文字)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub row_number: usize,
    pub column: String,
    pub raw_value: String,
    pub reason: String,
}

/// 同一份試算表中疑似重複的球員
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateWarning {
    pub row_number: usize,
    pub first_seen_row: usize,
    pub key: String,
}

/// 正規化階段的輸出
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub rows_read: usize,
    pub records: Vec<PlayerRecord>,
    /// 與 `records` 一一對應的來源列號
    pub source_rows: Vec<usize>,
    /// 因缺少名稱而略過的來源列號
    pub skipped_rows: Vec<usize>,
    pub issues: Vec<FieldIssue>,
    pub duplicates: Vec<DuplicateWarning>,
}

impl NormalizedBatch {
    pub fn skipped(&self) -> usize {
        self.skipped_rows.len()
    }
}

/// 單一批次的寫入結果
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub index: usize,
    /// 批次涵蓋的記錄索引 (從 0 起，不含結尾)
    pub records: Range<usize>,
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// 批次序號 (從 1 起)
    pub batch: usize,
    pub first_record: usize,
    pub last_record: usize,
    pub size: usize,
    pub reason: String,
}

impl From<&BatchOutcome> for BatchFailure {
    fn from(outcome: &BatchOutcome) -> Self {
        Self {
            batch: outcome.index + 1,
            first_record: outcome.records.start + 1,
            last_record: outcome.records.end,
            size: outcome.size(),
            reason: outcome.error.clone().unwrap_or_default(),
        }
    }
}

/// 匯入結果摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub skipped_rows: Vec<usize>,
    pub records_normalized: usize,
    pub malformed_fields: usize,
    pub duplicates: Vec<DuplicateWarning>,
    pub batches: usize,
    pub imported: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
    pub dry_run: bool,
}

impl ImportReport {
    /// 依正規化結果建立尚未寫入的摘要
    pub fn from_batch(batch: &NormalizedBatch) -> Self {
        Self {
            rows_read: batch.rows_read,
            rows_skipped: batch.skipped(),
            skipped_rows: batch.skipped_rows.clone(),
            records_normalized: batch.records.len(),
            malformed_fields: batch.issues.len(),
            duplicates: batch.duplicates.clone(),
            ..Default::default()
        }
    }

    pub fn apply_outcomes(&mut self, outcomes: &[BatchOutcome]) {
        self.batches = outcomes.len();
        self.imported = outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(BatchOutcome::size)
            .sum();
        self.failures = outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(BatchFailure::from)
            .collect();
        self.failed = self.failures.iter().map(|f| f.size).sum();
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
