use crate::core::dedup;
use crate::core::field_mapper::FieldMapper;
use crate::domain::model::{ExternalRow, NormalizedBatch};

/// 將試算表列轉為可寫入的球員資料；缺少名稱的列會被略過並計數
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    mapper: FieldMapper,
}

impl RecordNormalizer {
    pub fn new(mapper: FieldMapper) -> Self {
        Self { mapper }
    }

    pub fn normalize(&self, rows: Vec<ExternalRow>) -> NormalizedBatch {
        let mut batch = NormalizedBatch {
            rows_read: rows.len(),
            ..Default::default()
        };

        for row in &rows {
            let (draft, issues) = self.mapper.map_row_with_issues(row);
            batch.issues.extend(issues);

            match draft.into_record() {
                Some(record) => {
                    batch.records.push(record);
                    batch.source_rows.push(row.row_number);
                }
                None => {
                    tracing::debug!("Skipping row {}: missing player name", row.row_number);
                    batch.skipped_rows.push(row.row_number);
                }
            }
        }

        batch.duplicates = dedup::find_duplicates(&batch.records, &batch.source_rows);

        tracing::info!(
            "📝 Normalized {} of {} rows ({} skipped for missing name, {} malformed fields)",
            batch.records.len(),
            batch.rows_read,
            batch.skipped(),
            batch.issues.len()
        );
        for warning in &batch.duplicates {
            tracing::warn!(
                "⚠️ Row {} looks like a duplicate of row {} ({})",
                warning.row_number,
                warning.first_seen_row,
                warning.key
            );
        }

        batch
    }
}
