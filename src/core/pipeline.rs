use crate::adapters::spreadsheet::SpreadsheetReader;
use crate::core::batch_importer::BatchImporter;
use crate::core::normalizer::RecordNormalizer;
use crate::core::{ExternalRow, ImportReport, NormalizedBatch, Pipeline, PlayerStore, Storage};
use crate::utils::error::Result;

/// 試算表 -> 欄位映射 -> 正規化 -> 分批寫入
pub struct SpreadsheetPipeline<St: Storage, S: PlayerStore> {
    storage: St,
    store: S,
    source_path: String,
    reader: SpreadsheetReader,
    normalizer: RecordNormalizer,
    batch_size: usize,
}

impl<St: Storage, S: PlayerStore> SpreadsheetPipeline<St, S> {
    pub fn new(storage: St, store: S, source_path: impl Into<String>) -> Self {
        Self {
            storage,
            store,
            source_path: source_path.into(),
            reader: SpreadsheetReader,
            normalizer: RecordNormalizer::default(),
            batch_size: crate::core::batch_importer::DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_normalizer(mut self, normalizer: RecordNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[async_trait::async_trait]
impl<St: Storage, S: PlayerStore> Pipeline for SpreadsheetPipeline<St, S> {
    async fn extract(&self) -> Result<Vec<ExternalRow>> {
        tracing::info!("📂 Reading spreadsheet: {}", self.source_path);

        // 先檢查副檔名，避免讀取不支援的檔案
        let format = SpreadsheetReader::detect_format(&self.source_path)?;
        let data = self.storage.read_file(&self.source_path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), self.source_path);

        let rows = self.reader.parse(&data, format)?;
        tracing::info!("✅ Found {} rows", rows.len());
        Ok(rows)
    }

    async fn transform(&self, rows: Vec<ExternalRow>) -> Result<NormalizedBatch> {
        Ok(self.normalizer.normalize(rows))
    }

    async fn load(&self, batch: NormalizedBatch) -> Result<ImportReport> {
        let mut report = ImportReport::from_batch(&batch);
        let importer = BatchImporter::new(&self.store, self.batch_size)?;

        tracing::info!(
            "🚚 Importing {} players in batches of {}",
            batch.records.len(),
            importer.batch_size()
        );
        let outcomes = importer.import(batch.records).await;
        report.apply_outcomes(&outcomes);

        Ok(report)
    }
}
