use crate::domain::model::{BatchOutcome, PlayerRecord};
use crate::domain::ports::PlayerStore;
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// 依序分批寫入儲存端。失敗的批次只記錄，不中斷後續批次，也不自動重試。
pub struct BatchImporter<'a, S: PlayerStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
}

impl<'a, S: PlayerStore + ?Sized> BatchImporter<'a, S> {
    pub fn new(store: &'a S, batch_size: usize) -> Result<Self> {
        validate_positive_number("import.batch_size", batch_size, 1)?;
        Ok(Self { store, batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub async fn import(&self, records: Vec<PlayerRecord>) -> Vec<BatchOutcome> {
        let total = records.len();
        let mut imported = 0;
        let mut outcomes = Vec::with_capacity(total.div_ceil(self.batch_size));

        for (index, chunk) in records.chunks(self.batch_size).enumerate() {
            let start = index * self.batch_size;
            let end = start + chunk.len();

            // 逐批等待，保持來源順序
            let error = match self.store.insert_many(chunk).await {
                Ok(()) => {
                    imported += chunk.len();
                    tracing::info!("✅ Imported {}/{} players (batch {})", imported, total, index + 1);
                    None
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Batch {} (records {}-{}) failed: {}",
                        index + 1,
                        start + 1,
                        end,
                        e
                    );
                    Some(e.to_string())
                }
            };

            outcomes.push(BatchOutcome {
                index,
                records: start..end,
                error,
            });
        }

        tracing::info!("🎉 Import finished: {} of {} players imported", imported, total);
        outcomes
    }
}
