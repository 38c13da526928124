use crate::domain::model::{
    ExternalRow, ImportReport, NormalizedBatch, PlayerChange, PlayerFilter, PlayerPatch,
    PlayerRecord, StoredPlayer,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn store_url(&self) -> &str;
    fn store_key(&self) -> &str;
    fn table(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn batch_size(&self) -> usize;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ExternalRow>>;
    async fn transform(&self, rows: Vec<ExternalRow>) -> Result<NormalizedBatch>;
    async fn load(&self, batch: NormalizedBatch) -> Result<ImportReport>;
}

/// 球員資料儲存端 (持久化、查詢與變更通知)
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn insert_many(&self, records: &[PlayerRecord]) -> Result<()>;
    async fn select_all(&self, filter: &PlayerFilter) -> Result<Vec<StoredPlayer>>;
    async fn update(&self, id: &str, patch: PlayerPatch) -> Result<StoredPlayer>;
    async fn delete(&self, id: &str) -> Result<()>;
    fn subscribe(&self) -> broadcast::Receiver<PlayerChange>;
}

#[async_trait]
impl<T: PlayerStore + ?Sized> PlayerStore for Arc<T> {
    async fn insert_many(&self, records: &[PlayerRecord]) -> Result<()> {
        (**self).insert_many(records).await
    }

    async fn select_all(&self, filter: &PlayerFilter) -> Result<Vec<StoredPlayer>> {
        (**self).select_all(filter).await
    }

    async fn update(&self, id: &str, patch: PlayerPatch) -> Result<StoredPlayer> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id).await
    }

    fn subscribe(&self) -> broadcast::Receiver<PlayerChange> {
        (**self).subscribe()
    }
}
