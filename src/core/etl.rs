use crate::core::{ImportReport, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::{ImportMonitor, ImportPhase};

pub struct ImportEngine<P: Pipeline> {
    pipeline: P,
    monitor: ImportMonitor,
    dry_run: bool,
}

impl<P: Pipeline> ImportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: ImportMonitor::new(monitor_enabled),
            dry_run: false,
        }
    }

    /// 只讀取與正規化，不寫入儲存端
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn monitor(&self) -> &ImportMonitor {
        &self.monitor
    }

    pub async fn run(&self) -> Result<ImportReport> {
        tracing::info!("Starting player import...");
        if self.monitor.is_enabled() {
            tracing::info!("🔍 System monitoring enabled");
        }

        let rows = self.pipeline.extract().await?;
        self.monitor.record(ImportPhase::Extract, rows.len());

        let batch = self.pipeline.transform(rows).await?;
        self.monitor.record(ImportPhase::Transform, batch.records.len());

        let report = if self.dry_run {
            tracing::info!(
                "🔍 DRY RUN - {} players would be imported",
                batch.records.len()
            );
            ImportReport {
                dry_run: true,
                ..ImportReport::from_batch(&batch)
            }
        } else {
            let report = self.pipeline.load(batch).await?;
            self.monitor.record(ImportPhase::Load, report.imported);
            report
        };

        self.monitor.log_summary();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExternalRow, NormalizedBatch, PlayerRecord};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct StubPipeline {
        loaded: AtomicBool,
    }

    #[async_trait::async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<Vec<ExternalRow>> {
            Ok((2..5).map(ExternalRow::new).collect())
        }

        async fn transform(&self, rows: Vec<ExternalRow>) -> Result<NormalizedBatch> {
            Ok(NormalizedBatch {
                rows_read: rows.len(),
                records: vec![PlayerRecord::new("Mario Rossi"), PlayerRecord::new("Luca Verdi")],
                source_rows: vec![2, 4],
                skipped_rows: vec![3],
                ..Default::default()
            })
        }

        async fn load(&self, batch: NormalizedBatch) -> Result<ImportReport> {
            self.loaded.store(true, Ordering::SeqCst);
            let mut report = ImportReport::from_batch(&batch);
            report.imported = batch.records.len();
            Ok(report)
        }
    }

    #[tokio::test]
    async fn test_monitor_counts_each_phase() {
        let engine = ImportEngine::new_with_monitoring(StubPipeline::default(), true);

        let report = engine.run().await.unwrap();

        assert_eq!(report.imported, 2);
        let counts: Vec<_> = engine
            .monitor()
            .phases()
            .iter()
            .map(|p| (p.phase, p.items))
            .collect();
        assert_eq!(
            counts,
            vec![
                (ImportPhase::Extract, 3),
                (ImportPhase::Transform, 2),
                (ImportPhase::Load, 2)
            ]
        );
    }

    #[tokio::test]
    async fn test_dry_run_skips_load() {
        let engine = ImportEngine::new(StubPipeline::default()).with_dry_run(true);

        let report = engine.run().await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.records_normalized, 2);
        assert_eq!(report.rows_skipped, 1);
        assert!(!engine.pipeline.loaded.load(Ordering::SeqCst));
        assert!(engine.monitor().phases().is_empty());
    }
}
