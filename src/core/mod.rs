pub mod batch_importer;
pub mod dedup;
pub mod etl;
pub mod field_mapper;
pub mod normalizer;
pub mod pipeline;

pub use crate::domain::model::{
    BatchOutcome, ExternalRow, ImportReport, NormalizedBatch, PlayerRecord,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, PlayerStore, Storage};
pub use crate::utils::error::Result;
