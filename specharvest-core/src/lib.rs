pub mod dataset;
pub mod error;
pub mod harvest;
pub mod normalize;
pub mod report;
pub mod store;

pub use dataset::{RawDataset, RawRecord, assemble};
pub use error::{DatasetError, PipelineError};
pub use harvest::{HarvestOptions, HarvestOutcome, HarvestProgressCallback, execute_harvest};
pub use normalize::{ColumnNormalizer, NormalizedDataset, Value};
pub use report::{HarvestSummary, generate_harvest_report, generate_normalize_report};
pub use store::{OutputFormat, RawCsvSink, RawTable, read_raw_table, write_normalized};
