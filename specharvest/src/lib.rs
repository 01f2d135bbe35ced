// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{expand_path, load_layout, log_file_path, log_level, normalize_file};

// Re-export harvest functionality from specharvest-core
pub use specharvest_core::harvest::{
    HarvestOptions, HarvestOutcome, HarvestProgressCallback, execute_harvest,
};
pub use specharvest_core::report::{HarvestSummary, generate_harvest_report};
