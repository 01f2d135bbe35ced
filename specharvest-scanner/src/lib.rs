pub mod catalog;
pub mod error;
pub mod fetcher;
pub mod layout;
pub mod result;
pub mod spec;

pub use catalog::{CatalogWalker, ListingPage};
pub use error::ScanError;
pub use fetcher::{PageFetcher, RetryPolicy};
pub use layout::{CompiledLayout, SiteLayout};
pub use result::{ProductSummary, SpecPage, SpecificationVector};
pub use spec::{CanonicalSchema, align, discover_schema, placeholder_vector};
