use crate::dataset::{RawDataset, assemble};
use crate::error::{PipelineError, Result};
use crate::store::{RawCsvSink, raw_file_name, timestamp};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use specharvest_scanner::{
    CanonicalSchema, CatalogWalker, PageFetcher, ProductSummary, RetryPolicy, SiteLayout,
    SpecificationVector, align, discover_schema,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Options for configuring a harvest run
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Listing URL with a `{page}` placeholder
    pub url_template: String,
    /// Detail pages fetched concurrently
    pub workers: usize,
    pub layout: SiteLayout,
    pub retry: RetryPolicy,
    pub timeout_secs: u64,
    /// Directory that receives the timestamped raw CSV
    pub output_dir: PathBuf,
    pub show_progress_bars: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            url_template: String::new(),
            workers: 8,
            layout: SiteLayout::default(),
            retry: RetryPolicy::default(),
            timeout_secs: 10,
            output_dir: PathBuf::from("."),
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting harvest progress
pub type HarvestProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug)]
pub struct HarvestOutcome {
    pub dataset: RawDataset,
    /// Raw CSV written during the run
    pub raw_path: PathBuf,
    /// Listing pages walked
    pub pages: usize,
}

/// Walk every listing page, align each product against the schema of the
/// first one and stream the records to a timestamped raw CSV.
///
/// Records keep crawl order regardless of `workers`. The raw file is flushed
/// after every listing page, so a listing failure past page 1 leaves the
/// completed pages on disk and is reported as [`PipelineError::Checkpointed`].
pub async fn execute_harvest(
    options: HarvestOptions,
    progress_callback: Option<HarvestProgressCallback>,
) -> Result<HarvestOutcome> {
    let HarvestOptions {
        url_template,
        workers,
        layout,
        retry,
        timeout_secs,
        output_dir,
        show_progress_bars,
    } = options;

    let fetcher = PageFetcher::with_timeout(timeout_secs)?.with_retry_policy(retry);
    let walker = CatalogWalker::new(fetcher, layout.compile()?, &url_template)?;
    let workers = workers.max(1);

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Fetching catalog...");
        Some(Arc::new(pb))
    } else {
        None
    };
    let report = |message: String| {
        if let Some(ref callback) = progress_callback {
            callback(message);
        }
    };

    let listing = walker.first_page().await?;
    let last_page = listing.last_page;
    let mut page_one = listing.products;

    let (schema, mut first_specs) = match page_one.first() {
        Some(first) => discover_from(&walker, first).await,
        None => {
            warn!("Page 1 lists no products; the schema is empty and flagged for review");
            (CanonicalSchema::empty(), None)
        }
    };
    info!("Canonical schema has {} field(s)", schema.len());
    report(format!(
        "Schema discovered: {} field(s), {} page(s) to walk",
        schema.len(),
        last_page
    ));

    let raw_path = output_dir.join(raw_file_name(&timestamp()));
    let mut dataset = RawDataset::new(schema.clone());
    let mut sink = RawCsvSink::create(&raw_path, &dataset.header())?;
    info!("Writing raw dataset to {}", raw_path.display());

    let processed = Arc::new(AtomicUsize::new(0));
    let mut next_index = page_one.len();

    for page in 1..=last_page {
        let (products, mut records) = if page == 1 {
            let mut head = Vec::new();
            if let Some(specs) = first_specs.take() {
                head.push((page_one.remove(0), specs));
                processed.fetch_add(1, Ordering::Relaxed);
            }
            (std::mem::take(&mut page_one), head)
        } else {
            let products = walker
                .fetch_listing(page, next_index)
                .await
                .map_err(|e| checkpointed(&raw_path, page - 1, e.into()))?;
            next_index += products.len();
            (products, Vec::new())
        };

        if let Some(ref pb) = progress_bar {
            pb.set_message(format!("Page {}/{}: {} product(s)", page, last_page, products.len()));
        }

        let schema_ref = &schema;
        let walker_ref = &walker;
        let fetched: Vec<(ProductSummary, SpecificationVector)> = stream::iter(products)
            .map(|product| {
                let processed = processed.clone();
                let pb = progress_bar.clone();
                async move {
                    let specs = walker_ref.align_product(&product, schema_ref).await;
                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(pb) = pb {
                        pb.set_message(format!("Harvesting... {} products processed", count));
                        pb.tick();
                    }
                    (product, specs)
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        records.extend(fetched);
        records.sort_by_key(|(product, _)| product.index);

        for (product, specs) in records {
            let record = assemble(product, specs);
            sink.append(&record)?;
            dataset.push(record)?;
        }
        sink.flush()?;

        report(format!(
            "Page {}/{} done, {} record(s) so far",
            page,
            last_page,
            dataset.len()
        ));
    }

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Harvest complete! {} products from {} page(s)",
            dataset.len(),
            last_page
        ));
    }
    info!(
        "Harvested {} record(s) from {} page(s) into {}",
        dataset.len(),
        last_page,
        raw_path.display()
    );

    Ok(HarvestOutcome {
        dataset,
        raw_path,
        pages: last_page,
    })
}

/// Derive the schema from the first product and align that product from the
/// same page. Any failure leaves the schema empty.
async fn discover_from(
    walker: &CatalogWalker,
    first: &ProductSummary,
) -> (CanonicalSchema, Option<SpecificationVector>) {
    let Some(ref url) = first.detail_url else {
        warn!(
            "'{}' has no detail page; the schema is empty and flagged for review",
            first.title
        );
        return (CanonicalSchema::empty(), Some(Vec::new()));
    };

    match walker.fetch_spec_page(url).await {
        Ok(page) => {
            let schema = discover_schema(&page);
            let specs = align(&page, &schema);
            (schema, Some(specs))
        }
        Err(e) => {
            warn!(
                "Schema page {} unavailable ({}); the schema is empty and flagged for review",
                url, e
            );
            (CanonicalSchema::empty(), Some(Vec::new()))
        }
    }
}

fn checkpointed(path: &std::path::Path, pages: usize, source: PipelineError) -> PipelineError {
    PipelineError::Checkpointed {
        path: path.to_path_buf(),
        pages,
        source: Box::new(source),
    }
}
