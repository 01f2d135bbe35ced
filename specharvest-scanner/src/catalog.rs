use crate::error::{Result, ScanError};
use crate::fetcher::PageFetcher;
use crate::layout::CompiledLayout;
use crate::result::{ProductSummary, SpecPage, SpecificationVector};
use crate::spec::{CanonicalSchema, align, parse_spec_page, placeholder_vector};
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Page 1 of the catalog: the page count plus its own tiles.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub last_page: usize,
    pub products: Vec<ProductSummary>,
}

/// Walks a paginated product listing and the detail pages behind it.
#[derive(Debug, Clone)]
pub struct CatalogWalker {
    fetcher: PageFetcher,
    layout: CompiledLayout,
    url_template: String,
}

impl CatalogWalker {
    pub fn new(fetcher: PageFetcher, layout: CompiledLayout, url_template: &str) -> Result<Self> {
        if !url_template.contains(PAGE_PLACEHOLDER) {
            return Err(ScanError::InvalidUrl(format!(
                "listing template '{}' has no {} placeholder",
                url_template, PAGE_PLACEHOLDER
            )));
        }
        Url::parse(&url_template.replace(PAGE_PLACEHOLDER, "1"))
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url_template, e)))?;

        Ok(Self {
            fetcher,
            layout,
            url_template: url_template.to_string(),
        })
    }

    pub fn page_url(&self, page: usize) -> String {
        self.url_template
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// Fetch page 1 once: its pagination control gives the page count and its
    /// tiles are the start of the crawl.
    pub async fn first_page(&self) -> Result<ListingPage> {
        let url = self.page_url(1);
        let body = self.fetcher.fetch(&url).await?;
        let last_page = parse_last_page(&body, &self.layout)?;
        let products = parse_listing(&body, &url, 1, 0, &self.layout);
        info!(
            "Catalog has {} listing page(s); page 1: {} product(s)",
            last_page,
            products.len()
        );
        Ok(ListingPage {
            last_page,
            products,
        })
    }

    /// Fetch listing `page` and return its tiles; `first_index` is the crawl
    /// index assigned to the first tile.
    pub async fn fetch_listing(&self, page: usize, first_index: usize) -> Result<Vec<ProductSummary>> {
        let url = self.page_url(page);
        let body = self.fetcher.fetch(&url).await?;
        let products = parse_listing(&body, &url, page, first_index, &self.layout);
        info!("Page {}: {} product(s)", page, products.len());
        Ok(products)
    }

    /// Fetch and parse the specification page behind a product link.
    ///
    /// With a specification tab configured the product page is fetched first
    /// and the tab is followed; when the tab is missing the fields are read
    /// from the product page itself.
    pub async fn fetch_spec_page(&self, product_url: &str) -> Result<SpecPage> {
        let body = self.fetcher.fetch(product_url).await?;

        if self.layout.spec_tab_item.is_none() {
            return Ok(self.read_spec_page(&body, product_url));
        }

        match find_spec_tab(&body, product_url, &self.layout) {
            Some(spec_url) => {
                let spec_body = self.fetcher.fetch(&spec_url).await?;
                Ok(self.read_spec_page(&spec_body, &spec_url))
            }
            None => {
                warn!(
                    "No specification tab on {}; reading fields from the product page",
                    product_url
                );
                Ok(self.read_spec_page(&body, product_url))
            }
        }
    }

    /// Aligned specification of one product, or all placeholders when its
    /// page cannot be reached. Never fails: the product is recorded either way.
    pub async fn align_product(
        &self,
        product: &ProductSummary,
        schema: &CanonicalSchema,
    ) -> SpecificationVector {
        let Some(ref url) = product.detail_url else {
            warn!("'{}' has no detail page; recording placeholders", product.title);
            return placeholder_vector(schema);
        };

        match self.fetch_spec_page(url).await {
            Ok(page) => align(&page, schema),
            Err(e) => {
                warn!("Specification of '{}' unavailable ({}): {}", product.title, url, e);
                placeholder_vector(schema)
            }
        }
    }

    fn read_spec_page(&self, body: &str, url: &str) -> SpecPage {
        let page = parse_spec_page(body, url, &self.layout);
        debug!("{} exposes {} field(s)", url, page.entries.len());
        page
    }
}

/// Locate the specification tab on a product page and resolve its link.
///
/// Tabs are counted as items, not links: the `spec_tab_index`-th item is
/// chosen first and its first anchor is followed.
pub fn find_spec_tab(html: &str, product_url: &str, layout: &CompiledLayout) -> Option<String> {
    let item_selector = layout.spec_tab_item.as_ref()?;
    let document = Html::parse_document(html);
    let item = document.select(item_selector).nth(layout.spec_tab_index)?;
    item.select(&layout.spec_tab_anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve_url(product_url, href))
}

/// Parse the page count out of a listing page.
pub fn parse_last_page(html: &str, layout: &CompiledLayout) -> Result<usize> {
    let document = Html::parse_document(html);
    let last = document
        .select(&layout.pagination_link)
        .last()
        .ok_or_else(|| ScanError::Pagination("no pagination links on the first page".to_string()))?;

    let text = last.text().collect::<String>();
    let last_page = text
        .trim()
        .parse::<usize>()
        .map_err(|e| ScanError::Pagination(format!("'{}' is not a page number: {}", text.trim(), e)))?;
    if last_page == 0 {
        return Err(ScanError::Pagination(
            "last page is 0; a catalog has at least one page".to_string(),
        ));
    }
    Ok(last_page)
}

/// Extract product tiles from a listing page in document order.
pub fn parse_listing(
    html: &str,
    page_url: &str,
    page: usize,
    first_index: usize,
    layout: &CompiledLayout,
) -> Vec<ProductSummary> {
    let document = Html::parse_document(html);
    let mut products = Vec::new();

    for (offset, tile) in document.select(&layout.product_tile).enumerate() {
        let link = tile.select(&layout.product_link).next();

        let title = match link {
            Some(a) => a.text().collect::<String>().trim().to_string(),
            None => {
                warn!("Tile {} on page {} has no product link", offset, page);
                String::new()
            }
        };

        let detail_url = link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| resolve_url(page_url, href));
        if link.is_some() && detail_url.is_none() {
            warn!("Tile {} on page {} has an unusable product link", offset, page);
        }

        let price = match tile.select(&layout.product_price).next() {
            Some(p) => p.text().collect::<String>().trim().to_string(),
            None => {
                warn!("Tile '{}' on page {} has no price", title, page);
                String::new()
            }
        };

        let mut summary = ProductSummary::new(title, price, detail_url);
        summary.page = page;
        summary.index = first_index + offset;
        products.push(summary);
    }

    products
}

/// Resolve `href` against `base`, dropping fragments and non-navigable schemes.
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut url = base_url.join(href).ok()?;
    url.set_fragment(None);

    Some(url.to_string())
}
