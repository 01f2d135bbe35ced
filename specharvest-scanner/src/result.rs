use serde::{Deserialize, Serialize};

/// One product tile as it appears on a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub title: String,
    /// Listing price exactly as displayed, currency and separators included.
    pub price: String,
    pub detail_url: Option<String>,
    /// Listing page the tile was found on (1-based).
    pub page: usize,
    /// Position of the product in crawl order across the whole run.
    pub index: usize,
}

impl ProductSummary {
    pub fn new(title: String, price: String, detail_url: Option<String>) -> Self {
        Self {
            title,
            price,
            detail_url,
            page: 0,
            index: 0,
        }
    }
}

/// Label/value pairs exposed by one specification page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecPage {
    pub url: String,
    pub entries: Vec<(String, String)>,
}

impl SpecPage {
    pub fn new(url: String, entries: Vec<(String, String)>) -> Self {
        Self { url, entries }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Field values in canonical schema order; `""` marks a field the page omitted.
pub type SpecificationVector = Vec<String>;
