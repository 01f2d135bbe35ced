use crate::error::{Result, ScanError};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// CSS selectors describing where the target site keeps its catalog data.
///
/// The defaults match the retail site the harvester was written against.
/// Any subset can be overridden from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    /// Pagination links on a listing page; the text of the last one is the page count.
    pub pagination_link: String,
    pub product_tile: String,
    /// Link inside a tile; its href is the detail page and its text the title.
    pub product_link: String,
    pub product_price: String,
    /// Tab items on the product page; the `spec_tab_index`-th one leads to
    /// the specification page. `None` when the product page carries the
    /// specification itself.
    pub spec_tab_item: Option<String>,
    /// Link inside the chosen tab item; the first match is followed.
    pub spec_tab_anchor: String,
    pub spec_tab_index: usize,
    pub spec_section: String,
    pub spec_label: String,
    pub spec_value: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            pagination_link: "a.pagination__link".to_string(),
            product_tile: "li.catalog-grid__cell".to_string(),
            product_link: "a.goods-tile__heading".to_string(),
            product_price: "span.goods-tile__price-value".to_string(),
            spec_tab_item: Some("li.tabs__item".to_string()),
            spec_tab_anchor: "a".to_string(),
            spec_tab_index: 1,
            spec_section: "section.group".to_string(),
            spec_label: "dt.label".to_string(),
            spec_value: "dd.value".to_string(),
        }
    }
}

impl SiteLayout {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn compile(&self) -> Result<CompiledLayout> {
        Ok(CompiledLayout {
            pagination_link: parse_selector(&self.pagination_link)?,
            product_tile: parse_selector(&self.product_tile)?,
            product_link: parse_selector(&self.product_link)?,
            product_price: parse_selector(&self.product_price)?,
            spec_tab_item: self
                .spec_tab_item
                .as_deref()
                .map(parse_selector)
                .transpose()?,
            spec_tab_anchor: parse_selector(&self.spec_tab_anchor)?,
            spec_tab_index: self.spec_tab_index,
            spec_section: parse_selector(&self.spec_section)?,
            spec_label: parse_selector(&self.spec_label)?,
            spec_value: parse_selector(&self.spec_value)?,
        })
    }
}

/// A [`SiteLayout`] with every selector parsed, ready for document queries.
#[derive(Debug, Clone)]
pub struct CompiledLayout {
    pub pagination_link: Selector,
    pub product_tile: Selector,
    pub product_link: Selector,
    pub product_price: Selector,
    pub spec_tab_item: Option<Selector>,
    pub spec_tab_anchor: Selector,
    pub spec_tab_index: usize,
    pub spec_section: Selector,
    pub spec_label: Selector,
    pub spec_value: Selector,
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScanError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
