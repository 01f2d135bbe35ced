//! Schema discovery and specification alignment.
//!
//! The first product of a run defines the [`CanonicalSchema`]; every other
//! product's [`SpecPage`] is aligned against it so that each record carries one
//! value slot per canonical field, in canonical order.

use crate::layout::CompiledLayout;
use crate::result::{SpecPage, SpecificationVector};
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Header cells that precede the schema fields in every raw record.
pub const RECORD_PREFIX: [&str; 2] = ["Name", "Price"];

/// Ordered field labels fixed for the lifetime of one run.
///
/// Only [`discover_schema`] creates a non-empty schema and there is no way to
/// mutate one afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalSchema {
    labels: Vec<String>,
}

impl CanonicalSchema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// `["Name", "Price"]` followed by the schema labels.
    pub fn header(&self) -> Vec<String> {
        RECORD_PREFIX
            .iter()
            .map(|s| s.to_string())
            .chain(self.labels.iter().cloned())
            .collect()
    }
}

/// Freeze the labels of the first product's specification page as the run schema.
pub fn discover_schema(page: &SpecPage) -> CanonicalSchema {
    let mut seen = HashSet::new();
    let labels: Vec<String> = page
        .labels()
        .filter(|label| seen.insert(label.to_string()))
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        warn!(
            "Schema discovery on {} found no specification fields; continuing with an empty schema",
            page.url
        );
    } else {
        debug!("Discovered {} schema fields from {}", labels.len(), page.url);
    }

    CanonicalSchema { labels }
}

/// Align one product's specification page to `schema`.
///
/// Labels are expected to be an order-preserving subsequence of the schema.
/// Absent fields get an empty placeholder: the canonical indices of missing
/// labels are collected in ascending order and a placeholder is inserted at
/// each of them, low to high, into the list of present values.
pub fn align(page: &SpecPage, schema: &CanonicalSchema) -> SpecificationVector {
    let mut present_labels: Vec<&str> = Vec::with_capacity(page.entries.len());
    let mut values: Vec<String> = Vec::with_capacity(schema.len());

    for (label, value) in &page.entries {
        if !schema.contains(label) {
            debug!("Ignoring field '{}' on {}: not in schema", label, page.url);
            continue;
        }
        if present_labels.contains(&label.as_str()) {
            debug!("Ignoring repeated field '{}' on {}", label, page.url);
            continue;
        }
        present_labels.push(label);
        values.push(value.clone());
    }

    let missing: Vec<usize> = schema
        .labels()
        .iter()
        .enumerate()
        .filter(|(_, label)| !present_labels.contains(&label.as_str()))
        .map(|(idx, _)| idx)
        .collect();

    for idx in missing {
        values.insert(idx, String::new());
    }

    values
}

/// Vector used when a product's specification could not be retrieved.
pub fn placeholder_vector(schema: &CanonicalSchema) -> SpecificationVector {
    vec![String::new(); schema.len()]
}

/// Extract the ordered label/value pairs from a specification page body.
pub fn parse_spec_page(html: &str, url: &str, layout: &CompiledLayout) -> SpecPage {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for section in document.select(&layout.spec_section) {
        let Some(label) = first_text(section, &layout.spec_label) else {
            warn!("Specification section without a label on {}", url);
            continue;
        };
        let value = first_text(section, &layout.spec_value).unwrap_or_else(|| {
            warn!("Field '{}' has no value on {}", label, url);
            String::new()
        });
        entries.push((label, value));
    }

    SpecPage::new(url.to_string(), entries)
}

fn first_text(element: ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}
