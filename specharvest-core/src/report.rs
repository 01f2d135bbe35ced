// Run summaries printed after a harvest or normalization

use crate::dataset::RawDataset;
use crate::harvest::HarvestOutcome;
use crate::normalize::NormalizedDataset;
use serde::{Deserialize, Serialize};
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFill {
    pub label: String,
    pub filled: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestSummary {
    pub raw_path: String,
    pub pages: usize,
    pub products: usize,
    pub fields: Vec<FieldFill>,
    /// Products whose every specification field is a placeholder
    pub unresolved: Vec<String>,
}

impl HarvestSummary {
    pub fn from_outcome(outcome: &HarvestOutcome) -> Self {
        Self::from_dataset(&outcome.dataset, &outcome.raw_path, outcome.pages)
    }

    pub fn from_dataset(dataset: &RawDataset, raw_path: &Path, pages: usize) -> Self {
        let labels = dataset.schema().labels();
        let fields = labels
            .iter()
            .enumerate()
            .map(|(i, label)| FieldFill {
                label: label.clone(),
                filled: dataset
                    .records()
                    .iter()
                    .filter(|r| !r.specs[i].is_empty())
                    .count(),
            })
            .collect();

        // With an empty schema nothing can be resolved, so nothing is listed.
        let unresolved = if labels.is_empty() {
            Vec::new()
        } else {
            dataset
                .records()
                .iter()
                .filter(|r| r.specs.iter().all(String::is_empty))
                .map(|r| r.title.clone())
                .collect()
        };

        Self {
            raw_path: raw_path.display().to_string(),
            pages,
            products: dataset.len(),
            fields,
            unresolved,
        }
    }
}

pub fn generate_harvest_report(summary: &HarvestSummary) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("HARVEST SUMMARY\n");
    report.push_str(RULE);
    report.push('\n');
    report.push_str(&format!("Raw Data:     {}\n", summary.raw_path));
    report.push_str(&format!("Pages:        {}\n", summary.pages));
    report.push_str(&format!("Products:     {}\n", summary.products));
    report.push_str(&format!("Fields:       {}\n\n", summary.fields.len()));

    if summary.fields.is_empty() {
        report.push_str("  [!] The schema is empty; check the first product's specification page\n\n");
    } else {
        let width = summary.fields.iter().map(|f| f.label.chars().count()).max().unwrap_or(0);
        for field in &summary.fields {
            report.push_str(&format!(
                "  {:<width$}  {}/{}\n",
                field.label,
                field.filled,
                summary.products,
                width = width
            ));
        }
        report.push('\n');
    }

    if !summary.unresolved.is_empty() {
        report.push_str(&format!(
            "Products without specification ({}):\n",
            summary.unresolved.len()
        ));
        for title in &summary.unresolved {
            report.push_str(&format!("  - {}\n", title));
        }
        report.push('\n');
    }

    report.push_str(RULE);
    report
}

pub fn generate_normalize_report(dataset: &NormalizedDataset, input: &Path, output: &Path) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("NORMALIZATION SUMMARY\n");
    report.push_str(RULE);
    report.push('\n');
    report.push_str(&format!("Input:        {}\n", input.display()));
    report.push_str(&format!("Output:       {}\n", output.display()));
    report.push_str(&format!("Rows:         {}\n\n", dataset.len()));

    let width = dataset.columns.iter().map(|c| c.chars().count()).max().unwrap_or(0);
    for (i, column) in dataset.columns.iter().enumerate() {
        let filled = dataset.rows.iter().filter(|row| !row[i].is_null()).count();
        report.push_str(&format!(
            "  {:<width$}  {}/{}\n",
            column,
            filled,
            dataset.len(),
            width = width
        ));
    }
    report.push('\n');
    report.push_str(RULE);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::assemble;
    use specharvest_scanner::{ProductSummary, SpecPage, discover_schema};

    fn dataset() -> RawDataset {
        let schema = discover_schema(&SpecPage::new(
            "seed".to_string(),
            vec![
                ("RAM".to_string(), "8 GB".to_string()),
                ("SSD".to_string(), "256 GB".to_string()),
            ],
        ));
        let mut dataset = RawDataset::new(schema);
        for (title, specs) in [
            ("Air", vec!["8 GB", "256 GB"]),
            ("Pro", vec!["16 GB", ""]),
            ("Ghost", vec!["", ""]),
        ] {
            dataset
                .push(assemble(
                    ProductSummary::new(title.to_string(), "1".to_string(), None),
                    specs.into_iter().map(str::to_string).collect(),
                ))
                .unwrap();
        }
        dataset
    }

    #[test]
    fn test_summary_counts_fill_and_unresolved() {
        let summary = HarvestSummary::from_dataset(&dataset(), Path::new("out/raw.csv"), 2);
        assert_eq!(summary.products, 3);
        assert_eq!(
            summary.fields,
            vec![
                FieldFill { label: "RAM".to_string(), filled: 2 },
                FieldFill { label: "SSD".to_string(), filled: 1 },
            ]
        );
        assert_eq!(summary.unresolved, vec!["Ghost"]);
    }

    #[test]
    fn test_harvest_report_lists_fields() {
        let summary = HarvestSummary::from_dataset(&dataset(), Path::new("out/raw.csv"), 2);
        let report = generate_harvest_report(&summary);
        assert!(report.contains("HARVEST SUMMARY"));
        assert!(report.contains("Products:     3"));
        assert!(report.contains("RAM  2/3"));
        assert!(report.contains("  - Ghost"));
    }

    #[test]
    fn test_empty_schema_is_flagged() {
        let summary = HarvestSummary::from_dataset(&RawDataset::default(), Path::new("raw.csv"), 1);
        assert!(summary.unresolved.is_empty());
        assert!(generate_harvest_report(&summary).contains("schema is empty"));
    }
}
