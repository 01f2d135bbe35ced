use crate::error::DatasetError;
use specharvest_scanner::{CanonicalSchema, ProductSummary, SpecificationVector};

/// One product as scraped: title, listing price and aligned specification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub title: String,
    pub price: String,
    pub specs: SpecificationVector,
}

impl RawRecord {
    pub fn arity(&self) -> usize {
        2 + self.specs.len()
    }

    /// `[title, price] + specs`, in header order.
    pub fn fields(&self) -> Vec<&str> {
        [self.title.as_str(), self.price.as_str()]
            .into_iter()
            .chain(self.specs.iter().map(String::as_str))
            .collect()
    }
}

pub fn assemble(summary: ProductSummary, specs: SpecificationVector) -> RawRecord {
    RawRecord {
        title: summary.title,
        price: summary.price,
        specs,
    }
}

/// Every record of a run, in crawl order, under one canonical schema.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    schema: CanonicalSchema,
    records: Vec<RawRecord>,
}

impl RawDataset {
    pub fn new(schema: CanonicalSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn header(&self) -> Vec<String> {
        self.schema.header()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: RawRecord) -> Result<(), DatasetError> {
        let expected = 2 + self.schema.len();
        if record.arity() != expected {
            return Err(DatasetError::Arity {
                actual: record.arity(),
                expected,
                title: record.title,
            });
        }
        self.records.push(record);
        Ok(())
    }
}
