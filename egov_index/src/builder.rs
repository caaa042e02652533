pub use crate::config::*;
use crate::Dataset;

use std::collections::HashSet;

/// A builder for assembling a dataset, one record at a time.
///
/// The builder enforces the invariants of a dataset: a country appears at most once
/// per year, and scores are finite and non-negative.
///
/// ```
/// pub use egov_index::builder::DatasetBuilder;
/// # use egov_index::IndexErrors;
///
/// let mut builder = DatasetBuilder::new();
/// builder.add_record("CZE", "Czech Republic", 2018, Some(0.7084))?;
/// builder.add_record("SVK", "Slovakia", 2018, None)?;
///
/// let dataset = builder.build()?;
/// assert_eq!(dataset.years(), &[2018]);
///
/// # Ok::<(), IndexErrors>(())
/// ```
pub struct DatasetBuilder {
    _records: Vec<IndexRecord>,
    _keys: HashSet<(String, u32)>,
}

impl DatasetBuilder {
    pub fn new() -> DatasetBuilder {
        DatasetBuilder {
            _records: Vec::new(),
            _keys: HashSet::new(),
        }
    }

    /// Adds a record. Fails if the (country, year) pair is already present or
    /// if the score is not a finite, non-negative number.
    pub fn add_record(
        &mut self,
        country_code: &str,
        country_name: &str,
        year: u32,
        score: Option<f64>,
    ) -> Result<(), IndexErrors> {
        self.add_record_2(IndexRecord {
            country_code: country_code.to_string(),
            country_name: country_name.to_string(),
            year,
            score,
        })
    }

    pub fn add_record_2(&mut self, record: IndexRecord) -> Result<(), IndexErrors> {
        if let Some(s) = record.score {
            if !s.is_finite() || s < 0.0 {
                return Err(IndexErrors::InvalidScore {
                    country_code: record.country_code,
                    year: record.year,
                });
            }
        }
        if !self
            ._keys
            .insert((record.country_code.clone(), record.year))
        {
            return Err(IndexErrors::DuplicateRecord {
                country_code: record.country_code,
                year: record.year,
            });
        }
        self._records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self._records.len()
    }

    pub fn is_empty(&self) -> bool {
        self._records.is_empty()
    }

    /// Freezes the records into a dataset. An empty dataset has no selectable
    /// year and is rejected.
    pub fn build(self) -> Result<Dataset, IndexErrors> {
        if self._records.is_empty() {
            return Err(IndexErrors::EmptyDataset);
        }
        Ok(Dataset::from_records(self._records))
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
