use super::validator::DataValidator;
use crate::error::{Result, SearchmiError};
use polars::prelude::*;

/// Search input handed over by preprocessing: a presence/absence matrix
/// (samples x features) and the group label of every sample.
///
/// Abundances are binarised on construction (`> 0` is present), so every
/// cost is computed over richness and never over raw abundance.
#[derive(Debug, Clone)]
pub struct SearchData {
    feature_names: Vec<String>,
    /// Row-major presence flags, `num_samples * num_features`.
    presence: Vec<u8>,
    labels: Vec<String>,
}

impl SearchData {
    pub fn new(feature_names: Vec<String>, rows: Vec<Vec<f64>>, labels: Vec<String>) -> Result<Self> {
        DataValidator::validate_shape(feature_names.len(), rows.len(), labels.len())?;

        let width = feature_names.len();
        let mut presence = Vec::with_capacity(rows.len() * width);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SearchmiError::Data(format!(
                    "sample {} has {} values, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            presence.extend(row.iter().map(|&v| (v > 0.0) as u8));
        }

        DataValidator::validate_categories(&labels)?;

        Ok(Self {
            feature_names,
            presence,
            labels,
        })
    }

    /// Build from a numeric abundance frame and a row-aligned metadata frame
    /// holding `group_column`.
    pub fn from_frames(abundance: &DataFrame, metadata: &DataFrame, group_column: &str) -> Result<Self> {
        DataValidator::validate_shape(abundance.width(), abundance.height(), metadata.height())?;
        DataValidator::validate_numeric(abundance)?;

        let null_report = DataValidator::check_nulls(abundance)?;
        if !null_report.is_empty() {
            log::warn!("Null abundances treated as absent: {:?}", null_report);
        }

        let feature_names: Vec<String> = abundance
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let height = abundance.height();
        let width = feature_names.len();
        let mut presence = vec![0u8; height * width];
        for (j, name) in feature_names.iter().enumerate() {
            let column = abundance.column(name)?.cast(&DataType::Float64)?;
            for (i, value) in column.f64()?.into_iter().enumerate() {
                if value.is_some_and(|v| v > 0.0) {
                    presence[i * width + j] = 1;
                }
            }
        }

        let labels = Self::read_labels(metadata, group_column)?;
        DataValidator::validate_categories(&labels)?;

        Ok(Self {
            feature_names,
            presence,
            labels,
        })
    }

    /// Split a combined table: every column other than the group column and
    /// the optional sample-index column is a feature.
    pub fn from_frame(frame: &DataFrame, group_column: &str, index_column: Option<&str>) -> Result<Self> {
        let metadata = frame.select([group_column])?;
        let mut abundance = frame.drop(group_column)?;
        if let Some(index) = index_column {
            abundance = abundance.drop(index)?;
        }
        Self::from_frames(&abundance, &metadata, group_column)
    }

    fn read_labels(metadata: &DataFrame, group_column: &str) -> Result<Vec<String>> {
        let column = metadata
            .column(group_column)
            .map_err(|_| SearchmiError::Data(format!("missing group column '{}'", group_column)))?
            .cast(&DataType::String)?;

        column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                label.map(str::to_string).ok_or_else(|| {
                    SearchmiError::Data(format!("sample {} has no '{}' label", i, group_column))
                })
            })
            .collect()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    /// Distinct labels in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for label in &self.labels {
            if !categories.contains(label) {
                categories.push(label.clone());
            }
        }
        categories
    }

    pub fn is_present(&self, sample: usize, feature: usize) -> bool {
        self.presence[sample * self.num_features() + feature] == 1
    }

    /// Number of `selected` features present in `sample`.
    pub fn richness(&self, sample: usize, selected: &[usize]) -> u32 {
        let row = &self.presence[sample * self.num_features()..(sample + 1) * self.num_features()];
        selected.iter().map(|&j| row[j] as u32).sum()
    }
}
