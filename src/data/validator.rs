use crate::error::{Result, SearchmiError};
use polars::prelude::*;

/// Smallest and largest number of groups a search can compare.
pub const MIN_CATEGORIES: usize = 2;
pub const MAX_CATEGORIES: usize = 3;

pub struct DataValidator;

impl DataValidator {
    /// Reject inputs that cannot start a run: no features, no samples, or
    /// abundance rows that do not line up with the metadata rows.
    pub fn validate_shape(num_features: usize, num_samples: usize, num_labels: usize) -> Result<()> {
        if num_features == 0 {
            return Err(SearchmiError::Data(
                "feature universe is empty, nothing to search".to_string(),
            ));
        }
        if num_samples == 0 {
            return Err(SearchmiError::Data("abundance table has no samples".to_string()));
        }
        if num_samples != num_labels {
            return Err(SearchmiError::Data(format!(
                "abundance has {} samples but metadata has {} rows",
                num_samples, num_labels
            )));
        }
        Ok(())
    }

    /// Every abundance column must be numeric.
    pub fn validate_numeric(df: &DataFrame) -> Result<()> {
        for column in df.get_columns() {
            if !matches!(
                column.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::Int16
                    | DataType::Int8
                    | DataType::UInt64
                    | DataType::UInt32
                    | DataType::UInt16
                    | DataType::UInt8
            ) {
                return Err(SearchmiError::Data(format!(
                    "abundance column '{}' must be numeric, found {:?}",
                    column.name(),
                    column.dtype()
                )));
            }
        }
        Ok(())
    }

    /// The group column must hold two or three distinct values.
    pub fn validate_categories(labels: &[String]) -> Result<()> {
        let mut distinct: Vec<&String> = Vec::new();
        for label in labels {
            if !distinct.contains(&label) {
                distinct.push(label);
            }
        }
        if distinct.len() < MIN_CATEGORIES || distinct.len() > MAX_CATEGORIES {
            return Err(SearchmiError::Data(format!(
                "group column must have {} or {} categories, found {}: {:?}",
                MIN_CATEGORIES,
                MAX_CATEGORIES,
                distinct.len(),
                distinct
            )));
        }
        Ok(())
    }

    /// Columns with null values and how many.
    pub fn check_nulls(df: &DataFrame) -> Result<Vec<(String, usize)>> {
        let mut null_report = Vec::new();

        for column in df.get_columns() {
            let null_count = column.null_count();
            if null_count > 0 {
                null_report.push((column.name().to_string(), null_count));
            }
        }

        Ok(null_report)
    }
}
