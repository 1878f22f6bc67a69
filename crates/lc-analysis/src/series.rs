//! Numeric series extraction

use std::ops::Range;
use rayon::prelude::*;
use tracing::debug;
use lc_data::LogFile;

use crate::search::ValueQuery;
use crate::AnalysisError;

/// One column read as numbers, one sample per line of the file.
///
/// Header rows are NaN. Missing or malformed cells carry the last valid
/// value forward; NaN only remains before the first valid sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub column: usize,
    pub data: Vec<f64>,
}

/// Summary over the valid samples of a row range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl SeriesStats {
    /// Spread between the largest and smallest sample
    pub fn delta(&self) -> f64 {
        self.max - self.min
    }
}

/// Read column `col` of every data row
pub fn extract_series(log: &LogFile, col: usize) -> Series {
    let total = log.total_rows();
    let start = log.data_start_row();
    let mut data = vec![f64::NAN; total];

    data[start..]
        .par_iter_mut()
        .enumerate()
        .for_each(|(offset, slot)| *slot = log.value_at(start + offset, col));

    forward_fill(&mut data);

    let name = log.column_names().get(col).cloned().unwrap_or_else(|| format!("Column_{col}"));
    debug!("Extracted {} samples for {}", total - start, name);

    Series { name, column: col, data }
}

/// Resolve a column by display or raw name, then extract it
pub fn extract_series_by_name(log: &LogFile, name: &str) -> Result<Series, AnalysisError> {
    let col = log
        .column_index(name)
        .ok_or_else(|| AnalysisError::UnknownColumn(name.to_string()))?;
    Ok(extract_series(log, col))
}

/// Replace every NaN after the first valid sample with the previous valid sample
pub fn forward_fill(data: &mut [f64]) {
    let mut last = f64::NAN;
    for value in data.iter_mut() {
        if value.is_nan() {
            *value = last;
        } else {
            last = *value;
        }
    }
}

impl Series {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `row`, `None` for NaN or out of range
    pub fn get(&self, row: usize) -> Option<f64> {
        self.data.get(row).copied().filter(|v| !v.is_nan())
    }

    /// Statistics over `range`, clamped to the series; `None` if no sample is valid
    pub fn stats(&self, range: Range<usize>) -> Option<SeriesStats> {
        let end = range.end.min(self.data.len());
        let start = range.start.min(end);

        let mut count = 0;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in self.data[start..end].iter().filter(|v| !v.is_nan()) {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        (count > 0).then(|| SeriesStats {
            count,
            min,
            max,
            mean: sum / count as f64,
        })
    }

    /// First row at or after `from` whose sample satisfies `query`
    pub fn find_first(&self, query: &ValueQuery, from: usize) -> Option<usize> {
        self.data
            .iter()
            .enumerate()
            .skip(from)
            .find(|&(_, &value)| query.matches(value))
            .map(|(row, _)| row)
    }
}
