//! Ordered estimate series

use serde::Serialize;

use contracts::{ContractError, Estimate, EstimateRecord};

/// Timestamps closer than this are the same key (seconds)
const TIMESTAMP_EPSILON: f64 = 1e-9;

/// Finite, window-ordered sequence of estimates
///
/// Holds exactly one estimate per window index `0..len`, in index order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EstimateSeries {
    estimates: Vec<Estimate>,
}

impl EstimateSeries {
    /// Merge estimates produced in any order back into window order
    ///
    /// # Errors
    /// `ContractError::Other` when an index in `0..expected` is missing,
    /// duplicated, or out of range.
    pub fn from_indexed(
        mut estimates: Vec<Estimate>,
        expected: usize,
    ) -> Result<Self, ContractError> {
        if estimates.len() != expected {
            return Err(ContractError::Other(format!(
                "expected {expected} estimates, got {}",
                estimates.len()
            )));
        }
        estimates.sort_by_key(|e| e.window_index);
        if let Some((position, estimate)) = estimates
            .iter()
            .enumerate()
            .find(|(i, e)| e.window_index != *i)
        {
            return Err(ContractError::Other(format!(
                "window index {} at position {position}: duplicated or missing window",
                estimate.window_index
            )));
        }
        Ok(Self { estimates })
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Estimate> {
        self.estimates.iter()
    }

    pub fn as_slice(&self) -> &[Estimate] {
        &self.estimates
    }

    /// Estimate of window `index`
    pub fn get(&self, index: usize) -> Option<&Estimate> {
        self.estimates.get(index)
    }

    /// Estimate whose window starts at `timestamp_s`
    pub fn at(&self, timestamp_s: f64) -> Option<&Estimate> {
        let pos = self
            .estimates
            .partition_point(|e| e.timestamp_s < timestamp_s - TIMESTAMP_EPSILON);
        self.estimates
            .get(pos)
            .filter(|e| (e.timestamp_s - timestamp_s).abs() <= TIMESTAMP_EPSILON)
    }

    pub fn valid_count(&self) -> usize {
        self.estimates.iter().filter(|e| e.valid).count()
    }

    pub fn discarded_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// Accepted heart rates with their timestamps
    pub fn valid_bpm(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.estimates
            .iter()
            .filter_map(|e| e.bpm.map(|bpm| (e.timestamp_s, bpm)))
    }

    /// Flat export records
    pub fn records(&self) -> Vec<EstimateRecord> {
        self.estimates.iter().map(EstimateRecord::from).collect()
    }
}

impl<'a> IntoIterator for &'a EstimateSeries {
    type Item = &'a Estimate;
    type IntoIter = std::slice::Iter<'a, Estimate>;

    fn into_iter(self) -> Self::IntoIter {
        self.estimates.iter()
    }
}

impl IntoIterator for EstimateSeries {
    type Item = Estimate;
    type IntoIter = std::vec::IntoIter<Estimate>;

    fn into_iter(self) -> Self::IntoIter {
        self.estimates.into_iter()
    }
}
