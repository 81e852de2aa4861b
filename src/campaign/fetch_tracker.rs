//! Coverage tracking for a campaign refresh.
//!
//! This module provides the `FetchTracker`, which records every campaign index delivered during
//! one refresh round and checks that together they are exactly `1..=N`. A refresh is only
//! published once the tracker validates completion.

use std::collections::HashSet;
use tracing::warn;

/// Records which campaign indices a refresh has delivered
#[derive(Debug, Clone)]
pub struct FetchTracker {
    /// Number of campaigns reported by the contract
    expected: u64,
    /// Indices delivered so far
    fetched_indices: HashSet<u64>,
    /// Indices delivered more than once
    duplicates: Vec<u64>,
    /// Indices outside `1..=expected`
    out_of_range: Vec<u64>,
}

impl FetchTracker {
    /// Create a tracker for a round expecting `expected` campaigns.
    pub fn new(expected: u64) -> Self {
        Self {
            expected,
            fetched_indices: HashSet::new(),
            duplicates: Vec::new(),
            out_of_range: Vec::new(),
        }
    }

    /// Record that the campaign at `index` was delivered
    pub fn record_fetched(&mut self, index: u64) {
        if index == 0 || index > self.expected {
            self.out_of_range.push(index);
            return;
        }
        if !self.fetched_indices.insert(index) {
            self.duplicates.push(index);
        }
    }

    /// Missing index ranges as inclusive (start, end) pairs
    pub fn check_for_gaps(&self) -> Vec<(u64, u64)> {
        let mut gaps = Vec::new();
        let mut gap_start: Option<u64> = None;

        for index in 1..=self.expected {
            match (self.fetched_indices.contains(&index), gap_start) {
                (false, None) => gap_start = Some(index),
                (true, Some(start)) => {
                    gaps.push((start, index - 1));
                    gap_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = gap_start {
            gaps.push((start, self.expected));
        }

        gaps
    }

    /// Get fetch statistics as a FetchStats struct
    pub fn get_stats(&self) -> FetchStats {
        FetchStats {
            expected: self.expected,
            fetched: self.fetched_indices.len(),
            duplicates: self.duplicates.len(),
            out_of_range: self.out_of_range.len(),
            gaps: self.check_for_gaps(),
        }
    }

    /// Validate that exactly `1..=expected` was delivered, each index once
    pub fn validate_completion(&self) -> Result<(), String> {
        let stats = self.get_stats();
        if stats.is_complete() {
            return Ok(());
        }

        for (start, end) in &stats.gaps {
            warn!("Gap detected: missing campaign indices {}..={}", start, end);
        }
        if !self.duplicates.is_empty() {
            warn!("Duplicate campaign indices: {:?}", self.duplicates);
        }
        if !self.out_of_range.is_empty() {
            warn!("Out of range campaign indices: {:?}", self.out_of_range);
        }

        Err(stats.summary())
    }
}

/// Statistics about one refresh round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchStats {
    pub expected: u64,
    pub fetched: usize,
    pub duplicates: usize,
    pub out_of_range: usize,
    pub gaps: Vec<(u64, u64)>,
}

impl FetchStats {
    pub fn is_complete(&self) -> bool {
        self.fetched as u64 == self.expected
            && self.duplicates == 0
            && self.out_of_range == 0
            && self.gaps.is_empty()
    }

    /// Get a human-readable summary of the fetch statistics
    pub fn summary(&self) -> String {
        format!(
            "Fetched {} of {} campaigns{}{}{}",
            self.fetched,
            self.expected,
            if self.gaps.is_empty() {
                String::new()
            } else {
                format!(" ({} gaps)", self.gaps.len())
            },
            if self.duplicates == 0 {
                String::new()
            } else {
                format!(" ({} duplicates)", self.duplicates)
            },
            if self.out_of_range == 0 {
                String::new()
            } else {
                format!(" ({} out of range)", self.out_of_range)
            }
        )
    }
}
