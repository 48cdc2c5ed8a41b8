//! Fill progress across insertion points.

use serde::Serialize;

use crate::domain::insertion_point::InsertionPoint;

/// Aggregated completion counts plus the points they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionStatus {
    pub total: usize,
    pub filled: usize,
    pub remaining: usize,
    /// `filled / total`, or 0 when there are no points.
    pub rate: f64,
    pub points: Vec<InsertionPoint>,
}

impl CompletionStatus {
    pub fn of(points: &[InsertionPoint]) -> Self {
        let total = points.len();
        let filled = points.iter().filter(|point| point.filled).count();
        let rate = if total > 0 { filled as f64 / total as f64 } else { 0.0 };
        Self { total, filled, remaining: total - filled, rate, points: points.to_vec() }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn unfilled(&self) -> impl Iterator<Item = &InsertionPoint> {
        self.points.iter().filter(|point| !point.filled)
    }
}
