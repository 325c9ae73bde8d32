//! Row ordering
//!
//! Keys are compared left to right with early exit on the first
//! difference. DOWN reverses every level. Rows equal on all keys keep
//! their input order.

use std::cmp::Ordering;

use crate::dataset::Scalar;
use crate::query::{Order, SortDirection};

use super::result::Row;

/// Sorts result rows
pub struct RowSorter;

impl RowSorter {
    /// Stable in-place sort by `order`
    pub fn sort(rows: &mut [Row], order: &Order) {
        rows.sort_by(|a, b| Self::compare(a, b, order));
    }

    pub fn compare(a: &Row, b: &Row, order: &Order) -> Ordering {
        for key in &order.keys {
            let ordering = Self::compare_values(a.get(key), b.get(key));
            if ordering != Ordering::Equal {
                return match order.direction {
                    SortDirection::Up => ordering,
                    SortDirection::Down => ordering.reverse(),
                };
            }
        }
        Ordering::Equal
    }

    /// Missing values sort first
    fn compare_values(a: Option<&Scalar>, b: Option<&Scalar>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => a.compare(b),
        }
    }
}
