use std::collections::BTreeMap;

use coal_core::errors::{CoalError, ErrorInfo};
use serde::{Deserialize, Serialize};

/// Observed event counts for every year of an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisasterData {
    /// First year of the range.
    pub start_year: i64,
    /// Last year of the range, inclusive.
    pub end_year: i64,
    /// Count observed in each year. Years outside the range are ignored.
    pub counts: BTreeMap<i64, u64>,
}

impl DisasterData {
    /// Creates a dataset spanning the full range of the given counts.
    ///
    /// Returns `None` when `counts` is empty.
    pub fn spanning(counts: BTreeMap<i64, u64>) -> Option<Self> {
        let start_year = *counts.keys().next()?;
        let end_year = *counts.keys().next_back()?;
        Some(Self {
            start_year,
            end_year,
            counts,
        })
    }

    /// Number of years in the range.
    pub fn year_count(&self) -> usize {
        if self.end_year < self.start_year {
            0
        } else {
            (self.end_year - self.start_year + 1) as usize
        }
    }

    /// Checks that the range is ordered and that every year has a count.
    pub fn validate(&self) -> Result<(), CoalError> {
        if self.end_year < self.start_year {
            return Err(data_error("inverted-range", "end year precedes start year")
                .with_context("start_year", self.start_year)
                .with_context("end_year", self.end_year));
        }
        for year in self.start_year..=self.end_year {
            let count = self.counts.get(&year).ok_or_else(|| {
                data_error("missing-year", "no count recorded for a year in the range")
                    .with_context("year", year)
            })?;
            if i64::try_from(*count).is_err() {
                return Err(data_error("count-out-of-range", "count does not fit a signed integer")
                    .with_context("year", year)
                    .with_context("count", count));
            }
        }
        Ok(())
    }

    /// Iterates `(year, count)` over the inclusive range, skipping missing years.
    pub fn years(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.counts
            .range(self.start_year..=self.end_year)
            .map(|(year, count)| (*year, *count))
    }
}

fn data_error(code: impl Into<String>, message: impl Into<String>) -> CoalError {
    CoalError::Data(ErrorInfo::new(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanning_uses_min_and_max_year() {
        let counts = BTreeMap::from([(1852, 3), (1851, 4), (1853, 0)]);
        let data = DisasterData::spanning(counts).unwrap();
        assert_eq!((data.start_year, data.end_year), (1851, 1853));
        assert_eq!(data.year_count(), 3);
        assert!(DisasterData::spanning(BTreeMap::new()).is_none());
    }

    #[test]
    fn years_are_restricted_to_the_range() {
        let data = DisasterData {
            start_year: 2,
            end_year: 3,
            counts: BTreeMap::from([(1, 9), (2, 1), (3, 2), (4, 9)]),
        };
        assert_eq!(data.years().collect::<Vec<_>>(), vec![(2, 1), (3, 2)]);
        data.validate().unwrap();
    }
}
