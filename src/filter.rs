//! State and purchase-date filtering of the joined dataset.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde::Serialize;

use crate::data_ingestion::{CUSTOMER_STATE, DateBounds, PURCHASE_TIMESTAMP};
use crate::error::Result;

/// Multi-select option meaning "do not filter by state".
pub const ALL_STATES: &str = "Todos";

/// Widget state of one interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub states: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilterSelection {
    /// `["Todos"]` over the whole observed date range.
    pub fn all(bounds: DateBounds) -> Self {
        Self {
            states: vec![ALL_STATES.to_string()],
            start: bounds.min,
            end: bounds.max,
        }
    }

    pub fn includes_all_states(&self) -> bool {
        self.states.iter().any(|state| state == ALL_STATES)
    }

    fn state_predicate(&self) -> Expr {
        if self.includes_all_states() {
            lit(true)
        } else if self.states.is_empty() {
            lit(false)
        } else {
            let selected = Series::new("selected_states".into(), self.states.as_slice());
            col(CUSTOMER_STATE).is_in(lit(selected))
        }
    }

    /// `start <= ts < end + 1 day`, i.e. both calendar days included.
    fn date_predicate(&self) -> Expr {
        let lower = self.start.and_time(NaiveTime::MIN);
        let upper = self.end.succ_opt().unwrap_or(self.end).and_time(NaiveTime::MIN);

        col(PURCHASE_TIMESTAMP)
            .gt_eq(datetime_lit(lower))
            .and(col(PURCHASE_TIMESTAMP).lt(datetime_lit(upper)))
    }

    pub fn predicate(&self) -> Expr {
        self.state_predicate().and(self.date_predicate())
    }
}

fn datetime_lit(value: NaiveDateTime) -> Expr {
    lit(value).cast(DataType::Datetime(TimeUnit::Microseconds, None))
}

/// Rows of `frame` matching `selection`. `frame` itself is left untouched.
pub fn apply_filter(frame: &DataFrame, selection: &FilterSelection) -> Result<DataFrame> {
    let filtered = frame
        .clone()
        .lazy()
        .filter(selection.predicate())
        .collect()?;
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_ingestion::Dataset;
    use crate::test_utils::{dataset_from_rows, sample_dataset};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn select(dataset: &Dataset, states: &[&str]) -> FilterSelection {
        let bounds = dataset.date_bounds().unwrap();
        FilterSelection {
            states: states.iter().map(|s| s.to_string()).collect(),
            start: bounds.min,
            end: bounds.max,
        }
    }

    fn three_orders() -> Dataset {
        dataset_from_rows(&[
            ("o1", "SP", "u1", "2017-01-05 10:00:00"),
            ("o2", "SP", "u2", "2017-02-05 10:00:00"),
            ("o3", "RJ", "u3", "2017-03-05 10:00:00"),
        ])
    }

    #[test]
    fn test_sentinel_passes_every_state() {
        let dataset = three_orders();
        let filtered = apply_filter(dataset.frame(), &select(&dataset, &[ALL_STATES])).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_sentinel_anywhere_in_selection_passes_every_state() {
        let dataset = three_orders();
        let filtered =
            apply_filter(dataset.frame(), &select(&dataset, &["RJ", ALL_STATES])).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_sentinel_matches_selecting_every_state() {
        let dataset = sample_dataset();
        let states: Vec<&str> = dataset.states().iter().map(String::as_str).collect();

        let all = apply_filter(dataset.frame(), &select(&dataset, &[ALL_STATES])).unwrap();
        let each = apply_filter(dataset.frame(), &select(&dataset, &states)).unwrap();
        assert!(all.equals(&each));
    }

    #[test]
    fn test_single_state_selection() {
        let dataset = three_orders();
        let filtered = apply_filter(dataset.frame(), &select(&dataset, &["RJ"])).unwrap();

        assert_eq!(filtered.height(), 1);
        let state = filtered.column(CUSTOMER_STATE).unwrap().str().unwrap().get(0);
        assert_eq!(state, Some("RJ"));
    }

    #[test]
    fn test_empty_selection_yields_no_rows() {
        let dataset = three_orders();
        let filtered = apply_filter(dataset.frame(), &select(&dataset, &[])).unwrap();
        assert_eq!(filtered.height(), 0);
    }

    #[test]
    fn test_unknown_state_yields_no_rows() {
        let dataset = three_orders();
        let filtered = apply_filter(dataset.frame(), &select(&dataset, &["AM"])).unwrap();
        assert_eq!(filtered.height(), 0);
    }

    #[test]
    fn test_full_date_range_keeps_every_row() {
        let dataset = sample_dataset();
        let filtered = apply_filter(dataset.frame(), &select(&dataset, &[ALL_STATES])).unwrap();
        assert_eq!(filtered.height(), dataset.len());
    }

    #[test]
    fn test_end_date_includes_whole_day() {
        // o2 is purchased at 23:59:59 on 2017-01-28
        let dataset = sample_dataset();
        let selection = FilterSelection {
            states: vec![ALL_STATES.to_string()],
            start: date(2017, 1, 28),
            end: date(2017, 1, 28),
        };

        let filtered = apply_filter(dataset.frame(), &selection).unwrap();
        let ids = filtered.column("order_id").unwrap().str().unwrap().get(0);
        assert_eq!(filtered.height(), 1);
        assert_eq!(ids, Some("o2"));
    }

    #[test]
    fn test_start_after_end_yields_no_rows() {
        let dataset = sample_dataset();
        let selection = FilterSelection {
            states: vec![ALL_STATES.to_string()],
            start: date(2017, 3, 1),
            end: date(2017, 1, 1),
        };

        let filtered = apply_filter(dataset.frame(), &selection).unwrap();
        assert_eq!(filtered.height(), 0);
    }

    #[test]
    fn test_state_and_date_combine() {
        let dataset = three_orders();
        let selection = FilterSelection {
            states: vec!["SP".to_string()],
            start: date(2017, 2, 1),
            end: date(2017, 3, 31),
        };

        let filtered = apply_filter(dataset.frame(), &selection).unwrap();
        let ids = filtered.column("order_id").unwrap().str().unwrap().get(0);
        assert_eq!(filtered.height(), 1);
        assert_eq!(ids, Some("o2"));
    }

    #[test]
    fn test_filtered_view_never_exceeds_dataset() {
        let dataset = sample_dataset();
        let selections = [
            select(&dataset, &[ALL_STATES]),
            select(&dataset, &["SP"]),
            select(&dataset, &["SP", "RJ", "MG"]),
            select(&dataset, &[]),
        ];

        for selection in &selections {
            let filtered = apply_filter(dataset.frame(), selection).unwrap();
            assert!(filtered.height() <= dataset.len());
        }
        assert_eq!(dataset.len(), 3);
    }
}
