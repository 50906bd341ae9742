//! One dashboard interaction: widget state in, everything the page shows out.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::analysis::{self, Metrics, MonthlyCount, StateCount};
use crate::data_ingestion::{DateBounds, Dataset};
use crate::error::{DashboardError, Result};
use crate::filter::{ALL_STATES, FilterSelection, apply_filter};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Raw widget values as submitted by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetInput {
    pub states: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Set once the sidebar form has been submitted; an empty multi-select
    /// then means "no states" instead of the default.
    pub submitted: bool,
}

impl WidgetInput {
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut input = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "states" => input.states.push(value.into()),
                "start" => input.start = Some(value.into()),
                "end" => input.end = Some(value.into()),
                "submitted" => input.submitted = true,
                _ => {}
            }
        }
        input
    }

    /// Resolves the widget values against the dataset: defaults for missing
    /// values, dates clamped to the observed range.
    pub fn resolve(&self, bounds: Option<DateBounds>) -> Result<FilterSelection> {
        let states = if self.states.is_empty() && !self.submitted {
            vec![ALL_STATES.to_string()]
        } else {
            self.states.clone()
        };

        // a cleared date picker submits an empty value
        let start = non_blank(&self.start).map(parse_date).transpose()?;
        let end = non_blank(&self.end).map(parse_date).transpose()?;

        let (start, end) = match bounds {
            Some(bounds) => (
                start.map_or(bounds.min, |d| bounds.clamp(d)),
                end.map_or(bounds.max, |d| bounds.clamp(d)),
            ),
            None => {
                let fallback = start.or(end).unwrap_or_default();
                (start.unwrap_or(fallback), end.unwrap_or(fallback))
            }
        };

        Ok(FilterSelection { states, start, end })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| DashboardError::InvalidDate(value.to_string()))
}

/// Everything rendered for one interaction.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Multi-select options, sentinel first then sorted state codes.
    pub state_options: Vec<String>,
    pub date_bounds: Option<DateBounds>,
    pub selection: FilterSelection,
    pub metrics: Metrics,
    pub orders_by_state: Vec<StateCount>,
    pub monthly_orders: Vec<MonthlyCount>,
}

pub fn state_options(dataset: &Dataset) -> Vec<String> {
    std::iter::once(ALL_STATES.to_string())
        .chain(dataset.states().iter().cloned())
        .collect()
}

/// Runs filter, metrics and both chart aggregations over `dataset`.
pub fn build_view(dataset: &Dataset, selection: FilterSelection) -> Result<DashboardView> {
    let filtered = apply_filter(dataset.frame(), &selection)?;
    debug!(
        states = ?selection.states,
        start = %selection.start,
        end = %selection.end,
        rows = filtered.height(),
        "filter applied"
    );

    Ok(DashboardView {
        state_options: state_options(dataset),
        date_bounds: dataset.date_bounds(),
        metrics: analysis::metrics(&filtered)?,
        orders_by_state: analysis::orders_by_state(&filtered)?,
        monthly_orders: analysis::monthly_orders(&filtered)?,
        selection,
    })
}
