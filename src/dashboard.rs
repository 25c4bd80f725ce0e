//! Application state
//!
//! A [`Dashboard`] owns the loaded dataset and the current selector values.
//! Selector changes are plain method calls; rendering re-runs the pipeline
//! on the cached transitions and never reloads.
//!
//! ```no_run
//! use transboard::{loader, Dashboard, TimeUnit};
//!
//! let dataset = loader::load("http://localhost:8000/dashboard/dashboard-data")?;
//! let mut dashboard = Dashboard::new(dataset);
//! dashboard.set_unit(TimeUnit::Hours);
//! for chart in dashboard.charts() {
//!     println!("{}: {:?}", chart.title, chart.values);
//! }
//! # Ok::<(), transboard::LoadError>(())
//! ```

use crate::chart::{self, ChartSpec};
use crate::filter::{self, BatchFilter, FilterState, Selection, TimeUnit, TimeWindow};
use crate::loader::LoadError;
use crate::timefmt;
use crate::transition::Dataset;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: Dataset,
    batch_options: Vec<String>,
    filters: FilterState,
}

impl Dashboard {
    /// Batch options are computed here, once, from the unfiltered data
    pub fn new(dataset: Dataset) -> Self {
        let batch_options = filter::distinct_batch_names(&dataset.transitions);
        Self {
            dataset,
            batch_options,
            filters: FilterState::default(),
        }
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn batch_options(&self) -> &[String] {
        &self.batch_options
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn set_time_window(&mut self, window: TimeWindow) {
        self.filters.time_window = window;
    }

    pub fn set_unit(&mut self, unit: TimeUnit) {
        self.filters.unit = unit;
    }

    pub fn set_batch(&mut self, batch: BatchFilter) {
        self.filters.batch = batch;
    }

    pub fn charts(&self) -> Vec<ChartSpec> {
        self.charts_at(Utc::now())
    }

    /// Charts for the current selection, with the time window measured from `now`
    pub fn charts_at(&self, now: DateTime<Utc>) -> Vec<ChartSpec> {
        let groups = filter::filter_and_group(&self.dataset.transitions, &self.filters, now);
        chart::assemble(&groups, self.filters.unit)
    }

    pub fn view(&self) -> DashboardView {
        self.view_at(Utc::now())
    }

    pub fn view_at(&self, now: DateTime<Utc>) -> DashboardView {
        let charts = self.charts_at(now);
        let shown = charts.iter().map(|c| c.total() as usize).sum();

        DashboardView::Ready {
            last_updated: self.dataset.last_updated,
            updated_text: timefmt::format_update_time(
                self.dataset.last_updated,
                &now.with_timezone(&Local),
            ),
            selection: self.filters.selection(),
            batch_options: self.batch_options.clone(),
            total: self.dataset.len(),
            shown,
            charts,
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DashboardView {
    Ready {
        last_updated: i64,
        updated_text: String,
        selection: Selection,
        batch_options: Vec<String>,
        /// Transitions in the dataset
        total: usize,
        /// Transitions that passed the filters
        shown: usize,
        charts: Vec<ChartSpec>,
    },
    Failed {
        message: String,
    },
}

impl DashboardView {
    /// Shown in place of the charts when loading fails
    pub fn failed(err: &LoadError) -> Self {
        DashboardView::Failed {
            message: format!("Error: {}", err),
        }
    }

    pub fn charts(&self) -> &[ChartSpec] {
        match self {
            DashboardView::Ready { charts, .. } => charts,
            DashboardView::Failed { .. } => &[],
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DashboardView::Ready { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::Transition;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn dataset() -> Dataset {
        let n = now().timestamp();
        let t = |from: &str, to: &str, start: i64, d: f64, batch: Option<&str>| Transition {
            from: from.into(),
            to: to.into(),
            start,
            duration_seconds: d,
            batch_name: batch.map(Into::into),
        };
        Dataset::new(
            n - 180,
            vec![
                t("A", "B", n - 100, 900.0, Some("b1")),
                t("A", "B", n - 5 * 86_400, 7_200.0, Some("b2")),
                t("B", "C", n - 200, 30.0, None),
            ],
        )
    }

    // ==========================================================================
    // STATE AND RE-RENDER TESTS
    // ==========================================================================

    #[test]
    fn test_batch_options_from_full_dataset() {
        let mut dashboard = Dashboard::new(dataset());
        assert_eq!(dashboard.batch_options(), ["b1", "b2"]);

        // Options do not follow later filter changes
        dashboard.set_batch(BatchFilter::Named("b1".into()));
        dashboard.set_time_window(TimeWindow::Days(1));
        assert_eq!(dashboard.batch_options(), ["b1", "b2"]);
    }

    #[test]
    fn test_default_render() {
        let dashboard = Dashboard::new(dataset());
        let charts = dashboard.charts_at(now());

        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].title, "A -> B");
        assert_eq!(charts[0].labels, vec!["15 - 30 min", "120 - 135 min"]);
        assert_eq!(charts[1].title, "B -> C");
    }

    #[test]
    fn test_selector_changes_rerender_from_cache() {
        let mut dashboard = Dashboard::new(dataset());

        dashboard.set_unit(TimeUnit::Hours);
        let charts = dashboard.charts_at(now());
        assert_eq!(charts[0].labels, vec!["0 - 1 h", "2 - 3 h"]);

        dashboard.set_time_window(TimeWindow::Days(1));
        let charts = dashboard.charts_at(now());
        assert_eq!(charts[0].values, vec![1]);

        dashboard.set_batch(BatchFilter::Named("b2".into()));
        assert!(dashboard.charts_at(now()).is_empty());

        // Same state, same output
        dashboard.set_filters(FilterState::default());
        assert_eq!(dashboard.charts_at(now()), Dashboard::new(dataset()).charts_at(now()));
    }

    #[test]
    fn test_view_ready() {
        let dashboard = Dashboard::new(dataset())
            .with_filters(FilterState::from_selectors("1", "minutes", "all").unwrap());
        let view = dashboard.view_at(now());

        match &view {
            DashboardView::Ready { total, shown, updated_text, selection, .. } => {
                assert_eq!(*total, 3);
                assert_eq!(*shown, 2);
                assert!(updated_text.ends_with("(3 minutes ago)"), "{}", updated_text);
                assert_eq!(selection.days.as_deref(), Some("1"));
            }
            DashboardView::Failed { .. } => panic!("expected ready view"),
        }

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["charts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_view_failed() {
        let err = LoadError::Status { status: 500, message: "db down".into() };
        let view = DashboardView::failed(&err);

        assert!(!view.is_ready());
        assert!(view.charts().is_empty());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "Error: db down");
    }
}
