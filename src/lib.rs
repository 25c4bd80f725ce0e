//! transboard - Histograms of workflow transition durations
//!
//! A workflow moves through states (`new`, `assigned`, `running`, ...).
//! Every move is a *transition* with a start time and the time spent in the
//! state it left. transboard loads a list of transitions, filters it by
//! time window and batch, groups it by `from -> to` pair and bins the
//! durations of each group into a histogram.
//!
//! # Quick Start
//!
//! ```no_run
//! use transboard::{loader, Dashboard, DashboardView, FilterState};
//!
//! let view = match loader::load("http://localhost:8000/dashboard/dashboard-data") {
//!     Ok(dataset) => Dashboard::new(dataset)
//!         .with_filters(FilterState::from_selectors("7", "hours", "all").unwrap())
//!         .view(),
//!     Err(e) => DashboardView::failed(&e),
//! };
//!
//! for chart in view.charts() {
//!     println!("{}: {:?} {:?}", chart.title, chart.labels, chart.values);
//! }
//! ```
//!
//! # Binning
//!
//! | Unit    | Bin width  | Label          |
//! |---------|------------|----------------|
//! | minutes | 15 minutes | `15 - 30 min`  |
//! | hours   | 1 hour     | `2 - 3 h`      |
//! | days    | 1 day      | `0 - 1 d`      |
//!
//! # Modules
//!
//! - [`loader`]: HTTP and file loading of the transition payload
//! - [`filter`]: selectors and the filter/group stage
//! - [`histogram`]: duration binning
//! - [`chart`]: chart assembly and terminal rendering
//! - [`dashboard`]: application state tying the pipeline together
//! - [`report`]: HTML and JSON output
//! - [`serve`]: live dashboard over HTTP
//! - [`derive`]: transitions from workflow status histories

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod derive;
pub mod filter;
pub mod histogram;
pub mod loader;
pub mod logging;
pub mod report;
pub mod serve;
pub mod timefmt;
pub mod transition;

pub use chart::ChartSpec;
pub use dashboard::{Dashboard, DashboardView};
pub use filter::{BatchFilter, FilterState, TimeUnit, TimeWindow};
pub use histogram::Histogram;
pub use loader::LoadError;
pub use transition::{Dataset, Transition};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // End-to-end runs of the pipeline through the crate-root exports.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _: TimeUnit = TimeUnit::Minutes;
        let _: TimeWindow = TimeWindow::All;
        let _: BatchFilter = BatchFilter::All;
        let _ = Dashboard::new(Dataset::default());
    }

    #[test]
    fn test_single_transition_scenario() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let dataset = Dataset::new(
            now.timestamp(),
            vec![Transition {
                from: "A".into(),
                to: "B".into(),
                start: now.timestamp() - 60,
                duration_seconds: 900.0,
                batch_name: Some("b1".into()),
            }],
        );

        let charts = Dashboard::new(dataset).charts_at(now);
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].title, "A -> B");
        assert_eq!(charts[0].labels, vec!["15 - 30 min"]);
        assert_eq!(charts[0].values, vec![1]);
    }

    #[test]
    fn test_error_scenario_message() {
        let err = LoadError::Status { status: 500, message: "db down".into() };
        match DashboardView::failed(&err) {
            DashboardView::Failed { message } => assert_eq!(message, "Error: db down"),
            DashboardView::Ready { .. } => panic!("expected failure view"),
        }
    }
}
