//! Report generation for dashboard views
//!
//! - **HTML**: static dashboard page with Chart.js bar charts
//! - **JSON**: the [`DashboardView`] itself, for programmatic consumption
//!
//! # Usage
//!
//! ```ignore
//! use transboard::report;
//!
//! // Automatically picks format based on extension
//! report::generate("dashboard.html", &view)?;  // HTML
//! report::generate("dashboard.json", &view)?;  // JSON
//! ```

pub mod html;

use crate::dashboard::DashboardView;
use std::io::{self, Write};
use std::path::Path;

/// Generate a report in the appropriate format based on file extension
pub fn generate<P: AsRef<Path>>(path: P, view: &DashboardView) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = io::BufWriter::new(std::fs::File::create(path)?);

    match ext.as_str() {
        "json" => {
            serde_json::to_writer_pretty(&mut file, view)?;
            writeln!(file)?;
        }
        _ => html::write(&mut file, Some(view), None)?,
    }

    file.flush()
}

/// Headline numbers for a view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub shown: usize,
    pub transition_types: usize,
    pub bins: usize,
}

impl Summary {
    pub fn from_view(view: &DashboardView) -> Self {
        match view {
            DashboardView::Ready { total, shown, charts, .. } => Self {
                total: *total,
                shown: *shown,
                transition_types: charts.len(),
                bins: charts.iter().map(|c| c.values.len()).sum(),
            },
            DashboardView::Failed { .. } => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Dashboard;
    use crate::filter::FilterState;
    use crate::transition::{Dataset, Transition};

    fn t(from: &str, to: &str, duration: f64) -> Transition {
        Transition {
            from: from.into(),
            to: to.into(),
            start: chrono::Utc::now().timestamp(),
            duration_seconds: duration,
            batch_name: None,
        }
    }

    fn view() -> DashboardView {
        Dashboard::new(Dataset::new(
            0,
            vec![t("a", "b", 10.0), t("a", "b", 2_000.0), t("b", "c", 10.0)],
        ))
        .with_filters(FilterState::default())
        .view()
    }

    // ==========================================================================
    // SUMMARY TESTS
    // ==========================================================================

    #[test]
    fn test_summary_ready() {
        let summary = Summary::from_view(&view());
        assert_eq!(
            summary,
            Summary { total: 3, shown: 3, transition_types: 2, bins: 3 }
        );
    }

    #[test]
    fn test_summary_failed_is_empty() {
        let err = crate::loader::LoadError::Status { status: 404, message: "x".into() };
        assert_eq!(Summary::from_view(&DashboardView::failed(&err)), Summary::default());
    }

    // ==========================================================================
    // FORMAT SELECTION TESTS
    // ==========================================================================

    #[test]
    fn test_generate_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.json");
        generate(&path, &view()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "ready");
        assert_eq!(value["charts"][0]["title"], "a -> b");
    }

    #[test]
    fn test_generate_html_by_default() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["view.html", "view.HTM", "view"] {
            let path = dir.path().join(name);
            generate(&path, &view()).unwrap();
            let body = std::fs::read_to_string(&path).unwrap();
            assert!(body.starts_with("<!DOCTYPE html>"), "{}", name);
        }
    }
}
