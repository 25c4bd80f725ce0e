//! Chart assembly
//!
//! Each transition-type group becomes one [`ChartSpec`]: a bar chart
//! description that the HTML dashboard hands to Chart.js and that
//! [`render_text`] draws in a terminal.

use crate::filter::{Group, TimeUnit};
use crate::histogram::{self, Histogram};
use serde::Serialize;
use std::io::{self, Write};

/// Legend text of the single dataset
pub const DATASET_LABEL: &str = "Number of transitions";

/// The y axis always shows at least this many units
pub const SUGGESTED_MAX: u32 = 3;

const BAR_COLOR: &str = "rgb(5, 155, 255)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub unit: TimeUnit,
    pub labels: Vec<String>,
    pub values: Vec<u32>,
    pub dataset_label: String,
    pub color: String,
    pub x_title: String,
    pub y_title: String,
    pub suggested_max: u32,
    pub begin_at_zero: bool,
}

impl ChartSpec {
    pub fn from_histogram(title: &str, histogram: &Histogram) -> Self {
        Self {
            title: title.to_string(),
            unit: histogram.unit(),
            labels: histogram.labels(),
            values: histogram.counts(),
            dataset_label: DATASET_LABEL.to_string(),
            color: BAR_COLOR.to_string(),
            x_title: format!("Time in {}", histogram.unit()),
            y_title: "Count".to_string(),
            suggested_max: SUGGESTED_MAX,
            begin_at_zero: true,
        }
    }

    /// Top of the y axis: the tallest bar, but never below [`SUGGESTED_MAX`]
    pub fn scale_max(&self) -> u32 {
        self.values.iter().copied().max().unwrap_or(0).max(self.suggested_max)
    }

    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

/// One chart per non-empty group, in group order
pub fn assemble(groups: &[Group], unit: TimeUnit) -> Vec<ChartSpec> {
    groups
        .iter()
        .filter(|g| !g.transitions.is_empty())
        .map(|g| {
            let histogram = histogram::bin(&g.transitions, unit);
            ChartSpec::from_histogram(&g.transition_type, &histogram)
        })
        .collect()
}

/// Draw a chart as horizontal bars, `width` columns for a full-scale bar
pub fn render_text<W: Write>(writer: &mut W, chart: &ChartSpec, width: usize) -> io::Result<()> {
    writeln!(writer, "\x1b[1m{}\x1b[0m  ({} transitions)", chart.title, chart.total())?;

    let label_width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let scale = chart.scale_max() as usize;

    for (label, &value) in chart.labels.iter().zip(&chart.values) {
        let len = if scale == 0 { 0 } else { value as usize * width / scale };
        writeln!(
            writer,
            "  {:>lw$} │\x1b[34m{}\x1b[0m {}",
            label,
            "█".repeat(len),
            value,
            lw = label_width
        )?;
    }

    Ok(())
}
