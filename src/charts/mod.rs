//! One module per chart kind. Each exposes an options struct with defaults,
//! a chart struct implementing [`Chart`](crate::viz::Chart) and a
//! convenience function that validates, renders and writes the file.

pub mod bar;
pub mod boxplot;
pub mod density;
pub mod hist;
pub mod joint;
pub mod line;
pub mod pair;
pub mod pie;
pub mod scatter;
pub mod violin;

use crate::annotation::Annotation;
use crate::dataset::Dataset;
use crate::error::NeonError;
use crate::hue::HueGroup;
use crate::viz::legend::{Glyph, LegendItem};
use ahash::AHashMap;

/// Title, axis names and annotation shared by every chart kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartText {
    /// Chart title; `None` uses the kind's default.
    pub title: Option<String>,
    /// Display name of the x axis; `None` uses the column name.
    pub x_name: Option<String>,
    pub y_name: Option<String>,
    /// Free text under the chart. Empty draws nothing.
    pub annotation: String,
    /// Annotation anchor in axes fraction; `None` uses the kind's default.
    pub ann_x: Option<f64>,
    pub ann_y: Option<f64>,
}

impl ChartText {
    pub fn x_label(&self, column: &str) -> String {
        display_name(self.x_name.as_deref(), column)
    }

    pub fn y_label(&self, column: &str) -> String {
        display_name(self.y_name.as_deref(), column)
    }

    pub fn title_or(&self, default: impl FnOnce() -> String) -> String {
        self.title.clone().unwrap_or_else(default)
    }

    pub(crate) fn annotation(&self, x: f64, y: f64, width: usize) -> Annotation {
        Annotation::new(
            self.annotation.clone(),
            self.ann_x.unwrap_or(x),
            self.ann_y.unwrap_or(y),
            width,
        )
    }
}

/// An explicit display name, or the column name when none was given.
pub fn display_name(name: Option<&str>, column: &str) -> String {
    name.unwrap_or(column).to_string()
}

/// Paired numeric values of `x` and `y` for `rows`, skipping rows where
/// either is missing.
pub(crate) fn xy_points(
    data: &Dataset,
    rows: &[usize],
    x: &str,
    y: &str,
) -> Result<Vec<(f64, f64)>, NeonError> {
    let xs = data.numeric(x)?;
    let ys = data.numeric(y)?;
    Ok(rows
        .iter()
        .filter_map(|&r| Some((xs[r]?, ys[r]?)))
        .collect())
}

/// Numeric values of `column` for `rows`, missing cells dropped.
pub(crate) fn column_values(data: &Dataset, rows: &[usize], column: &str) -> Result<Vec<f64>, NeonError> {
    let vs = data.numeric(column)?;
    Ok(rows.iter().filter_map(|&r| vs[r]).collect())
}

/// Legend entries for hue groups; un-hued charts get none.
pub(crate) fn hue_legend(groups: &[HueGroup], glyph: Glyph) -> Vec<LegendItem> {
    groups
        .iter()
        .filter_map(|g| {
            g.label
                .as_ref()
                .map(|l| LegendItem::new(l.clone(), g.color, glyph))
        })
        .collect()
}

/// Category labels of a column, in order of first appearance along `rows`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Categories {
    labels: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Categories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of `label`, adding it at the end when new.
    pub fn intern(&mut self, label: &str) -> usize {
        if let Some(&i) = self.index.get(label) {
            return i;
        }
        let i = self.labels.len();
        self.labels.push(label.to_string());
        self.index.insert(label.to_string(), i);
        i
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
