//! Vertical and horizontal bar charts with outline, full or semi fill.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

use super::{Categories, ChartText, hue_legend};
use crate::annotation;
use crate::dataset::Dataset;
use crate::error::{NeonError, draw_err};
use crate::glow::GlowSpec;
use crate::hue::{self, HueGroup};
use crate::theme::{Rgb8, Theme};
use crate::viz::axes::{self, AxesSpec, Grid, extent};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::{self, Chart};

/// How bar bodies are painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarFill {
    /// Outline only; the glow is a widening outline.
    #[default]
    Empty,
    /// Solid body at alpha 0.8 plus a filled glow.
    Full,
    /// Outline body with a filled glow.
    Semi,
}

impl std::str::FromStr for BarFill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "empty" => Ok(BarFill::Empty),
            "full" => Ok(BarFill::Full),
            "semi" => Ok(BarFill::Semi),
            other => Err(format!("unknown bar fill `{other}` (empty, full, semi)")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Vertical,
    Horizontal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarOptions {
    pub text: ChartText,
    pub hue: Option<String>,
    pub fill: BarFill,
    /// Bar thickness in category units.
    pub width: f64,
}

impl Default for BarOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            hue: None,
            fill: BarFill::Empty,
            width: 0.8,
        }
    }
}

/// One bar: position along the category axis and its length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarSpan {
    pub position: f64,
    pub value: f64,
}

pub struct Bar<'a> {
    theme: &'a Theme,
    orientation: Orientation,
    x: String,
    y: String,
    opts: BarOptions,
    /// `None` when the position column is numeric.
    categories: Option<Categories>,
    groups: Vec<(HueGroup, Vec<BarSpan>)>,
}

impl<'a> Bar<'a> {
    /// Vertical bars: categories from `x_column`, heights from `y_column`,
    /// rows sorted by `y` descending.
    pub fn vertical(
        data: &Dataset,
        y_column: &str,
        x_column: &str,
        opts: BarOptions,
        theme: &'a Theme,
    ) -> Result<Self> {
        let order = data.sorted_rows(y_column, true)?;
        Self::build(data, Orientation::Vertical, y_column, x_column, x_column, y_column, &order, opts, theme)
    }

    /// Horizontal bars: categories from `y_column`, lengths from `x_column`,
    /// rows sorted by `x` ascending.
    pub fn horizontal(
        data: &Dataset,
        y_column: &str,
        x_column: &str,
        opts: BarOptions,
        theme: &'a Theme,
    ) -> Result<Self> {
        let order = data.sorted_rows(x_column, false)?;
        Self::build(data, Orientation::Horizontal, y_column, x_column, y_column, x_column, &order, opts, theme)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        data: &Dataset,
        orientation: Orientation,
        y_column: &str,
        x_column: &str,
        position_col: &str,
        value_col: &str,
        order: &[usize],
        opts: BarOptions,
        theme: &'a Theme,
    ) -> Result<Self> {
        let values = data.numeric(value_col)?;
        let positions = data.column(position_col)?;
        let numeric_positions = positions.is_numeric();
        let mut categories = Categories::new();

        let groups = hue::partition(data, opts.hue.as_deref(), &theme.palette, order)?;
        let mut out = Vec::with_capacity(groups.len());
        for g in groups {
            let mut spans = Vec::with_capacity(g.rows.len());
            for &row in &g.rows {
                let Some(value) = values[row] else { continue };
                let cell = &positions.values[row];
                let position = if numeric_positions {
                    match cell.as_f64() {
                        Some(p) => p,
                        None => continue,
                    }
                } else {
                    match cell.label() {
                        Some(label) => categories.intern(&label) as f64,
                        None => continue,
                    }
                };
                spans.push(BarSpan { position, value });
            }
            out.push((g, spans));
        }
        if out.iter().all(|(_, s)| s.is_empty()) {
            return Err(NeonError::EmptyData.into());
        }
        Ok(Self {
            theme,
            orientation,
            x: x_column.to_string(),
            y: y_column.to_string(),
            opts,
            categories: (!numeric_positions).then_some(categories),
            groups: out,
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn categories(&self) -> Option<&[String]> {
        self.categories.as_ref().map(Categories::labels)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&HueGroup, &[BarSpan])> {
        self.groups.iter().map(|(g, s)| (g, s.as_slice()))
    }

    pub fn title(&self) -> String {
        self.opts.text.title_or(|| format!("{} by {}", self.x, self.y))
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let groups: Vec<HueGroup> = self.groups.iter().map(|(g, _)| g.clone()).collect();
        hue_legend(&groups, Glyph::Patch)
    }

    fn rect(&self, span: &BarSpan) -> [(f64, f64); 2] {
        let half = self.opts.width / 2.0;
        match self.orientation {
            Orientation::Vertical => [(span.position - half, 0.0), (span.position + half, span.value)],
            Orientation::Horizontal => [(0.0, span.position - half), (span.value, span.position + half)],
        }
    }

    fn ranges(&self) -> Result<(Range<f64>, Range<f64>)> {
        let spans = || self.groups.iter().flat_map(|(_, s)| s.iter());
        let (v0, v1) = extent(spans().map(|s| s.value)).ok_or(NeonError::EmptyData)?;
        let (lo, hi) = (v0.min(0.0), v1.max(0.0));
        let pad = (hi - lo).max(f64::EPSILON) * 0.05;
        let value_range = (if lo < 0.0 { lo - pad } else { 0.0 })..(hi + pad);

        let half = self.opts.width / 2.0;
        let position_range = match &self.categories {
            Some(c) => (-half - 0.2)..(c.len().max(1) as f64 - 1.0 + half + 0.2),
            None => {
                let (p0, p1) = extent(spans().map(|s| s.position)).ok_or(NeonError::EmptyData)?;
                (p0 - half - 0.2)..(p1 + half + 0.2)
            }
        };
        Ok(match self.orientation {
            Orientation::Vertical => (position_range, value_range),
            Orientation::Horizontal => (value_range, position_range),
        })
    }
}

fn draw_rects<DB: DrawingBackend>(
    chart: &mut axes::Axes2d<'_, DB>,
    rects: &[[(f64, f64); 2]],
    style: ShapeStyle,
) -> Result<()> {
    chart
        .draw_series(rects.iter().map(|r| Rectangle::new(*r, style)))
        .map_err(draw_err)?;
    Ok(())
}

impl Chart for Bar<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let items = self.legend_items();
        let (plot, legend_area) = legend::split_for_legend(canvas, &items);
        let (x_range, y_range) = self.ranges()?;

        let title = self.title();
        let x_desc = self.opts.text.x_label(&self.x);
        let y_desc = self.opts.text.y_label(&self.y);
        let mut spec = AxesSpec::new(x_range, y_range);
        spec.title = Some(&title);
        spec.x_desc = &x_desc;
        spec.y_desc = &y_desc;
        match self.orientation {
            Orientation::Vertical => spec.x_categories = self.categories(),
            Orientation::Horizontal => {
                spec.y_categories = self.categories();
                spec.grid = Grid::X;
            }
        }
        let mut chart = axes::build(&plot, self.theme, family, &spec)?;

        let shapes: Vec<(Rgb8, Vec<[(f64, f64); 2]>)> = self
            .groups
            .iter()
            .map(|(g, spans)| (g.color, spans.iter().map(|s| self.rect(s)).collect()))
            .collect();

        for (color, rects) in &shapes {
            if self.opts.fill == BarFill::Full {
                draw_rects(&mut chart, rects, color.with_alpha(0.8).filled())?;
            }
            draw_rects(&mut chart, rects, color.rgb().stroke_width(1))?;
        }

        match self.opts.fill {
            BarFill::Empty => GlowSpec::OUTLINE.apply(|layer| {
                for (color, rects) in &shapes {
                    draw_rects(&mut chart, rects, layer.stroke(*color))?;
                }
                Ok(())
            })?,
            BarFill::Full | BarFill::Semi => GlowSpec::FILLED_BAR.apply(|layer| {
                for (color, rects) in &shapes {
                    draw_rects(&mut chart, rects, layer.fill(*color))?;
                    draw_rects(&mut chart, rects, layer.stroke(*color))?;
                }
                Ok(())
            })?,
        }

        let note = self.opts.text.annotation(1.45, -0.2, annotation::WIDE);
        viz::finish_axes(
            canvas,
            &chart,
            self.theme,
            family,
            &spec,
            legend_area.as_ref().map(|a| (a, items.as_slice())),
            &note,
        )
    }
}

/// Vertical bars of `y_column` per `x_column` category.
pub fn bar<P: AsRef<Path>>(
    data: &Dataset,
    y_column: &str,
    x_column: &str,
    opts: BarOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = Bar::vertical(data, y_column, x_column, opts, theme)?;
    viz::render(&chart, out)
}

/// Horizontal bars of `x_column` per `y_column` category.
pub fn barh<P: AsRef<Path>>(
    data: &Dataset,
    y_column: &str,
    x_column: &str,
    opts: BarOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = Bar::horizontal(data, y_column, x_column, opts, theme)?;
    viz::render(&chart, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn sales() -> Dataset {
        Dataset::from_columns(vec![
            Column::text("city", ["Tokyo", "Osaka", "Kyoto", "Nara"]),
            Column::numeric("sales", [10.0, 30.0, 20.0, 5.0]),
            Column::text("region", ["east", "west", "west", "west"]),
        ])
        .unwrap()
    }

    #[test]
    fn vertical_categories_follow_descending_values() {
        let t = Theme::default();
        let b = Bar::vertical(&sales(), "sales", "city", BarOptions::default(), &t).unwrap();
        assert_eq!(b.categories().unwrap(), ["Osaka", "Kyoto", "Tokyo", "Nara"]);
        assert_eq!(b.title(), "city by sales");
    }

    #[test]
    fn horizontal_sorts_by_value_ascending() {
        let t = Theme::default();
        let b = Bar::horizontal(&sales(), "city", "sales", BarOptions::default(), &t).unwrap();
        assert_eq!(b.categories().unwrap(), ["Nara", "Tokyo", "Kyoto", "Osaka"]);
        assert_eq!(b.orientation(), Orientation::Horizontal);
    }

    #[test]
    fn hue_groups_share_one_category_axis() {
        let t = Theme::default();
        let opts = BarOptions {
            hue: Some("region".into()),
            ..BarOptions::default()
        };
        let b = Bar::vertical(&sales(), "sales", "city", opts, &t).unwrap();
        let groups: Vec<_> = b.groups().collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.label.as_deref(), Some("east"));
        // east is drawn first, so Tokyo takes position 0
        assert_eq!(groups[0].1[0].position, 0.0);
        assert_eq!(b.legend_items().len(), 2);
    }

    #[test]
    fn fill_parses() {
        assert_eq!("Semi".parse::<BarFill>().unwrap(), BarFill::Semi);
        assert!("dotted".parse::<BarFill>().is_err());
    }
}
