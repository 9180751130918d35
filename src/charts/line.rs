//! Line chart, one glowing line per hue group.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::{Categories, ChartText, hue_legend};
use crate::annotation;
use crate::dataset::Dataset;
use crate::error::{NeonError, draw_err};
use crate::glow::GlowSpec;
use crate::hue::{self, HueGroup};
use crate::theme::{LineDash, MarkerShape, Theme};
use crate::viz::axes::{self, Axes2d, AxesSpec, extent, padded_range};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::markers::draw_marker;
use crate::viz::{self, Chart};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineOptions {
    pub text: ChartText,
    pub hue: Option<String>,
    pub dash: LineDash,
    pub marker: Option<MarkerShape>,
}

pub struct Line<'a> {
    theme: &'a Theme,
    x: String,
    y: String,
    opts: LineOptions,
    categories: Option<Categories>,
    groups: Vec<(HueGroup, Vec<(f64, f64)>)>,
}

impl<'a> Line<'a> {
    /// Rows with a missing `x`, `y` or hue cell are dropped. Numeric `x` is
    /// drawn in ascending order; text `x` becomes categories in row order.
    pub fn new(
        data: &Dataset,
        y_column: &str,
        x_column: &str,
        opts: LineOptions,
        theme: &'a Theme,
    ) -> Result<Self> {
        let ys = data.numeric(y_column)?;
        let xcol = data.column(x_column)?;
        let numeric_x = xcol.is_numeric();
        let order: Vec<usize> = if numeric_x {
            data.sorted_rows(x_column, false)?
        } else {
            (0..data.len()).collect()
        };

        let mut categories = Categories::new();
        let mut groups = Vec::new();
        for g in hue::partition(data, opts.hue.as_deref(), &theme.palette, &order)? {
            let mut pts = Vec::with_capacity(g.rows.len());
            for &row in &g.rows {
                let Some(y) = ys[row] else { continue };
                let cell = &xcol.values[row];
                let x = if numeric_x {
                    cell.as_f64()
                } else {
                    cell.label().map(|l| categories.intern(&l) as f64)
                };
                if let Some(x) = x {
                    pts.push((x, y));
                }
            }
            groups.push((g, pts));
        }
        if groups.iter().all(|(_, p)| p.is_empty()) {
            return Err(NeonError::EmptyData.into());
        }
        Ok(Self {
            theme,
            x: x_column.to_string(),
            y: y_column.to_string(),
            opts,
            categories: (!numeric_x).then_some(categories),
            groups,
        })
    }

    pub fn title(&self) -> String {
        self.opts.text.title_or(|| format!("{} by {}", self.x, self.y))
    }

    pub fn series(&self) -> impl Iterator<Item = (&HueGroup, &[(f64, f64)])> {
        self.groups.iter().map(|(g, p)| (g, p.as_slice()))
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let groups: Vec<HueGroup> = self.groups.iter().map(|(g, _)| g.clone()).collect();
        hue_legend(&groups, Glyph::Line)
    }
}

fn stroke<DB: DrawingBackend>(
    chart: &mut Axes2d<'_, DB>,
    pts: &[(f64, f64)],
    dash: LineDash,
    style: ShapeStyle,
) -> Result<()> {
    let pts = pts.to_vec();
    match dash {
        LineDash::Solid => chart.draw_series(LineSeries::new(pts, style)).map(|_| ()),
        LineDash::Dash => chart
            .draw_series(DashedLineSeries::new(pts, 12, 8, style))
            .map(|_| ()),
        LineDash::Dot => chart
            .draw_series(DashedLineSeries::new(pts, 2, 6, style))
            .map(|_| ()),
    }
    .map_err(draw_err)
}

impl Chart for Line<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let items = self.legend_items();
        let (plot, legend_area) = legend::split_for_legend(canvas, &items);

        let all = || self.groups.iter().flat_map(|(_, p)| p.iter());
        let (x0, x1) = extent(all().map(|p| p.0)).ok_or(NeonError::EmptyData)?;
        let (y0, y1) = extent(all().map(|p| p.1)).ok_or(NeonError::EmptyData)?;

        let title = self.title();
        let x_desc = self.opts.text.x_label(&self.x);
        let y_desc = self.opts.text.y_label(&self.y);
        let x_range = match &self.categories {
            Some(_) => (x0 - 0.5)..(x1 + 0.5),
            None => padded_range(x0, x1, 0.05),
        };
        let mut spec = AxesSpec::new(x_range, padded_range(y0, y1, 0.05));
        spec.title = Some(&title);
        spec.x_desc = &x_desc;
        spec.y_desc = &y_desc;
        spec.x_categories = self.categories.as_ref().map(Categories::labels);
        let mut chart = axes::build(&plot, self.theme, family, &spec)?;

        let dash = self.opts.dash;
        for (g, pts) in &self.groups {
            stroke(&mut chart, pts, dash, g.color.rgb().stroke_width(2))?;
            if let Some(marker) = self.opts.marker {
                for &p in pts {
                    draw_marker(chart.plotting_area(), p, 4, g.color.rgb().filled(), marker)?;
                }
            }
        }
        GlowSpec::OUTLINE.apply(|layer| {
            for (g, pts) in &self.groups {
                stroke(&mut chart, pts, dash, layer.stroke(g.color))?;
            }
            Ok(())
        })?;

        let note = self.opts.text.annotation(1.15, -0.2, annotation::NARROW);
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

pub fn line<P: AsRef<Path>>(
    data: &Dataset,
    y_column: &str,
    x_column: &str,
    opts: LineOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = Line::new(data, y_column, x_column, opts, theme)?;
    viz::render(&chart, out)
}
