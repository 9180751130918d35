//! Pair plot: a grid of pairwise panels over numeric columns, with each
//! variable's distribution on the diagonal.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::coord::ranged1d::Ranged;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

use super::joint::{ColoredPoints, Marginal, density_fields, distributions, draw_contours, draw_hist2d, draw_marginal, strip_extent};
use super::{hue_legend, xy_points};
use crate::dataset::Dataset;
use crate::error::{NeonError, draw_err};
use crate::hue::{self, HueGroup};
use crate::stats::linear_fit;
use crate::theme::{DUSK, Palette, Rgb8, Theme};
use crate::viz::axes::{Axes2d, extent, format_tick, padded_range};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::markers::radius_for_area;
use crate::viz::text::max_text_width_px;
use crate::viz::{self, Chart};

const TICK_PX: u32 = 12;
const LABEL_PX: u32 = 18;
const TITLE_PX: u32 = 26;
const TICKS: usize = 5;
const CELL_MARGIN: u32 = 6;
/// KDE reach past the data on the diagonal and in `kde` panels.
const CUT: f64 = 3.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairKind {
    #[default]
    Scatter,
    /// Scatter with a least-squares line per group.
    Reg,
    Hist,
    Kde,
}

impl std::str::FromStr for PairKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scatter" => Ok(PairKind::Scatter),
            "reg" => Ok(PairKind::Reg),
            "hist" => Ok(PairKind::Hist),
            "kde" => Ok(PairKind::Kde),
            other => Err(format!("unknown pair kind `{other}` (scatter, reg, hist, kde)")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagKind {
    /// Histograms without hue, KDE curves with one.
    #[default]
    Auto,
    Hist,
    Kde,
}

impl std::str::FromStr for DiagKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(DiagKind::Auto),
            "hist" => Ok(DiagKind::Hist),
            "kde" => Ok(DiagKind::Kde),
            other => Err(format!("unknown diagonal kind `{other}` (auto, hist, kde)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PairOptions {
    pub title: Option<String>,
    pub hue: Option<String>,
    /// Hue values to draw, in legend and color order. Unlisted values are dropped.
    pub hue_order: Option<Vec<String>>,
    /// Columns to plot; `None` takes every numeric column except the hue.
    pub vars: Option<Vec<String>>,
    /// Columns across the grid, overriding `vars`.
    pub x_vars: Option<Vec<String>>,
    /// Columns down the grid, overriding `vars`.
    pub y_vars: Option<Vec<String>>,
    pub kind: PairKind,
    pub diag_kind: DiagKind,
    /// Draw only the lower triangle and the diagonal.
    pub corner: bool,
    pub s: f64,
    pub alpha: f64,
    /// Side of one panel in pixels.
    pub cell_px: u32,
    /// `None` uses the eight-color palette.
    pub palette: Option<Palette>,
}

impl Default for PairOptions {
    fn default() -> Self {
        Self {
            title: None,
            hue: None,
            hue_order: None,
            vars: None,
            x_vars: None,
            y_vars: None,
            kind: PairKind::Scatter,
            diag_kind: DiagKind::Auto,
            corner: false,
            s: 30.0,
            alpha: 0.8,
            cell_px: 250,
            palette: None,
        }
    }
}

pub struct Pair<'a> {
    theme: &'a Theme,
    opts: PairOptions,
    x_vars: Vec<String>,
    y_vars: Vec<String>,
    groups: Vec<HueGroup>,
    /// One point set per group for each panel, indexed `[row][col]`.
    panels: Vec<Vec<Vec<ColoredPoints>>>,
    x_ranges: Vec<Range<f64>>,
    y_ranges: Vec<Range<f64>>,
}

fn var_ranges(data: &Dataset, vars: &[String]) -> Result<Vec<Range<f64>>> {
    vars.iter()
        .map(|v| {
            let values = data.numeric(v)?;
            match extent(values.into_iter().flatten()) {
                Some((lo, hi)) => Ok(padded_range(lo, hi, 0.05)),
                None => Err(NeonError::EmptyData.into()),
            }
        })
        .collect()
}

impl<'a> Pair<'a> {
    pub fn new(data: &Dataset, opts: PairOptions, theme: &'a Theme) -> Result<Self> {
        let vars: Vec<String> = match &opts.vars {
            Some(v) => v.clone(),
            None => data
                .numeric_columns()
                .into_iter()
                .filter(|c| Some(*c) != opts.hue.as_deref())
                .map(str::to_string)
                .collect(),
        };
        let x_vars = opts.x_vars.clone().unwrap_or_else(|| vars.clone());
        let y_vars = opts.y_vars.clone().unwrap_or(vars);
        if x_vars.is_empty() || y_vars.is_empty() {
            return Err(NeonError::EmptyData.into());
        }
        let x_ranges = var_ranges(data, &x_vars)?;
        let y_ranges = var_ranges(data, &y_vars)?;

        let palette = opts.palette.clone().unwrap_or_else(Palette::neon_extended);
        let order: Vec<usize> = (0..data.len()).collect();
        let groups = match (opts.hue.as_deref(), &opts.hue_order) {
            (Some(hue), Some(hue_order)) => hue::partition_ordered(data, hue, hue_order, &palette, &order)?,
            (None, Some(_)) => {
                return Err(NeonError::InvalidInput("hue_order needs a hue column".into()).into());
            }
            (hue, None) => hue::partition(data, hue, &palette, &order)?,
        };

        let mut panels = Vec::with_capacity(y_vars.len());
        for y in &y_vars {
            let mut row = Vec::with_capacity(x_vars.len());
            for x in &x_vars {
                let mut sets = Vec::with_capacity(groups.len());
                for g in &groups {
                    sets.push((g.color, xy_points(data, &g.rows, x, y)?));
                }
                row.push(sets);
            }
            panels.push(row);
        }

        Ok(Self {
            theme,
            opts,
            x_vars,
            y_vars,
            groups,
            panels,
            x_ranges,
            y_ranges,
        })
    }

    /// Columns across the grid.
    pub fn x_vars(&self) -> &[String] {
        &self.x_vars
    }

    /// Columns down the grid.
    pub fn y_vars(&self) -> &[String] {
        &self.y_vars
    }

    /// Only a grid with the same variables both ways has a diagonal.
    pub fn is_square(&self) -> bool {
        self.x_vars == self.y_vars
    }

    pub fn diag_kind(&self) -> DiagKind {
        match (self.opts.diag_kind, &self.opts.hue) {
            (DiagKind::Auto, None) => DiagKind::Hist,
            (DiagKind::Auto, Some(_)) => DiagKind::Kde,
            (k, _) => k,
        }
    }

    /// `(row, col)` of every panel that gets drawn.
    /// `corner` only trims square grids.
    pub fn visible_panels(&self) -> Vec<(usize, usize)> {
        let (rows, cols) = (self.y_vars.len(), self.x_vars.len());
        let corner = self.opts.corner && self.is_square();
        (0..rows)
            .flat_map(|i| (0..cols).map(move |j| (i, j)))
            .filter(|&(i, j)| !corner || j <= i)
            .collect()
    }

    /// Points of the panel with `x_vars[col]` across and `y_vars[row]` up.
    pub fn panel(&self, row: usize, col: usize) -> &[ColoredPoints] {
        &self.panels[row][col]
    }

    /// Distributions of `x_vars[idx]` for the diagonal panel of a square grid.
    pub fn diagonal(&self, idx: usize) -> Vec<Marginal> {
        let values: Vec<(Rgb8, Vec<f64>)> = self.panels[idx][idx]
            .iter()
            .map(|(c, p)| (*c, p.iter().map(|q| q.0).collect()))
            .collect();
        distributions(&values, &self.x_ranges[idx], self.diag_kind() == DiagKind::Kde, false)
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let glyph = match self.opts.kind {
            PairKind::Hist => Glyph::Patch,
            PairKind::Kde => Glyph::Line,
            _ => Glyph::Dot,
        };
        hue_legend(&self.groups, glyph)
    }

    fn gutters(&self) -> (u32, u32) {
        let ticks = self
            .x_ranges
            .iter()
            .chain(&self.y_ranges)
            .flat_map(|r| [format_tick(r.start), format_tick(r.end)])
            .collect::<Vec<_>>();
        let left = max_text_width_px(ticks.iter().map(String::as_str), TICK_PX) + 12 + LABEL_PX;
        let bottom = TICK_PX + 12 + LABEL_PX + 8;
        (left, bottom)
    }

    fn draw_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        (row, col): (usize, usize),
        family: FontFamily<'_>,
    ) -> Result<()> {
        let x_range = self.x_ranges[col].clone();
        let diagonal = (self.is_square() && row == col).then(|| self.diagonal(col));
        let y_range = match &diagonal {
            Some(ms) => 0.0..strip_extent(ms),
            None => self.y_ranges[row].clone(),
        };
        let (left, bottom) = self.gutters();
        let mut chart = ChartBuilder::on(area)
            .margin(CELL_MARGIN)
            .x_label_area_size(bottom)
            .y_label_area_size(left)
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(draw_err)?;

        let font = self.theme.font_color.rgb();
        let axis = ShapeStyle {
            color: self.theme.font_color.with_alpha(0.6),
            filled: false,
            stroke_width: 1,
        };
        let fmt = |v: &f64| format_tick(*v);
        let x_desc = if row + 1 == self.y_vars.len() { self.x_vars[col].as_str() } else { "" };
        let y_desc = if col == 0 { self.y_vars[row].as_str() } else { "" };
        chart
            .configure_mesh()
            .disable_mesh()
            .axis_style(axis)
            .label_style(TextStyle::from((family, TICK_PX)).color(&font))
            .axis_desc_style(TextStyle::from((family, LABEL_PX)).color(&font))
            .x_labels(TICKS)
            .y_labels(TICKS)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_label_formatter(&fmt)
            .y_label_formatter(&fmt)
            .draw()
            .map_err(draw_err)?;
        dotted_grid(&mut chart)?;

        if let Some(ms) = diagonal {
            let fill_alpha = if self.opts.hue.is_some() { 0.5 } else { 0.75 };
            for m in &ms {
                draw_marginal(chart.plotting_area(), m, false, fill_alpha)?;
            }
            return Ok(());
        }

        let sets = self.panel(row, col);
        match self.opts.kind {
            PairKind::Scatter | PairKind::Reg => {
                let r = radius_for_area(self.opts.s);
                for (color, pts) in sets {
                    let style = color.with_alpha(self.opts.alpha).filled();
                    chart
                        .draw_series(pts.iter().map(|&p| Circle::new(p, r, style)))
                        .map_err(draw_err)?;
                }
                if self.opts.kind == PairKind::Reg {
                    for (color, pts) in sets {
                        let Some((m, b)) = linear_fit(pts) else { continue };
                        let line = vec![(x_range.start, m * x_range.start + b), (x_range.end, m * x_range.end + b)];
                        chart
                            .draw_series(LineSeries::new(line, color.rgb().stroke_width(2)))
                            .map_err(draw_err)?;
                    }
                }
            }
            PairKind::Hist => draw_hist2d(&mut chart, sets)?,
            PairKind::Kde => draw_contours(&mut chart, &density_fields(sets, CUT))?,
        }
        Ok(())
    }
}

/// Dotted grid lines at the tick positions.
fn dotted_grid<DB: DrawingBackend>(chart: &mut Axes2d<'_, DB>) -> Result<()> {
    let style = DUSK.rgb().stroke_width(1);
    let (xr, yr) = (chart.x_range(), chart.y_range());
    let xs = chart.as_coord_spec().x_spec().key_points(TICKS);
    let ys = chart.as_coord_spec().y_spec().key_points(TICKS);
    for x in xs {
        chart
            .draw_series(DashedLineSeries::new(vec![(x, yr.start), (x, yr.end)], 2, 4, style))
            .map_err(draw_err)?;
    }
    for y in ys {
        chart
            .draw_series(DashedLineSeries::new(vec![(xr.start, y), (xr.end, y)], 2, 4, style))
            .map_err(draw_err)?;
    }
    Ok(())
}

impl Chart for Pair<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn size(&self) -> (u32, u32) {
        let grid_w = self.x_vars.len() as u32 * self.opts.cell_px;
        let grid_h = self.y_vars.len() as u32 * self.opts.cell_px;
        let items = self.legend_items();
        let legend_w = if items.is_empty() {
            0
        } else {
            legend::panel_width_px(&items, grid_w + 200)
        };
        let title_h = if self.opts.title.is_some() { TITLE_PX * 3 } else { 0 };
        (grid_w + legend_w, grid_h + title_h)
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let font = self.theme.font_color.rgb();
        let body = match self.opts.title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => canvas
                .titled(title, TextStyle::from((family, TITLE_PX)).color(&font))
                .map_err(draw_err)?,
            None => canvas.clone(),
        };
        let items = self.legend_items();
        let (grid, legend_area) = legend::split_for_legend(&body, &items);

        let cols = self.x_vars.len();
        let cells = grid.split_evenly((self.y_vars.len(), cols));
        for (row, col) in self.visible_panels() {
            self.draw_panel(&cells[row * cols + col], (row, col), family)?;
        }

        if let Some(panel) = legend_area.as_ref() {
            let (_, top) = grid.get_base_pixel();
            let (_, panel_y) = panel.get_base_pixel();
            legend::draw_legend_panel(panel, &items, family, top + CELL_MARGIN as i32 - panel_y)?;
        }
        Ok(())
    }
}

pub fn pairplot<P: AsRef<Path>>(data: &Dataset, opts: PairOptions, theme: &Theme, out: P) -> Result<()> {
    let chart = Pair::new(data, opts, theme)?;
    viz::render(&chart, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn iris() -> Dataset {
        let n = 24;
        Dataset::from_columns(vec![
            Column::numeric("sepal", (0..n).map(|i| 4.0 + (i % 7) as f64 * 0.3)),
            Column::numeric("petal", (0..n).map(|i| 1.0 + (i * 5 % 9) as f64 * 0.4)),
            Column::text("species", (0..n).map(|i| ["setosa", "virginica", "versicolor"][i % 3])),
            Column::numeric("width", (0..n).map(|i| (i * 3 % 5) as f64)),
        ])
        .unwrap()
    }

    #[test]
    fn numeric_columns_become_vars_minus_hue() {
        let t = Theme::default();
        let p = Pair::new(&iris(), PairOptions::default(), &t).unwrap();
        assert_eq!(p.x_vars(), ["sepal", "petal", "width"]);
        assert_eq!(p.y_vars(), p.x_vars());
        assert_eq!(p.visible_panels().len(), 9);
        assert_eq!(p.diag_kind(), DiagKind::Hist);
        assert_eq!(p.size(), (750, 750));
    }

    #[test]
    fn corner_keeps_the_lower_triangle() {
        let t = Theme::default();
        let opts = PairOptions {
            corner: true,
            ..PairOptions::default()
        };
        let p = Pair::new(&iris(), opts, &t).unwrap();
        let panels = p.visible_panels();
        assert_eq!(panels.len(), 6);
        assert!(panels.iter().all(|(i, j)| j <= i));
    }

    #[test]
    fn hue_switches_diagonal_to_kde_and_splits_panels() {
        let t = Theme::default();
        let opts = PairOptions {
            hue: Some("species".into()),
            vars: Some(vec!["sepal".into(), "petal".into()]),
            ..PairOptions::default()
        };
        let p = Pair::new(&iris(), opts, &t).unwrap();
        assert_eq!(p.diag_kind(), DiagKind::Kde);
        assert_eq!(p.panel(1, 0).len(), 3);
        assert_eq!(p.panel(1, 0)[2].0, Palette::neon_extended().pick(2));
        assert_eq!(p.panel(1, 0)[0].1.len(), 8);
        assert!(p.diagonal(0).iter().all(|m| matches!(m, Marginal::Kde { .. })));
        assert_eq!(p.legend_items().len(), 3);
    }

    #[test]
    fn text_vars_are_rejected() {
        let t = Theme::default();
        let opts = PairOptions {
            vars: Some(vec!["species".into()]),
            ..PairOptions::default()
        };
        assert!(Pair::new(&iris(), opts, &t).is_err());
    }

    #[test]
    fn kinds_parse() {
        assert_eq!("reg".parse::<PairKind>().unwrap(), PairKind::Reg);
        assert_eq!("KDE".parse::<DiagKind>().unwrap(), DiagKind::Kde);
        assert!("hex".parse::<PairKind>().is_err());
    }

    #[test]
    fn separate_x_and_y_vars_make_a_rectangular_grid() {
        let t = Theme::default();
        let opts = PairOptions {
            x_vars: Some(vec!["sepal".into(), "petal".into(), "width".into()]),
            y_vars: Some(vec!["petal".into()]),
            corner: true,
            ..PairOptions::default()
        };
        let p = Pair::new(&iris(), opts, &t).unwrap();
        assert!(!p.is_square());
        // corner has no effect without a diagonal
        assert_eq!(p.visible_panels(), vec![(0, 0), (0, 1), (0, 2)]);
        assert_eq!(p.size(), (750, 250));
        let sepal_vs_petal = &p.panel(0, 0)[0].1;
        assert_eq!(sepal_vs_petal[1], (4.0 + 0.3, 1.0 + 5.0 * 0.4));
    }

    #[test]
    fn hue_order_sets_groups_and_colors() {
        let t = Theme::default();
        let opts = PairOptions {
            hue: Some("species".into()),
            hue_order: Some(vec!["versicolor".into(), "setosa".into()]),
            vars: Some(vec!["sepal".into()]),
            ..PairOptions::default()
        };
        let p = Pair::new(&iris(), opts, &t).unwrap();
        let labels: Vec<String> = p.legend_items().into_iter().map(|i| i.label).collect();
        assert_eq!(labels, ["versicolor", "setosa"]);
        assert_eq!(p.panel(0, 0)[0].0, Palette::neon_extended().pick(0));
        assert_eq!(p.panel(0, 0).len(), 2);

        let opts = PairOptions {
            hue_order: Some(vec!["setosa".into()]),
            ..PairOptions::default()
        };
        assert!(Pair::new(&iris(), opts, &t).is_err());
    }
}
