//! Joint plot: a bivariate main panel with the marginal distributions of
//! x on top and y on the right.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

use super::density::{Field, HexGrid, hist2d};
use super::{ChartText, hue_legend, xy_points};
use crate::annotation;
use crate::dataset::Dataset;
use crate::error::{NeonError, draw_err};
use crate::hue::{self, HueGroup};
use crate::stats::{Histogram, Kde, Kde2d, auto_bins, freedman_diaconis_bins, linear_fit};
use crate::theme::{BLACK, DEEP_NIGHT, MarkerShape, Palette, Rgb8, Theme};
use crate::viz::axes::{self, Axes2d, TICK_PX, extent, format_tick, padded_range};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::markers::{draw_marker, radius_for_area};
use crate::viz::{self, Chart};

pub(crate) type Area<DB> = DrawingArea<DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const MARGIN: u32 = 16;
const LABEL_PX: u32 = 16;
/// Samples per axis of the bivariate density grid.
const GRID: usize = 100;
const LEVELS: usize = 8;
const CURVE_POINTS: usize = 200;
const MAX_BINS_2D: usize = 50;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    #[default]
    Scatter,
    /// Iso-density lines of a bivariate KDE.
    Kde,
    /// Two-dimensional histogram.
    Hist,
    /// Hexagonal binning.
    Hex,
    /// Scatter with a least-squares line.
    Reg,
    /// Residuals of the least-squares line.
    Resid,
}

impl JointKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JointKind::Scatter => "scatter",
            JointKind::Kde => "kde",
            JointKind::Hist => "hist",
            JointKind::Hex => "hex",
            JointKind::Reg => "reg",
            JointKind::Resid => "resid",
        }
    }

    fn supports_hue(self) -> bool {
        matches!(self, JointKind::Scatter | JointKind::Kde | JointKind::Hist)
    }
}

impl std::str::FromStr for JointKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scatter" => Ok(JointKind::Scatter),
            "kde" => Ok(JointKind::Kde),
            "hist" => Ok(JointKind::Hist),
            "hex" => Ok(JointKind::Hex),
            "reg" => Ok(JointKind::Reg),
            "resid" => Ok(JointKind::Resid),
            other => Err(format!(
                "unknown joint kind `{other}` (scatter, kde, hist, hex, reg, resid)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JointOptions {
    /// The title, when given, sits above the whole grid.
    pub text: ChartText,
    pub hue: Option<String>,
    pub kind: JointKind,
    /// Marker area of scatter points.
    pub s: f64,
    pub alpha: f64,
    /// Joint panel size relative to the marginal strips.
    pub ratio: u32,
    /// Gap between the joint panel and the strips, as a fraction of a strip.
    pub space: f64,
    /// 1-based palette color used when there is no hue.
    pub num: usize,
    /// KDE grid reach past the data, in bandwidths.
    pub cut: f64,
    pub marker: Option<MarkerShape>,
    /// Side of the square figure in pixels.
    pub size: u32,
    /// `None` uses the eight-color palette.
    pub palette: Option<Palette>,
}

impl Default for JointOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            hue: None,
            kind: JointKind::Scatter,
            s: 60.0,
            alpha: 0.6,
            ratio: 6,
            space: 0.2,
            num: 1,
            cut: 5.0,
            marker: None,
            size: 800,
            palette: None,
        }
    }
}

/// What one group contributes to one marginal strip.
#[derive(Clone, Debug, PartialEq)]
pub enum Marginal {
    /// Counts, with a KDE scaled to counts for `reg`.
    Hist {
        color: Rgb8,
        histogram: Histogram,
        kde: Vec<(f64, f64)>,
    },
    Kde { color: Rgb8, curve: Vec<(f64, f64)> },
}

impl Marginal {
    pub fn peak(&self) -> f64 {
        match self {
            Marginal::Hist { histogram, kde, .. } => kde
                .iter()
                .map(|p| p.1)
                .fold(histogram.max_height(), f64::max),
            Marginal::Kde { curve, .. } => curve.iter().map(|p| p.1).fold(0.0, f64::max),
        }
    }
}

pub struct Joint<'a> {
    theme: &'a Theme,
    x: String,
    y: String,
    opts: JointOptions,
    groups: Vec<(HueGroup, Vec<(f64, f64)>)>,
    fit: Option<(f64, f64)>,
}

impl<'a> Joint<'a> {
    pub fn new(
        data: &Dataset,
        x_column: &str,
        y_column: &str,
        opts: JointOptions,
        theme: &'a Theme,
    ) -> Result<Self> {
        if opts.num == 0 {
            return Err(NeonError::InvalidInput("num is 1-based".into()).into());
        }
        if opts.hue.is_some() && !opts.kind.supports_hue() {
            return Err(NeonError::InvalidInput(format!(
                "hue is not supported with kind `{}`",
                opts.kind.as_str()
            ))
            .into());
        }
        let palette = opts.palette.clone().unwrap_or_else(Palette::neon_extended);
        let palette = match opts.hue {
            Some(_) => palette,
            None => Palette(vec![palette.pick(opts.num - 1)]),
        };

        let order: Vec<usize> = (0..data.len()).collect();
        let mut groups = Vec::new();
        for g in hue::partition(data, opts.hue.as_deref(), &palette, &order)? {
            let pts = xy_points(data, &g.rows, x_column, y_column)?;
            groups.push((g, pts));
        }
        if groups.iter().all(|(_, p)| p.is_empty()) {
            return Err(NeonError::EmptyData.into());
        }

        let fit = match opts.kind {
            JointKind::Reg | JointKind::Resid => {
                let all: Vec<(f64, f64)> = groups.iter().flat_map(|(_, p)| p.iter().copied()).collect();
                linear_fit(&all)
            }
            _ => None,
        };
        if opts.kind == JointKind::Resid && fit.is_none() {
            return Err(NeonError::InvalidInput("residuals need two distinct x values".into()).into());
        }

        Ok(Self {
            theme,
            x: x_column.to_string(),
            y: y_column.to_string(),
            opts,
            groups,
            fit,
        })
    }

    pub fn kind(&self) -> JointKind {
        self.opts.kind
    }

    /// Slope and intercept for `reg` and `resid`.
    pub fn fit(&self) -> Option<(f64, f64)> {
        self.fit
    }

    /// Points as drawn in the joint panel: residuals for `resid`, the data
    /// otherwise.
    pub fn points(&self) -> Vec<(&HueGroup, Vec<(f64, f64)>)> {
        self.groups
            .iter()
            .map(|(g, pts)| {
                let pts = match (self.opts.kind, self.fit) {
                    (JointKind::Resid, Some((m, b))) => pts.iter().map(|&(x, y)| (x, y - (m * x + b))).collect(),
                    _ => pts.clone(),
                };
                (g, pts)
            })
            .collect()
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let glyph = match self.opts.kind {
            JointKind::Kde => Glyph::Line,
            JointKind::Hist => Glyph::Patch,
            _ => Glyph::Dot,
        };
        let groups: Vec<HueGroup> = self.groups.iter().map(|(g, _)| g.clone()).collect();
        hue_legend(&groups, glyph)
    }

    /// Bivariate densities per group on a grid reaching `cut` bandwidths
    /// past the data. Empty unless the kind is `kde`.
    pub fn density_fields(&self) -> Vec<(Rgb8, Field)> {
        if self.opts.kind != JointKind::Kde {
            return Vec::new();
        }
        density_fields(&self.colored(), self.opts.cut)
    }

    fn colored(&self) -> Vec<ColoredPoints> {
        self.points().into_iter().map(|(g, p)| (g.color, p)).collect()
    }

    pub fn ranges(&self) -> (Range<f64>, Range<f64>) {
        self.ranges_with(&self.density_fields())
    }

    /// Data extent, widened to the outermost iso-line for `kde`.
    fn ranges_with(&self, fields: &[(Rgb8, Field)]) -> (Range<f64>, Range<f64>) {
        let pts = self.points();
        let mut xs: Vec<f64> = pts.iter().flat_map(|(_, p)| p.iter().map(|q| q.0)).collect();
        let mut ys: Vec<f64> = pts.iter().flat_map(|(_, p)| p.iter().map(|q| q.1)).collect();
        for (_, f) in fields {
            if let Some(&lowest) = f.levels(LEVELS).first()
                && let Some(((x0, x1), (y0, y1))) = f.extent_above(lowest)
            {
                xs.extend([x0, x1]);
                ys.extend([y0, y1]);
            }
        }
        if self.opts.kind == JointKind::Resid {
            ys.push(0.0);
        }
        let range = |v: Vec<f64>| match extent(v) {
            Some((lo, hi)) => padded_range(lo, hi, 0.05),
            None => 0.0..1.0,
        };
        (range(xs), range(ys))
    }

    /// Marginal distributions of x and of y, one entry per non-empty group.
    pub fn marginals(&self, x_range: &Range<f64>, y_range: &Range<f64>) -> (Vec<Marginal>, Vec<Marginal>) {
        let pts = self.points();
        let kde_only = match self.opts.kind {
            JointKind::Kde => true,
            JointKind::Scatter => self.opts.hue.is_some(),
            _ => false,
        };
        let with_kde = self.opts.kind == JointKind::Reg;
        let axis = |sel: fn(&(f64, f64)) -> f64| -> Vec<(Rgb8, Vec<f64>)> {
            pts.iter()
                .map(|(g, p)| (g.color, p.iter().map(sel).collect()))
                .collect()
        };
        (
            distributions(&axis(|p| p.0), x_range, kde_only, with_kde),
            distributions(&axis(|p| p.1), y_range, kde_only, with_kde),
        )
    }

    fn draw_points<DB: DrawingBackend>(&self, chart: &mut Axes2d<'_, DB>) -> Result<()> {
        let r = radius_for_area(self.opts.s);
        for (g, pts) in self.points() {
            let fill = g.color.with_alpha(self.opts.alpha).filled();
            match self.opts.marker {
                Some(shape) => {
                    for &p in &pts {
                        draw_marker(chart.plotting_area(), p, r, fill, shape)?;
                    }
                }
                None => {
                    let edge = g.color.rgb().stroke_width(1);
                    chart
                        .draw_series(pts.iter().map(|&p| Circle::new(p, r, fill)))
                        .map_err(draw_err)?;
                    chart
                        .draw_series(pts.iter().map(|&p| Circle::new(p, r, edge)))
                        .map_err(draw_err)?;
                }
            }
        }
        Ok(())
    }

    fn draw_joint<DB: DrawingBackend>(
        &self,
        chart: &mut Axes2d<'_, DB>,
        fields: &[(Rgb8, Field)],
        x: &Range<f64>,
    ) -> Result<()> {
        match self.opts.kind {
            JointKind::Scatter => self.draw_points(chart)?,
            JointKind::Reg => {
                self.draw_points(chart)?;
                if let (Some((m, b)), Some((g, _))) = (self.fit, self.groups.first()) {
                    let line = vec![(x.start, m * x.start + b), (x.end, m * x.end + b)];
                    chart
                        .draw_series(LineSeries::new(line, g.color.rgb().stroke_width(2)))
                        .map_err(draw_err)?;
                }
            }
            JointKind::Resid => {
                self.draw_points(chart)?;
                let zero = ShapeStyle {
                    color: self.theme.font_color.with_alpha(0.6),
                    filled: false,
                    stroke_width: 1,
                };
                chart
                    .draw_series(DashedLineSeries::new(vec![(x.start, 0.0), (x.end, 0.0)], 2, 6, zero))
                    .map_err(draw_err)?;
            }
            JointKind::Kde => draw_contours(chart, fields)?,
            JointKind::Hist => draw_hist2d(chart, &self.colored())?,
            JointKind::Hex => self.draw_hexbin(chart)?,
        }
        Ok(())
    }

    fn draw_hexbin<DB: DrawingBackend>(&self, chart: &mut Axes2d<'_, DB>) -> Result<()> {
        let colored = self.colored();
        let (xr, yr) = bin_ranges(&colored);
        for (color, p) in colored {
            let xs: Vec<f64> = p.iter().map(|q| q.0).collect();
            let ys: Vec<f64> = p.iter().map(|q| q.1).collect();
            let gridsize = (freedman_diaconis_bins(&xs).min(MAX_BINS_2D) + freedman_diaconis_bins(&ys).min(MAX_BINS_2D)) / 2;
            let grid = HexGrid::new(&xr, &yr, gridsize);
            let cells = grid.bin(&p);
            let max = cells.iter().map(|c| c.count).max().unwrap_or(0) as f64;
            if max == 0.0 {
                continue;
            }
            chart
                .draw_series(cells.iter().map(|c| {
                    let style = color.with_alpha(0.15 + 0.85 * c.count as f64 / max).filled();
                    Polygon::new(grid.hexagon(c.center), style)
                }))
                .map_err(draw_err)?;
        }
        Ok(())
    }
}

/// A group color with the points drawn in it.
pub type ColoredPoints = (Rgb8, Vec<(f64, f64)>);

/// Bivariate densities per group on a shared grid reaching `cut`
/// bandwidths past the data. Groups without spread are skipped.
pub(crate) fn density_fields(groups: &[ColoredPoints], cut: f64) -> Vec<(Rgb8, Field)> {
    let all: Vec<(f64, f64)> = groups.iter().flat_map(|(_, p)| p.iter().copied()).collect();
    let support = |sel: fn(&(f64, f64)) -> f64| {
        let v: Vec<f64> = all.iter().map(sel).collect();
        Kde::silverman(&v)
            .and_then(|k| k.support(cut))
            .or_else(|| extent(v))
    };
    let (Some(xr), Some(yr)) = (support(|p| p.0), support(|p| p.1)) else {
        return Vec::new();
    };
    groups
        .iter()
        .filter_map(|(color, p)| {
            let Some(kde) = Kde2d::silverman(p) else {
                log::debug!("bivariate kde skipped for a group without spread");
                return None;
            };
            let z = kde.grid(xr, yr, GRID, GRID);
            Some((*color, Field::new(xr.0..xr.1, yr.0..yr.1, z)))
        })
        .collect()
}

/// Iso-lines, more opaque towards the peak.
pub(crate) fn draw_contours<DB: DrawingBackend>(chart: &mut Axes2d<'_, DB>, fields: &[(Rgb8, Field)]) -> Result<()> {
    for (color, field) in fields {
        for (k, level) in field.levels(LEVELS).into_iter().enumerate() {
            let alpha = 0.3 + 0.7 * (k + 1) as f64 / LEVELS as f64;
            let style = color.with_alpha(alpha).stroke_width(1);
            chart
                .draw_series(field.contour(level).into_iter().map(|s| PathElement::new(s.to_vec(), style)))
                .map_err(draw_err)?;
        }
    }
    Ok(())
}

/// Data extents used for 2D binning, widened when degenerate.
fn bin_ranges(groups: &[ColoredPoints]) -> (Range<f64>, Range<f64>) {
    let span = |v: Vec<f64>| match extent(v) {
        Some((lo, hi)) if lo < hi => lo..hi,
        Some((v, _)) => (v - 0.5)..(v + 0.5),
        None => 0.0..1.0,
    };
    (
        span(groups.iter().flat_map(|(_, p)| p.iter().map(|q| q.0)).collect()),
        span(groups.iter().flat_map(|(_, p)| p.iter().map(|q| q.1)).collect()),
    )
}

/// Two-dimensional histograms on bins shared by all groups; cell opacity
/// follows the count relative to the group's fullest cell.
pub(crate) fn draw_hist2d<DB: DrawingBackend>(chart: &mut Axes2d<'_, DB>, groups: &[ColoredPoints]) -> Result<()> {
    let (xr, yr) = bin_ranges(groups);
    let all = |sel: fn(&(f64, f64)) -> f64| -> Vec<f64> { groups.iter().flat_map(|(_, p)| p.iter().map(sel)).collect() };
    let nx = auto_bins(&all(|p| p.0)).min(MAX_BINS_2D);
    let ny = auto_bins(&all(|p| p.1)).min(MAX_BINS_2D);
    let (wx, wy) = ((xr.end - xr.start) / nx as f64, (yr.end - yr.start) / ny as f64);
    for (color, p) in groups {
        let counts = hist2d(p, nx, ny, &xr, &yr);
        let max = counts.iter().flatten().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            continue;
        }
        let cells = counts.iter().enumerate().flat_map(|(j, row)| {
            row.iter().enumerate().filter(|(_, c)| **c > 0.0).map(move |(i, c)| {
                let x0 = xr.start + wx * i as f64;
                let y0 = yr.start + wy * j as f64;
                let style = color.with_alpha(0.15 + 0.85 * c / max).filled();
                Rectangle::new([(x0, y0), (x0 + wx, y0 + wy)], style)
            })
        });
        chart.draw_series(cells).map_err(draw_err)?;
    }
    Ok(())
}

/// One distribution per non-empty group: KDE curves over `range`, or
/// histograms on bins shared by all groups (plus a KDE scaled to counts
/// when `with_kde`).
pub(crate) fn distributions(
    groups: &[(Rgb8, Vec<f64>)],
    range: &Range<f64>,
    kde_only: bool,
    with_kde: bool,
) -> Vec<Marginal> {
    let all: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
    let bins = auto_bins(&all);
    let span = match extent(all.iter().copied()) {
        Some((lo, hi)) if lo < hi => (lo, hi),
        Some((v, _)) => (v - 0.5, v + 0.5),
        None => return Vec::new(),
    };
    let bin_width = (span.1 - span.0) / bins as f64;
    groups
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .filter_map(|(color, v)| {
            let color = *color;
            if kde_only {
                let Some(kde) = Kde::silverman(v) else {
                    log::debug!("kde skipped for a group without spread");
                    return None;
                };
                return Some(Marginal::Kde {
                    color,
                    curve: kde.curve_over(range.start, range.end, CURVE_POINTS),
                });
            }
            let histogram = Histogram::with_range(v, bins, span, false, false);
            let kde = match (with_kde, Kde::silverman(v)) {
                (true, Some(k)) => {
                    let scale = v.len() as f64 * bin_width;
                    k.curve_over(range.start, range.end, CURVE_POINTS)
                        .into_iter()
                        .map(|(x, d)| (x, d * scale))
                        .collect()
                }
                _ => Vec::new(),
            };
            Some(Marginal::Hist { color, histogram, kde })
        })
        .collect()
}

/// Draw one marginal; `along_y` lays the distribution against the y axis.
pub(crate) fn draw_marginal<DB: DrawingBackend>(plot: &Area<DB>, m: &Marginal, along_y: bool, fill_alpha: f64) -> Result<()> {
    let at = |pos: f64, h: f64| if along_y { (h, pos) } else { (pos, h) };
    match m {
        Marginal::Hist { color, histogram, kde } => {
            let edge = BLACK.rgb().stroke_width(1);
            for (l, r, h) in histogram.bins().filter(|b| b.2 > 0.0) {
                let rect = [at(l, 0.0), at(r, h)];
                plot.draw(&Rectangle::new(rect, color.with_alpha(fill_alpha).filled()))
                    .map_err(draw_err)?;
                plot.draw(&Rectangle::new(rect, edge)).map_err(draw_err)?;
            }
            if !kde.is_empty() {
                let pts: Vec<(f64, f64)> = kde.iter().map(|&(x, d)| at(x, d)).collect();
                plot.draw(&PathElement::new(pts, color.rgb().stroke_width(2)))
                    .map_err(draw_err)?;
            }
        }
        Marginal::Kde { color, curve } => {
            let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
                return Ok(());
            };
            let mut area = vec![at(first.0, 0.0)];
            area.extend(curve.iter().map(|&(x, d)| at(x, d)));
            area.push(at(last.0, 0.0));
            plot.draw(&Polygon::new(area, color.with_alpha(0.25).filled()))
                .map_err(draw_err)?;
            let line: Vec<(f64, f64)> = curve.iter().map(|&(x, d)| at(x, d)).collect();
            plot.draw(&PathElement::new(line, color.rgb().stroke_width(2)))
                .map_err(draw_err)?;
        }
    }
    Ok(())
}

/// Upper bound of a strip axis holding `ms`.
pub(crate) fn strip_extent(ms: &[Marginal]) -> f64 {
    let peak = ms.iter().map(Marginal::peak).fold(0.0, f64::max);
    if peak > 0.0 { peak * 1.05 } else { 1.0 }
}

impl Chart for Joint<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn size(&self) -> (u32, u32) {
        (self.opts.size, self.opts.size)
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let deep = DEEP_NIGHT.rgb();
        canvas.fill(&deep).map_err(draw_err)?;
        let font = self.theme.font_color.rgb();
        let body = match self.opts.text.title.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(title) => canvas
                .titled(title, TextStyle::from((family, self.theme.title_size)).color(&font))
                .map_err(draw_err)?,
            None => canvas.clone(),
        };
        let items = self.legend_items();
        let (area, legend_area) = legend::split_for_legend(&body, &items);

        let fields = self.density_fields();
        let (x_range, y_range) = self.ranges_with(&fields);
        let (marg_x, marg_y) = self.marginals(&x_range, &y_range);

        let (w, h) = area.dim_in_pixel();
        let cells = self.opts.ratio.max(1) + 1;
        let (strip_h, strip_w) = (h / cells, w / cells);
        let space = (self.opts.space * f64::from(strip_h.min(strip_w))).max(0.0) as u32;
        let (top, bottom) = area.split_vertically(strip_h as i32);
        let (top_cell, _) = top.split_horizontally((w - strip_w) as i32);
        let (joint_cell, right_cell) = bottom.split_horizontally((w - strip_w) as i32);

        let left_px = axes::compute_left_label_area_px(&y_range, 10, TICK_PX) + LABEL_PX + 10;
        let bottom_px = TICK_PX + 16 + LABEL_PX + 12;

        let mut chart = ChartBuilder::on(&joint_cell)
            .margin_left(MARGIN)
            .margin_bottom(MARGIN)
            .margin_top(0)
            .margin_right(0)
            .x_label_area_size(bottom_px)
            .y_label_area_size(left_px)
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(draw_err)?;
        let bg = self.theme.bg_color.rgb();
        chart.plotting_area().fill(&bg).map_err(draw_err)?;

        let x_desc = self.opts.text.x_label(&self.x);
        let y_desc = self.opts.text.y_label(&self.y);
        let fmt = |v: &f64| format_tick(*v);
        chart
            .configure_mesh()
            .disable_mesh()
            .axis_style(BLACK.rgb())
            .label_style(TextStyle::from((family, TICK_PX)).color(&font))
            .axis_desc_style(TextStyle::from((family, LABEL_PX)).color(&font))
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_label_formatter(&fmt)
            .y_label_formatter(&fmt)
            .draw()
            .map_err(draw_err)?;

        self.draw_joint(&mut chart, &fields, &x_range)?;
        chart
            .plotting_area()
            .draw(&Rectangle::new(
                [(x_range.start, y_range.start), (x_range.end, y_range.end)],
                BLACK.rgb().stroke_width(1),
            ))
            .map_err(draw_err)?;

        let fill_alpha = if self.opts.hue.is_some() { 0.5 } else { 0.75 };
        let top_chart = ChartBuilder::on(&top_cell)
            .margin_left(MARGIN)
            .margin_top(MARGIN)
            .margin_right(0)
            .margin_bottom(space)
            .y_label_area_size(left_px)
            .build_cartesian_2d(x_range.clone(), 0.0..strip_extent(&marg_x))
            .map_err(draw_err)?;
        let right_chart = ChartBuilder::on(&right_cell)
            .margin_left(space)
            .margin_top(0)
            .margin_right(MARGIN)
            .margin_bottom(MARGIN)
            .x_label_area_size(bottom_px)
            .build_cartesian_2d(0.0..strip_extent(&marg_y), y_range.clone())
            .map_err(draw_err)?;
        for m in &marg_x {
            draw_marginal(top_chart.plotting_area(), m, false, fill_alpha)?;
        }
        for m in &marg_y {
            draw_marginal(right_chart.plotting_area(), m, true, fill_alpha)?;
        }
        let spine = BLACK.rgb().stroke_width(1);
        top_chart
            .plotting_area()
            .draw(&PathElement::new(vec![(x_range.start, 0.0), (x_range.end, 0.0)], spine))
            .map_err(draw_err)?;
        right_chart
            .plotting_area()
            .draw(&PathElement::new(vec![(0.0, y_range.start), (0.0, y_range.end)], spine))
            .map_err(draw_err)?;

        let pixels = axes::plot_pixels(&chart);
        if let Some(panel) = legend_area.as_ref() {
            let (_, panel_y) = panel.get_base_pixel();
            legend::draw_legend_panel(panel, &items, family, pixels.1.start - panel_y)?;
        }
        self.opts
            .text
            .annotation(0.85, -0.2, annotation::NARROW)
            .draw(canvas, pixels, family)
    }
}

pub fn joint<P: AsRef<Path>>(
    data: &Dataset,
    x_column: &str,
    y_column: &str,
    opts: JointOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = Joint::new(data, x_column, y_column, opts, theme)?;
    viz::render(&chart, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use crate::theme::ICE;

    fn data() -> Dataset {
        let n = 40;
        Dataset::from_columns(vec![
            Column::numeric("x", (0..n).map(|i| i as f64)),
            Column::numeric("y", (0..n).map(|i| (i * 7 % 11) as f64 + i as f64 * 0.5)),
            Column::text("g", (0..n).map(|i| if i % 2 == 0 { "even" } else { "odd" })),
        ])
        .unwrap()
    }

    #[test]
    fn num_picks_a_single_color() {
        let t = Theme::default();
        let opts = JointOptions {
            num: 3,
            ..JointOptions::default()
        };
        let j = Joint::new(&data(), "x", "y", opts, &t).unwrap();
        let pts = j.points();
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].0.color, ICE);
        assert!(j.legend_items().is_empty());
        assert_eq!(j.size(), (800, 800));
    }

    #[test]
    fn hue_is_rejected_for_regression_kinds() {
        let t = Theme::default();
        for kind in [JointKind::Reg, JointKind::Resid, JointKind::Hex] {
            let opts = JointOptions {
                kind,
                hue: Some("g".into()),
                ..JointOptions::default()
            };
            assert!(Joint::new(&data(), "x", "y", opts, &t).is_err());
        }
        let opts = JointOptions {
            num: 0,
            ..JointOptions::default()
        };
        assert!(Joint::new(&data(), "x", "y", opts, &t).is_err());
    }

    #[test]
    fn residuals_of_an_exact_line_are_zero() {
        let ds = Dataset::from_columns(vec![
            Column::numeric("x", [0.0, 1.0, 2.0, 3.0]),
            Column::numeric("y", [1.0, 3.0, 5.0, 7.0]),
        ])
        .unwrap();
        let t = Theme::default();
        let opts = JointOptions {
            kind: JointKind::Resid,
            ..JointOptions::default()
        };
        let j = Joint::new(&ds, "x", "y", opts, &t).unwrap();
        let (m, b) = j.fit().unwrap();
        assert!((m - 2.0).abs() < 1e-12 && (b - 1.0).abs() < 1e-12);
        assert!(j.points()[0].1.iter().all(|p| p.1.abs() < 1e-12));
    }

    #[test]
    fn scatter_margins_switch_to_kde_with_hue() {
        let t = Theme::default();
        let plain = Joint::new(&data(), "x", "y", JointOptions::default(), &t).unwrap();
        let (x, y) = plain.ranges();
        let (mx, my) = plain.marginals(&x, &y);
        assert!(matches!(mx[0], Marginal::Hist { .. }));
        assert_eq!(my.len(), 1);

        let opts = JointOptions {
            hue: Some("g".into()),
            ..JointOptions::default()
        };
        let hued = Joint::new(&data(), "x", "y", opts, &t).unwrap();
        let (mx, _) = hued.marginals(&x, &y);
        assert_eq!(mx.len(), 2);
        assert!(mx.iter().all(|m| matches!(m, Marginal::Kde { .. })));
        assert_eq!(hued.legend_items()[1].label, "odd");
    }

    #[test]
    fn kde_range_covers_data_and_iso_lines() {
        let t = Theme::default();
        let opts = JointOptions {
            kind: JointKind::Kde,
            ..JointOptions::default()
        };
        let j = Joint::new(&data(), "x", "y", opts, &t).unwrap();
        let fields = j.density_fields();
        assert_eq!(fields.len(), 1);
        let (x, _) = j.ranges();
        assert!(x.start <= 0.0 && x.end >= 39.0);
    }

    #[test]
    fn reg_margins_carry_scaled_kde() {
        let t = Theme::default();
        let opts = JointOptions {
            kind: JointKind::Reg,
            ..JointOptions::default()
        };
        let j = Joint::new(&data(), "x", "y", opts, &t).unwrap();
        let (x, y) = j.ranges();
        let (mx, _) = j.marginals(&x, &y);
        match &mx[0] {
            Marginal::Hist { kde, histogram, .. } => {
                assert_eq!(kde.len(), CURVE_POINTS);
                let total: f64 = histogram.heights.iter().sum();
                assert_eq!(total, 40.0);
            }
            other => panic!("unexpected marginal {other:?}"),
        }
    }

    #[test]
    fn kind_parses() {
        assert_eq!("HEX".parse::<JointKind>().unwrap(), JointKind::Hex);
        assert!("violin".parse::<JointKind>().is_err());
    }
}
