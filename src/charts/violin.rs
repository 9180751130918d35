//! Violin plot: per-category KDE bodies with an inner box, optionally split
//! or dodged by a hue column of at most two values.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use super::{Categories, ChartText};
use crate::annotation;
use crate::dataset::Dataset;
use crate::error::{NeonError, draw_err};
use crate::glow::GlowSpec;
use crate::hue::{self, HueGroup};
use crate::stats::{BoxStats, Kde, linspace};
use crate::theme::{CHARCOAL, Palette, Rgb8, Theme, WHITE};
use crate::viz::axes::{self, Axes2d, AxesSpec};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::{self, Chart};

/// KDE support reaches this many bandwidths past the extremes.
const CUT: f64 = 2.0;
const PROFILE_POINTS: usize = 100;
pub const TOO_MANY_HUES: &str = "Too many hue values";

#[derive(Clone, Debug, PartialEq)]
pub struct ViolinOptions {
    pub text: ChartText,
    pub hue: Option<String>,
    /// Draw the two hue groups as halves of one violin.
    pub split: bool,
    /// Total width of a category slot.
    pub widths: f64,
    /// Fill bodies (alpha 0.8) or draw outlines only.
    pub fill: bool,
    /// Quartile box and whiskers inside each body.
    pub inner_box: bool,
}

impl Default for ViolinOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            hue: None,
            split: false,
            widths: 0.5,
            fill: true,
            inner_box: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Both,
    Left,
    Right,
}

/// One drawn body.
#[derive(Clone, Debug, PartialEq)]
pub struct ViolinBody {
    pub category: usize,
    pub position: f64,
    pub side: Side,
    /// Largest half-width available to this body, in category units.
    pub half_width: f64,
    pub color: Rgb8,
    /// `(y, density)` samples; empty when the values cannot carry a KDE.
    pub profile: Vec<(f64, f64)>,
    pub stats: BoxStats,
}

pub struct Violin<'a> {
    theme: &'a Theme,
    x: String,
    y: String,
    opts: ViolinOptions,
    categories: Categories,
    hue_groups: Vec<HueGroup>,
    bodies: Vec<ViolinBody>,
    too_many_hues: bool,
    max_density: f64,
}

impl<'a> Violin<'a> {
    pub fn new(
        data: &Dataset,
        y_column: &str,
        x_column: &str,
        opts: ViolinOptions,
        theme: &'a Theme,
    ) -> Result<Self> {
        let ys = data.numeric(y_column)?;
        let xcol = data.column(x_column)?;
        let mut categories = Categories::new();
        let cat_of: Vec<Option<usize>> = xcol
            .values
            .iter()
            .map(|v| v.label().map(|l| categories.intern(&l)))
            .collect();

        let all_rows: Vec<usize> = (0..data.len()).collect();
        let (palette, hue_groups, too_many_hues) = match opts.hue.as_deref() {
            None => (theme.palette.clone(), Vec::new(), false),
            Some(h) => {
                let n = hue::distinct_values(data, h)?.len();
                let palette = if n == 2 {
                    Palette::neon_pair()
                } else {
                    theme.palette.clone()
                };
                let groups = hue::partition(data, Some(h), &palette, &all_rows)?;
                (palette, groups, n > 2)
            }
        };

        let slot = opts.widths;
        let mut bodies = Vec::new();
        for ci in 0..categories.len() {
            let in_cat = |r: usize| cat_of[r] == Some(ci);
            if hue_groups.is_empty() {
                let values: Vec<f64> = all_rows.iter().filter(|&&r| in_cat(r)).filter_map(|&r| ys[r]).collect();
                if let Some(b) = body(ci, ci as f64, Side::Both, slot / 2.0, palette.pick(ci), &values) {
                    bodies.push(b);
                }
                continue;
            }
            let k = hue_groups.len();
            for (j, g) in hue_groups.iter().enumerate() {
                let values: Vec<f64> = g.rows.iter().filter(|&&r| in_cat(r)).filter_map(|&r| ys[r]).collect();
                let (position, side, half) = if opts.split && k == 2 {
                    let side = if j == 0 { Side::Left } else { Side::Right };
                    (ci as f64, side, slot / 2.0)
                } else {
                    let w = slot / k as f64;
                    (ci as f64 - slot / 2.0 + (j as f64 + 0.5) * w, Side::Both, w / 2.0)
                };
                if let Some(b) = body(ci, position, side, half, g.color, &values) {
                    bodies.push(b);
                }
            }
        }
        if bodies.is_empty() {
            return Err(NeonError::EmptyData.into());
        }
        let max_density = bodies
            .iter()
            .flat_map(|b| b.profile.iter().map(|p| p.1))
            .fold(0.0f64, f64::max);

        Ok(Self {
            theme,
            x: x_column.to_string(),
            y: y_column.to_string(),
            opts,
            categories,
            hue_groups,
            bodies,
            too_many_hues,
            max_density,
        })
    }

    pub fn title(&self) -> String {
        self.opts.text.title_or(|| format!("{} by {}", self.x, self.y))
    }

    pub fn categories(&self) -> &[String] {
        self.categories.labels()
    }

    pub fn bodies(&self) -> &[ViolinBody] {
        &self.bodies
    }

    pub fn too_many_hues(&self) -> bool {
        self.too_many_hues
    }

    /// Hue legend; entry `k` takes the color of hue group `k`.
    pub fn legend_items(&self) -> Vec<LegendItem> {
        self.hue_groups
            .iter()
            .map(|g| LegendItem::new(g.legend_label(), g.color, Glyph::Line))
            .collect()
    }

    /// Closed outline of a body in data coordinates, scaled so the densest
    /// body overall spans its full half-width.
    pub fn outline(&self, b: &ViolinBody) -> Vec<(f64, f64)> {
        if b.profile.is_empty() || self.max_density <= 0.0 {
            return Vec::new();
        }
        let w = |d: f64| d / self.max_density * b.half_width;
        let right = b.profile.iter().map(|&(y, d)| (b.position + w(d), y));
        let left = b.profile.iter().rev().map(|&(y, d)| (b.position - w(d), y));
        let center_down = b.profile.iter().rev().map(|&(y, _)| (b.position, y));
        let center_up = b.profile.iter().map(|&(y, _)| (b.position, y));
        let mut pts: Vec<(f64, f64)> = match b.side {
            Side::Both => right.chain(left).collect(),
            Side::Right => right.chain(center_down).collect(),
            Side::Left => center_up.chain(left).collect(),
        };
        if let Some(&first) = pts.first() {
            pts.push(first);
        }
        pts
    }

    fn y_range(&self) -> std::ops::Range<f64> {
        let data_min = self
            .bodies
            .iter()
            .flat_map(|b| std::iter::once(b.stats.whisker_low).chain(b.stats.fliers.iter().copied()))
            .fold(f64::INFINITY, f64::min);
        let hi = self
            .bodies
            .iter()
            .flat_map(|b| {
                b.profile
                    .iter()
                    .map(|p| p.0)
                    .chain([b.stats.whisker_high])
                    .chain(b.stats.fliers.iter().copied())
            })
            .fold(f64::NEG_INFINITY, f64::max);
        let hi = if hi.is_finite() { hi } else { 1.0 };
        // y starts at zero unless the data itself goes negative
        let bottom = if data_min.is_finite() && data_min < 0.0 {
            data_min - data_min.abs() * 0.05
        } else {
            0.0
        };
        let top = if hi > bottom { hi + (hi - bottom) * 0.05 } else { bottom + 1.0 };
        bottom..top
    }
}

fn body(category: usize, position: f64, side: Side, half_width: f64, color: Rgb8, values: &[f64]) -> Option<ViolinBody> {
    let stats = BoxStats::compute(values, 1.5)?;
    let profile = match Kde::silverman(values).and_then(|k| k.support(CUT).map(|s| (k, s))) {
        Some((k, (lo, hi))) => linspace(lo, hi, PROFILE_POINTS)
            .into_iter()
            .map(|y| (y, k.evaluate(y)))
            .collect(),
        None => Vec::new(),
    };
    Some(ViolinBody {
        category,
        position,
        side,
        half_width,
        color,
        profile,
        stats,
    })
}

fn draw_inner_box<DB: DrawingBackend>(chart: &mut Axes2d<'_, DB>, b: &ViolinBody) -> Result<()> {
    let x = b.position;
    let s = &b.stats;
    let whisker = CHARCOAL.rgb().stroke_width(2);
    let body = CHARCOAL.rgb().stroke_width(5);
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(x, s.whisker_low), (x, s.whisker_high)],
            whisker,
        )))
        .map_err(draw_err)?;
    chart
        .draw_series(std::iter::once(PathElement::new(vec![(x, s.q1), (x, s.q3)], body)))
        .map_err(draw_err)?;
    chart
        .draw_series(std::iter::once(Circle::new((x, s.median), 3, WHITE.rgb().filled())))
        .map_err(draw_err)?;
    Ok(())
}

impl Chart for Violin<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let items = self.legend_items();
        let (plot, legend_area) = legend::split_for_legend(canvas, &items);

        let title = self.title();
        let x_desc = self.opts.text.x_label(&self.x);
        let y_desc = self.opts.text.y_label(&self.y);
        let n = self.categories.len() as f64;
        let mut spec = AxesSpec::new(-0.5..(n - 0.5), self.y_range());
        spec.title = Some(&title);
        spec.x_desc = &x_desc;
        spec.y_desc = &y_desc;
        spec.x_categories = Some(self.categories());
        let mut chart = axes::build(&plot, self.theme, family, &spec)?;

        let outlines: Vec<(Rgb8, Vec<(f64, f64)>)> = self
            .bodies
            .iter()
            .map(|b| (b.color, self.outline(b)))
            .collect();

        for (color, pts) in outlines.iter().filter(|(_, p)| !p.is_empty()) {
            if self.opts.fill {
                chart
                    .draw_series(std::iter::once(Polygon::new(pts.clone(), color.with_alpha(0.8).filled())))
                    .map_err(draw_err)?;
            }
            chart
                .draw_series(std::iter::once(PathElement::new(pts.clone(), color.rgb().stroke_width(1))))
                .map_err(draw_err)?;
        }
        GlowSpec::VIOLIN.apply(|layer| {
            for (color, pts) in outlines.iter().filter(|(_, p)| !p.is_empty()) {
                chart
                    .draw_series(std::iter::once(PathElement::new(pts.clone(), layer.stroke(*color))))
                    .map_err(draw_err)?;
            }
            Ok(())
        })?;
        if self.opts.inner_box {
            for b in &self.bodies {
                draw_inner_box(&mut chart, b)?;
            }
        }

        if self.too_many_hues {
            let (xr, yr) = axes::plot_pixels(&chart);
            let font = self.theme.font_color.rgb();
            let style = TextStyle::from((family, 16))
                .color(&font)
                .pos(Pos::new(HPos::Left, VPos::Bottom));
            let at = ((xr.start + xr.end) / 2, (yr.start + yr.end) / 2);
            canvas
                .draw(&Text::new(TOO_MANY_HUES, at, style))
                .map_err(draw_err)?;
        }

        let note = self.opts.text.annotation(1.45, -0.2, annotation::NARROW);
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

/// Violins of `y_column` per `x_column` category.
pub fn violin<P: AsRef<Path>>(
    data: &Dataset,
    y_column: &str,
    x_column: &str,
    opts: ViolinOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = Violin::new(data, y_column, x_column, opts, theme)?;
    if chart.too_many_hues() {
        log::warn!("violin hue has more than two values");
    }
    viz::render(&chart, out)
}
