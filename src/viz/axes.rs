//! Neon axes: dark plotting area, colored ticks, value-axis grid, category
//! labels and tick formatting.

use crate::error::draw_err;
use crate::theme::Theme;
use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

use super::text::{estimate_text_width_px, max_text_width_px};

/// Cartesian chart over `f64` on both axes; categorical axes place category
/// `i` at `i as f64`.
pub type Axes2d<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

pub const TICK_PX: u32 = 14;
const MARGIN: u32 = 16;

/// Which direction gets grid lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grid {
    /// Horizontal lines at y ticks.
    Y,
    /// Vertical lines at x ticks.
    X,
    Both,
    None,
}

#[derive(Clone, Debug)]
pub struct AxesSpec<'s> {
    pub title: Option<&'s str>,
    pub x_desc: &'s str,
    pub y_desc: &'s str,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub grid: Grid,
    pub x_categories: Option<&'s [String]>,
    pub y_categories: Option<&'s [String]>,
    /// Axis description size; defaults to the theme font size.
    pub desc_px: Option<u32>,
    pub title_px: Option<u32>,
}

impl<'s> AxesSpec<'s> {
    pub fn new(x_range: Range<f64>, y_range: Range<f64>) -> Self {
        Self {
            title: None,
            x_desc: "",
            y_desc: "",
            x_range,
            y_range,
            grid: Grid::Y,
            x_categories: None,
            y_categories: None,
            desc_px: None,
            title_px: None,
        }
    }
}

/// Tick text: thousands separators for large magnitudes, fewer decimals as
/// values grow.
pub fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a >= 1000.0 {
        (v.round() as i64).to_formatted_string(&Locale::en)
    } else if a >= 100.0 {
        format!("{:.0}", v)
    } else if a >= 10.0 {
        format!("{:.1}", v)
    } else if a == 0.0 {
        "0".to_string()
    } else {
        format!("{:.2}", v)
    }
}

/// Left gutter wide enough for the y tick labels that will appear.
pub fn compute_left_label_area_px(y_range: &Range<f64>, ticks: usize, font_px: u32) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 {
            0.0
        } else {
            i as f64 / ticks as f64
        };
        let v = y_range.start + (y_range.end - y_range.start) * t;
        max_px = max_px.max(estimate_text_width_px(&format_tick(v), font_px));
    }
    max_px.saturating_add(18).clamp(48, 160)
}

/// Data range with a fractional pad on both ends; degenerate ranges widen to ±1.
pub fn padded_range(min: f64, max: f64, pad: f64) -> Range<f64> {
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    let d = (max - min) * pad;
    (min - d)..(max + d)
}

/// Min and max of finite values.
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn rotation_transform(deg: u16) -> Option<FontTransform> {
    match deg % 360 {
        90 => Some(FontTransform::Rotate90),
        180 => Some(FontTransform::Rotate180),
        270 => Some(FontTransform::Rotate270),
        _ => None,
    }
}

/// Build the chart context and draw the themed mesh.
pub fn build<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    theme: &Theme,
    family: FontFamily<'a>,
    spec: &AxesSpec<'_>,
) -> Result<Axes2d<'a, DB>> {
    let font = theme.font_color.rgb();
    let desc_px = spec.desc_px.unwrap_or(theme.font_size);

    let left = match spec.y_categories {
        Some(cats) => max_text_width_px(cats.iter().map(String::as_str), TICK_PX) + 18,
        None => compute_left_label_area_px(&spec.y_range, 10, TICK_PX),
    } + if spec.y_desc.is_empty() { 0 } else { desc_px + 10 };
    let bottom_ticks = match (spec.x_categories, rotation_transform(theme.rotation)) {
        (Some(cats), Some(FontTransform::Rotate90 | FontTransform::Rotate270)) => {
            max_text_width_px(cats.iter().map(String::as_str), TICK_PX) + 12
        }
        _ => TICK_PX + 16,
    };
    let bottom = bottom_ticks + if spec.x_desc.is_empty() { 0 } else { desc_px + 12 };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(MARGIN)
        .margin_top(MARGIN + theme.title_pad)
        .x_label_area_size(bottom)
        .y_label_area_size(left);
    if let Some(title) = spec.title.filter(|t| !t.trim().is_empty()) {
        let title_style = TextStyle::from((family, spec.title_px.unwrap_or(theme.title_size)))
            .color(&font);
        builder.caption(title, title_style);
    }
    let mut chart = builder
        .build_cartesian_2d(spec.x_range.clone(), spec.y_range.clone())
        .map_err(draw_err)?;

    let tick_style = TextStyle::from((family, TICK_PX)).color(&font);
    let desc_style = TextStyle::from((family, desc_px)).color(&font);
    let grid_style = ShapeStyle {
        color: theme.grid_color.with_alpha(0.7),
        filled: false,
        stroke_width: 1,
    };
    let axis_style = ShapeStyle {
        color: theme.font_color.with_alpha(0.6),
        filled: false,
        stroke_width: 1,
    };
    let fmt = |v: &f64| format_tick(*v);
    let blank = |_: &f64| String::new();
    let x_fmt: &dyn Fn(&f64) -> String = if spec.x_categories.is_some() { &blank } else { &fmt };
    let y_fmt: &dyn Fn(&f64) -> String = if spec.y_categories.is_some() { &blank } else { &fmt };

    let mut mesh = chart.configure_mesh();
    mesh.bold_line_style(grid_style)
        .light_line_style(TRANSPARENT)
        .axis_style(axis_style)
        .label_style(tick_style)
        .axis_desc_style(desc_style)
        .x_desc(spec.x_desc)
        .y_desc(spec.y_desc)
        .x_labels(if spec.x_categories.is_some() { 0 } else { 10 })
        .y_labels(if spec.y_categories.is_some() { 0 } else { 10 })
        .x_label_formatter(x_fmt)
        .y_label_formatter(y_fmt);
    match spec.grid {
        Grid::Y => {
            mesh.disable_x_mesh();
        }
        Grid::X => {
            mesh.disable_y_mesh();
        }
        Grid::None => {
            mesh.disable_mesh();
        }
        Grid::Both => {}
    }
    mesh.draw().map_err(draw_err)?;

    Ok(chart)
}

/// Draw category names under (x) or left of (y) the axes, on the top-level
/// canvas.
pub fn draw_category_labels<DB: DrawingBackend>(
    canvas: &DrawingArea<DB, Shift>,
    chart: &Axes2d<'_, DB>,
    theme: &Theme,
    family: FontFamily<'_>,
    x_categories: Option<&[String]>,
    y_categories: Option<&[String]>,
) -> Result<()> {
    let font = theme.font_color.rgb();
    let (xr, yr) = (chart.x_range(), chart.y_range());

    if let Some(cats) = x_categories {
        let mut style = TextStyle::from((family, TICK_PX)).color(&font);
        style = match rotation_transform(theme.rotation) {
            Some(t) => style.transform(t).pos(Pos::new(HPos::Right, VPos::Center)),
            None => style.pos(Pos::new(HPos::Center, VPos::Top)),
        };
        for (i, cat) in cats.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(i as f64, yr.start));
            canvas
                .draw(&Text::new(cat.as_str(), (px, py + 6), style.clone()))
                .map_err(draw_err)?;
        }
    }
    if let Some(cats) = y_categories {
        let style = TextStyle::from((family, TICK_PX))
            .color(&font)
            .pos(Pos::new(HPos::Right, VPos::Center));
        for (i, cat) in cats.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(xr.start, i as f64));
            canvas
                .draw(&Text::new(cat.as_str(), (px - 6, py), style.clone()))
                .map_err(draw_err)?;
        }
    }
    Ok(())
}

/// Pixel ranges of the plotting area, used to anchor annotations.
pub fn plot_pixels<DB: DrawingBackend>(chart: &Axes2d<'_, DB>) -> (Range<i32>, Range<i32>) {
    chart.plotting_area().get_pixel_range()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(1_234_567.0), "1,234,567");
        assert_eq!(format_tick(250.4), "250");
        assert_eq!(format_tick(12.34), "12.3");
        assert_eq!(format_tick(0.5), "0.50");
        assert_eq!(format_tick(0.0), "0");
    }

    #[test]
    fn degenerate_range_widens() {
        assert_eq!(padded_range(3.0, 3.0, 0.05), 2.0..4.0);
        let r = padded_range(0.0, 10.0, 0.1);
        assert!((r.start + 1.0).abs() < 1e-12 && (r.end - 11.0).abs() < 1e-12);
    }

    #[test]
    fn extent_skips_non_finite() {
        assert_eq!(extent([3.0, f64::NAN, -1.0, 7.0]), Some((-1.0, 7.0)));
        assert_eq!(extent(Vec::<f64>::new()), None);
    }
}
