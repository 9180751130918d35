//! Pie chart with translucent glowing wedges, in-wedge percentages and an
//! optional stacked side bar breaking one slice down into ratios.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::ops::Range;
use std::path::Path;

use super::ChartText;
use crate::annotation;
use crate::error::{NeonError, draw_err};
use crate::theme::{ICE, INK, LEMON, ORANGE, PAPER, Palette, ROSE, Rgb8, Theme, VIOLET};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::{self, Chart};

const WEDGE_ALPHA: f64 = 0.7;
const WEDGE_EDGE: u32 = 4;
const SIDE_BAR_WIDTH: f64 = 0.2;

#[derive(Clone, Debug, PartialEq)]
pub struct PieOptions {
    /// `title` defaults to "pie plot"; `ann_x`/`ann_y` to 1.45 / -0.1.
    pub text: ChartText,
    pub labels: Option<Vec<String>>,
    /// Radial offset per wedge, as a fraction of the radius.
    pub explode: Option<Vec<f64>>,
    /// Degrees counter-clockwise from the positive x axis.
    pub start_angle: f64,
    /// List labels in a legend panel instead of next to the wedges.
    pub legend: bool,
    pub radius: f64,
    /// Fractions shown as a stacked side bar.
    pub ratios: Option<Vec<f64>>,
    pub ratio_labels: Option<Vec<String>>,
    pub side_title: Option<String>,
    /// 1 rose, 2 lemon, 3 ice, 4 violet, 5 orange.
    pub side_bar_color: u8,
    /// Dashed connectors from the pie to the side bar.
    pub side_lines: bool,
    /// Connector start, in radii to the right of the pie center.
    pub connector: f64,
    /// `None` uses the eight-color palette.
    pub palette: Option<Palette>,
}

impl Default for PieOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            labels: None,
            explode: None,
            start_angle: 0.0,
            legend: false,
            radius: 1.0,
            ratios: None,
            ratio_labels: None,
            side_title: None,
            side_bar_color: 1,
            side_lines: false,
            connector: 1.35,
            palette: None,
        }
    }
}

/// Color of the side bar for the 1-based selector.
pub fn side_bar_color(selector: u8) -> Result<Rgb8, NeonError> {
    match selector {
        1 => Ok(ROSE),
        2 => Ok(LEMON),
        3 => Ok(ICE),
        4 => Ok(VIOLET),
        5 => Ok(ORANGE),
        n => Err(NeonError::InvalidInput(format!(
            "side bar color must be 1-5, got {n}"
        ))),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Wedge {
    /// Start and end angle in degrees, counter-clockwise.
    pub theta1: f64,
    pub theta2: f64,
    pub fraction: f64,
    pub color: Rgb8,
    pub label: Option<String>,
    pub explode: f64,
}

impl Wedge {
    pub fn mid_angle(&self) -> f64 {
        (self.theta1 + self.theta2) / 2.0
    }

    pub fn percent_text(&self) -> String {
        format!("{:.1} %", self.fraction * 100.0)
    }
}

/// One stacked block of the side bar, top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct SideSegment {
    pub label: String,
    pub height: f64,
    pub bottom: f64,
    pub alpha: f64,
}

impl SideSegment {
    pub fn text(&self) -> String {
        format!("{:.1}%", self.height * 100.0)
    }
}

/// Stack ratios downwards from 1. Ratios are sorted ascending and paired
/// with the labels in the given order, then laid out from the largest.
pub fn stack_ratios(ratios: &[f64], labels: &[String]) -> Vec<SideSegment> {
    let mut sorted = ratios.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pairs: Vec<(f64, &String)> = sorted.into_iter().zip(labels).collect();
    let mut bottom = 1.0;
    pairs
        .into_iter()
        .rev()
        .enumerate()
        .map(|(j, (height, label))| {
            bottom -= height;
            let alpha = if j == 0 { 0.9 } else { 1.0 / (j as f64 + 1.0) + 0.2 };
            SideSegment {
                label: label.clone(),
                height,
                bottom,
                alpha,
            }
        })
        .collect()
}

pub struct Pie<'a> {
    theme: &'a Theme,
    opts: PieOptions,
    wedges: Vec<Wedge>,
    side: Option<(Rgb8, Vec<SideSegment>)>,
}

impl<'a> Pie<'a> {
    pub fn new(values: &[f64], opts: PieOptions, theme: &'a Theme) -> Result<Self> {
        if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(NeonError::InvalidInput(format!("pie values must be non-negative, got {v}")).into());
        }
        let total: f64 = values.iter().sum();
        if values.is_empty() || total <= 0.0 {
            return Err(NeonError::EmptyData.into());
        }
        let palette = opts.palette.clone().unwrap_or_else(Palette::neon_extended);

        let mut theta = opts.start_angle;
        let wedges = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let fraction = v / total;
                let theta1 = theta;
                theta += fraction * 360.0;
                Wedge {
                    theta1,
                    theta2: theta,
                    fraction,
                    color: palette.pick(i),
                    label: opts.labels.as_ref().and_then(|l| l.get(i).cloned()),
                    explode: opts.explode.as_ref().and_then(|e| e.get(i).copied()).unwrap_or(0.0),
                }
            })
            .collect();

        let side = match (&opts.ratios, &opts.ratio_labels) {
            (Some(r), Some(l)) => Some((side_bar_color(opts.side_bar_color)?, stack_ratios(r, l))),
            (Some(_), None) => {
                log::debug!("ratios given without ratio labels, side bar skipped");
                None
            }
            _ => None,
        };

        Ok(Self {
            theme,
            opts,
            wedges,
            side,
        })
    }

    pub fn wedges(&self) -> &[Wedge] {
        &self.wedges
    }

    pub fn side_segments(&self) -> Option<&[SideSegment]> {
        self.side.as_ref().map(|(_, s)| s.as_slice())
    }

    pub fn title(&self) -> String {
        self.opts.text.title_or(|| "pie plot".to_string())
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let mut items = Vec::new();
        if self.opts.legend {
            items.extend(self.wedges.iter().filter_map(|w| {
                w.label
                    .as_ref()
                    .map(|l| LegendItem::new(l.clone(), w.color, Glyph::Patch))
            }));
        }
        if let Some((color, segs)) = &self.side {
            items.extend(
                segs.iter()
                    .map(|s| LegendItem::new(s.label.clone(), *color, Glyph::Patch)),
            );
        }
        items
    }
}

/// Pixel point at `r` along `deg` from `center`; y grows downwards.
fn polar(center: (f64, f64), r: f64, deg: f64) -> (i32, i32) {
    let t = deg * PI / 180.0;
    (
        (center.0 + r * t.cos()).round() as i32,
        (center.1 - r * t.sin()).round() as i32,
    )
}

fn wedge_polygon(center: (f64, f64), r: f64, w: &Wedge) -> Vec<(i32, i32)> {
    let steps = (((w.theta2 - w.theta1) / 2.0).ceil() as usize).max(2);
    let mut pts = vec![polar(center, 0.0, 0.0)];
    for k in 0..=steps {
        let deg = w.theta1 + (w.theta2 - w.theta1) * k as f64 / steps as f64;
        pts.push(polar(center, r, deg));
    }
    pts
}

/// Split a pixel segment into dash pieces.
pub fn dash_segments(a: (i32, i32), b: (i32, i32), dash: f64, gap: f64) -> Vec<[(i32, i32); 2]> {
    let (dx, dy) = (f64::from(b.0 - a.0), f64::from(b.1 - a.1));
    let len = dx.hypot(dy);
    if len == 0.0 {
        return Vec::new();
    }
    let at = |t: f64| {
        (
            (f64::from(a.0) + dx * t / len).round() as i32,
            (f64::from(a.1) + dy * t / len).round() as i32,
        )
    };
    let mut out = Vec::new();
    let mut t = 0.0;
    while t < len {
        out.push([at(t), at((t + dash).min(len))]);
        t += dash + gap;
    }
    out
}

impl Pie<'_> {
    fn draw_wedges<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        center: (f64, f64),
        r: f64,
        family: FontFamily<'_>,
    ) -> Result<()> {
        let ink = INK.rgb();
        let paper = PAPER.rgb();
        for w in &self.wedges {
            let offset = polar((0.0, 0.0), w.explode * r, w.mid_angle());
            let c = (center.0 + f64::from(offset.0), center.1 + f64::from(offset.1));
            let poly = wedge_polygon(c, r, w);
            area.draw(&Polygon::new(poly.clone(), w.color.with_alpha(WEDGE_ALPHA).filled()))
                .map_err(draw_err)?;
            let mut outline = poly;
            if let Some(&first) = outline.first() {
                outline.push(first);
            }
            let edge = ShapeStyle {
                color: w.color.with_alpha(WEDGE_ALPHA),
                filled: false,
                stroke_width: WEDGE_EDGE,
            };
            area.draw(&PathElement::new(outline, edge)).map_err(draw_err)?;

            let pct_style = TextStyle::from((family, 14))
                .color(&ink)
                .pos(Pos::new(HPos::Center, VPos::Center));
            area.draw(&Text::new(w.percent_text(), polar(c, 0.5 * r, w.mid_angle()), pct_style))
                .map_err(draw_err)?;

            if !self.opts.legend
                && let Some(label) = &w.label
            {
                let cos = (w.mid_angle() * PI / 180.0).cos();
                let h = if cos >= 0.0 { HPos::Left } else { HPos::Right };
                let style = TextStyle::from((family, 18)).color(&paper).pos(Pos::new(h, VPos::Center));
                area.draw(&Text::new(label.as_str(), polar(c, 1.1 * r, w.mid_angle()), style))
                    .map_err(draw_err)?;
            }
        }
        Ok(())
    }

    /// Draws the side bar; returns pixel anchors of its top-left and
    /// bottom-left corners for the connectors.
    fn draw_side_bar<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        color: Rgb8,
        segs: &[SideSegment],
        family: FontFamily<'_>,
    ) -> Result<((i32, i32), (i32, i32))> {
        let low = segs.iter().map(|s| s.bottom).fold(0.0f64, f64::min);
        let y_range: Range<f64> = (low - 0.05)..1.05;
        let x_range: Range<f64> = (-1.3 * SIDE_BAR_WIDTH)..(2.2 * SIDE_BAR_WIDTH);
        let chart = ChartBuilder::on(area)
            .margin(20)
            .build_cartesian_2d(x_range, y_range)
            .map_err(draw_err)?;
        let half = SIDE_BAR_WIDTH / 2.0;
        let ink = INK.rgb();
        let label_style = TextStyle::from((family, 14))
            .color(&ink)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let plot = chart.plotting_area();
        for s in segs {
            let rect = [(-half, s.bottom), (half, s.bottom + s.height)];
            plot.draw(&Rectangle::new(rect, color.with_alpha(s.alpha.min(1.0)).filled()))
                .map_err(draw_err)?;
            plot.draw(&Rectangle::new(rect, color.rgb().stroke_width(2)))
                .map_err(draw_err)?;
            plot.draw(&Text::new(s.text(), (0.0, s.bottom + s.height / 2.0), label_style.clone()))
                .map_err(draw_err)?;
        }
        if let Some(title) = &self.opts.side_title {
            let white = crate::theme::WHITE.rgb();
            let style = TextStyle::from((family, 12))
                .color(&white)
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            plot.draw(&Text::new(title.as_str(), (0.0, 1.02), style))
                .map_err(draw_err)?;
        }
        // backend_coord is absolute; connectors are drawn on the root canvas
        Ok((chart.backend_coord(&(-half, 1.0)), chart.backend_coord(&(-half, low))))
    }
}

impl Chart for Pie<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let items = self.legend_items();
        let (body, legend_area) = legend::split_for_legend(canvas, &items);

        let font = self.theme.font_color.rgb();
        let title_style = TextStyle::from((family, self.theme.title_size)).color(&font);
        let titled = body
            .titled(&self.title(), title_style)
            .map_err(draw_err)?;
        let (pie_area, side_area) = if self.side.is_some() {
            let (w, _) = titled.dim_in_pixel();
            let (l, r) = titled.split_horizontally((w as f64 * 0.6) as i32);
            (l, Some(r))
        } else {
            (titled, None)
        };

        let (w, h) = pie_area.dim_in_pixel();
        let center = (f64::from(w) / 2.0, f64::from(h) / 2.0);
        let r = f64::from(w.min(h)) * 0.35 * self.opts.radius;
        self.draw_wedges(&pie_area, center, r, family)?;

        let (base_x, base_y) = pie_area.get_base_pixel();
        let abs_center = (center.0 + f64::from(base_x), center.1 + f64::from(base_y));

        if let (Some(area), Some((color, segs))) = (side_area.as_ref(), self.side.as_ref()) {
            let (top, bottom) = self.draw_side_bar(area, *color, segs, family)?;
            if self.opts.side_lines {
                let start = polar(abs_center, self.opts.connector * r, 0.0);
                let style = ShapeStyle {
                    color: color.with_alpha(0.3),
                    filled: false,
                    stroke_width: 1,
                };
                for end in [top, bottom] {
                    for seg in dash_segments(start, end, 6.0, 4.0) {
                        canvas
                            .draw(&PathElement::new(seg.to_vec(), style))
                            .map_err(draw_err)?;
                    }
                }
            }
        }

        if let Some(area) = legend_area.as_ref() {
            let (_, area_y) = area.get_base_pixel();
            let top = (abs_center.1 - r) as i32 - area_y;
            legend::draw_legend_panel(area, &items, family, top)?;
        }

        let pie_box = (
            (abs_center.0 - r) as i32..(abs_center.0 + r) as i32,
            (abs_center.1 - r) as i32..(abs_center.1 + r) as i32,
        );
        self.opts
            .text
            .annotation(1.45, -0.1, annotation::WIDE)
            .draw(canvas, pie_box, family)
    }
}

pub fn pie<P: AsRef<Path>>(values: &[f64], opts: PieOptions, theme: &Theme, out: P) -> Result<()> {
    let chart = Pie::new(values, opts, theme)?;
    viz::render(&chart, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wedges_cover_the_circle_from_start_angle() {
        let t = Theme::default();
        let opts = PieOptions {
            start_angle: 90.0,
            ..PieOptions::default()
        };
        let p = Pie::new(&[1.0, 1.0, 2.0], opts, &t).unwrap();
        let w = p.wedges();
        assert_eq!(w[0].theta1, 90.0);
        assert_eq!(w[2].theta2, 450.0);
        assert_eq!(w[2].percent_text(), "50.0 %");
        assert_eq!(w[1].color, Palette::neon_extended().pick(1));
        assert_eq!(p.title(), "pie plot");
    }

    #[test]
    fn ratios_stack_from_the_largest() {
        let labels: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let segs = stack_ratios(&[0.5, 0.2, 0.3], &labels);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].height, 0.5);
        assert_eq!(segs[0].label, "c");
        assert_eq!(segs[0].alpha, 0.9);
        assert!((segs[1].alpha - 0.7).abs() < 1e-12);
        assert!((segs[2].bottom - 0.0).abs() < 1e-12);
        assert_eq!(segs[0].text(), "50.0%");
    }

    #[test]
    fn rejects_negative_and_empty_values() {
        let t = Theme::default();
        assert!(Pie::new(&[1.0, -1.0], PieOptions::default(), &t).is_err());
        assert!(Pie::new(&[], PieOptions::default(), &t).is_err());
        assert!(Pie::new(&[0.0, 0.0], PieOptions::default(), &t).is_err());
    }

    #[test]
    fn side_bar_selector() {
        assert_eq!(side_bar_color(3).unwrap(), ICE);
        assert!(side_bar_color(6).is_err());
    }

    #[test]
    fn dashes_cover_segment() {
        let d = dash_segments((0, 0), (20, 0), 6.0, 4.0);
        assert_eq!(d, vec![[(0, 0), (6, 0)], [(10, 0), (16, 0)]]);
    }
}
