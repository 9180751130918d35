//! Box plots of labeled series, and the box-plus-points variant.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::ChartText;
use crate::annotation;
use crate::dataset::Series;
use crate::error::{NeonError, draw_err};
use crate::stats::BoxStats;
use crate::theme::{MarkerShape, PAPER, Palette, Rgb8, Theme};
use crate::viz::axes::{self, Axes2d, AxesSpec, extent, padded_range};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::markers::{draw_marker, radius_for_area};
use crate::viz::{self, Chart};

/// Box face opacity, `0x60` of `0xFF`.
const FACE_ALPHA: f64 = 96.0 / 255.0;

#[derive(Clone, Debug, PartialEq)]
pub struct BoxOptions {
    /// No title is drawn unless one is given; axis names default to empty.
    pub text: ChartText,
    /// Overrides the series labels by position.
    pub labels: Option<Vec<String>>,
    /// Whisker reach in multiples of the IQR.
    pub whis: f64,
    pub notch: bool,
    pub show_means: bool,
    pub show_fliers: bool,
    pub widths: f64,
    /// `None` uses the eight-color palette.
    pub palette: Option<Palette>,
}

impl Default for BoxOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            labels: None,
            whis: 1.5,
            notch: false,
            show_means: false,
            show_fliers: true,
            widths: 0.5,
            palette: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterboxOptions {
    pub boxes: BoxOptions,
    /// List every series in a legend panel.
    pub legend: bool,
    /// Point marker area.
    pub s: f64,
    pub alpha: f64,
}

impl Default for ScatterboxOptions {
    fn default() -> Self {
        Self {
            boxes: BoxOptions {
                show_fliers: false,
                ..BoxOptions::default()
            },
            legend: false,
            s: 30.0,
            alpha: 0.7,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxEntry {
    pub label: String,
    pub position: f64,
    pub color: Rgb8,
    pub stats: BoxStats,
    pub values: Vec<f64>,
}

pub struct BoxPlot<'a> {
    theme: &'a Theme,
    opts: BoxOptions,
    entries: Vec<BoxEntry>,
    labels: Vec<String>,
    /// Points, and their legend flag, for the scatterbox variant.
    points: Option<(bool, f64, f64)>,
}

impl<'a> BoxPlot<'a> {
    /// Series without finite values are skipped; their slot stays empty.
    pub fn new(series: &[Series], opts: BoxOptions, theme: &'a Theme) -> Result<Self> {
        let palette = opts.palette.clone().unwrap_or_else(Palette::neon_extended);
        let mut entries = Vec::with_capacity(series.len());
        let mut labels = Vec::with_capacity(series.len());
        for (i, s) in series.iter().enumerate() {
            let label = opts
                .labels
                .as_ref()
                .and_then(|l| l.get(i).cloned())
                .unwrap_or_else(|| s.label.clone());
            let values: Vec<f64> = s.values.iter().copied().filter(|v| v.is_finite()).collect();
            labels.push(label.clone());
            let Some(stats) = BoxStats::compute(&values, opts.whis) else {
                log::debug!("box {label:?} has no values, skipped");
                continue;
            };
            entries.push(BoxEntry {
                label,
                position: i as f64,
                color: palette.pick(i),
                stats,
                values,
            });
        }
        if entries.is_empty() {
            return Err(NeonError::EmptyData.into());
        }
        Ok(Self {
            theme,
            opts,
            entries,
            labels,
            points: None,
        })
    }

    pub fn scatterbox(series: &[Series], opts: ScatterboxOptions, theme: &'a Theme) -> Result<Self> {
        let mut chart = Self::new(series, opts.boxes, theme)?;
        chart.points = Some((opts.legend, opts.s, opts.alpha));
        Ok(chart)
    }

    pub fn boxes(&self) -> &[BoxEntry] {
        &self.entries
    }

    /// Category labels, one per input series, including those without a box.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        match self.points {
            Some((true, _, _)) => self
                .entries
                .iter()
                .map(|e| LegendItem::new(e.label.clone(), e.color, Glyph::Patch))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn y_range(&self) -> std::ops::Range<f64> {
        let show_points = self.points.is_some();
        let values = self.entries.iter().flat_map(|e| {
            let s = &e.stats;
            let mut v = vec![s.whisker_low, s.whisker_high];
            if self.opts.show_fliers {
                v.extend(&s.fliers);
            }
            if self.opts.notch {
                v.extend([s.notch_low, s.notch_high]);
            }
            if show_points {
                v.extend(&e.values);
            }
            v
        });
        match extent(values) {
            Some((lo, hi)) => padded_range(lo, hi, 0.05),
            None => 0.0..1.0,
        }
    }

    fn box_outline(&self, e: &BoxEntry) -> Vec<(f64, f64)> {
        let hw = self.opts.widths / 2.0;
        let (x, s) = (e.position, &e.stats);
        if self.opts.notch {
            vec![
                (x - hw, s.q1),
                (x + hw, s.q1),
                (x + hw, s.notch_low),
                (x + hw / 2.0, s.median),
                (x + hw, s.notch_high),
                (x + hw, s.q3),
                (x - hw, s.q3),
                (x - hw, s.notch_high),
                (x - hw / 2.0, s.median),
                (x - hw, s.notch_low),
                (x - hw, s.q1),
            ]
        } else {
            vec![
                (x - hw, s.q1),
                (x + hw, s.q1),
                (x + hw, s.q3),
                (x - hw, s.q3),
                (x - hw, s.q1),
            ]
        }
    }

    fn draw_box<DB: DrawingBackend>(&self, chart: &mut Axes2d<'_, DB>, e: &BoxEntry) -> Result<()> {
        let hw = self.opts.widths / 2.0;
        let (x, s) = (e.position, &e.stats);
        let edge = e.color.rgb().stroke_width(2);
        let outline = self.box_outline(e);

        chart
            .draw_series(std::iter::once(Polygon::new(outline.clone(), e.color.with_alpha(FACE_ALPHA).filled())))
            .map_err(draw_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(outline, edge)))
            .map_err(draw_err)?;

        let median_hw = if self.opts.notch { hw / 2.0 } else { hw };
        let whiskers = [
            vec![(x, s.q1), (x, s.whisker_low)],
            vec![(x, s.q3), (x, s.whisker_high)],
            vec![(x - hw / 2.0, s.whisker_low), (x + hw / 2.0, s.whisker_low)],
            vec![(x - hw / 2.0, s.whisker_high), (x + hw / 2.0, s.whisker_high)],
        ];
        chart
            .draw_series(whiskers.into_iter().map(|p| PathElement::new(p, edge)))
            .map_err(draw_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x - median_hw, s.median), (x + median_hw, s.median)],
                PAPER.rgb().stroke_width(2),
            )))
            .map_err(draw_err)?;

        if self.opts.show_fliers {
            let ring = e.color.rgb().stroke_width(1);
            chart
                .draw_series(s.fliers.iter().map(|&v| Circle::new((x, v), 4, ring)))
                .map_err(draw_err)?;
        }
        if self.opts.show_means {
            draw_marker(chart.plotting_area(), (x, s.mean), 5, PAPER.rgb().filled(), MarkerShape::Triangle)?;
        }
        Ok(())
    }
}

impl Chart for BoxPlot<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let items = self.legend_items();
        let (plot, legend_area) = legend::split_for_legend(canvas, &items);

        let labels = self.labels();
        let x_desc = self.opts.text.x_name.clone().unwrap_or_default();
        let y_desc = self.opts.text.y_name.clone().unwrap_or_default();
        let n = labels.len() as f64;
        let mut spec = AxesSpec::new(-0.5..(n - 0.5), self.y_range());
        spec.title = self.opts.text.title.as_deref();
        spec.x_desc = &x_desc;
        spec.y_desc = &y_desc;
        spec.x_categories = Some(labels);
        let mut chart = axes::build(&plot, self.theme, family, &spec)?;

        for e in &self.entries {
            self.draw_box(&mut chart, e)?;
        }
        if let Some((_, s, alpha)) = self.points {
            let r = radius_for_area(s);
            for e in &self.entries {
                let style = e.color.with_alpha(alpha).filled();
                chart
                    .draw_series(e.values.iter().map(|&v| Circle::new((e.position, v), r, style)))
                    .map_err(draw_err)?;
            }
        }

        let note = self.opts.text.annotation(1.1, -0.2, annotation::NARROW);
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

pub fn boxplot<P: AsRef<Path>>(series: &[Series], opts: BoxOptions, theme: &Theme, out: P) -> Result<()> {
    let chart = BoxPlot::new(series, opts, theme)?;
    viz::render(&chart, out)
}

pub fn scatterbox<P: AsRef<Path>>(
    series: &[Series],
    opts: ScatterboxOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = BoxPlot::scatterbox(series, opts, theme)?;
    viz::render(&chart, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> Vec<Series> {
        vec![
            Series::new("a", vec![1.0, 2.0, 3.0, 4.0, 5.0, 40.0]),
            Series::new("empty", vec![f64::NAN]),
            Series::new("c", vec![10.0, 11.0, 12.0]),
        ]
    }

    #[test]
    fn empty_series_keep_their_slot() {
        let t = Theme::default();
        let b = BoxPlot::new(&series(), BoxOptions::default(), &t).unwrap();
        assert_eq!(b.boxes().len(), 2);
        assert_eq!(b.labels(), ["a", "empty", "c"]);
        assert_eq!(b.boxes()[1].color, Palette::neon_extended().pick(2));
        assert_eq!(b.boxes()[0].stats.fliers, vec![40.0]);
        assert!(b.legend_items().is_empty());
    }

    #[test]
    fn trailing_empty_series_keeps_a_slot() {
        let t = Theme::default();
        let mut s = series();
        s[1] = Series::new("mid", vec![f64::NAN]);
        s.push(Series::new("tail", vec![]));
        let b = BoxPlot::new(&s, BoxOptions::default(), &t).unwrap();
        assert_eq!(b.labels(), ["a", "mid", "c", "tail"]);
        let positions: Vec<f64> = b.boxes().iter().map(|e| e.position).collect();
        assert_eq!(positions, [0.0, 2.0]);
    }

    #[test]
    fn labels_override_series_names() {
        let t = Theme::default();
        let opts = BoxOptions {
            labels: Some(vec!["first".into()]),
            ..BoxOptions::default()
        };
        let b = BoxPlot::new(&series(), opts, &t).unwrap();
        assert_eq!(b.labels(), ["first", "empty", "c"]);
    }

    #[test]
    fn hidden_fliers_shrink_the_range() {
        let t = Theme::default();
        let with = BoxPlot::new(&series(), BoxOptions::default(), &t).unwrap();
        let opts = BoxOptions {
            show_fliers: false,
            ..BoxOptions::default()
        };
        let without = BoxPlot::new(&series(), opts, &t).unwrap();
        assert!(with.y_range().end > 40.0);
        assert!(without.y_range().end < 40.0);
    }

    #[test]
    fn scatterbox_legend_lists_series() {
        let t = Theme::default();
        let opts = ScatterboxOptions {
            legend: true,
            ..ScatterboxOptions::default()
        };
        let b = BoxPlot::scatterbox(&series(), opts, &t).unwrap();
        let items = b.legend_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].label, "c");
        // points are part of the range even with fliers hidden
        assert!(b.y_range().end > 40.0);
    }

    #[test]
    fn all_empty_is_an_error() {
        let t = Theme::default();
        let r = BoxPlot::new(&[Series::new("x", vec![])], BoxOptions::default(), &t);
        assert!(r.is_err());
    }
}
