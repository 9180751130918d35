//! Density histograms (`hist`) and distribution plots (`displot`), with an
//! optional KDE curve per group.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ChartText;
use crate::annotation;
use crate::dataset::Dataset;
use crate::error::{NeonError, draw_err};
use crate::glow::GlowSpec;
use crate::hue::{self, HueGroup};
use crate::stats::{Histogram, Kde};
use crate::theme::{Palette, Theme};
use crate::viz::axes::{self, AxesSpec, extent};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::{self, Chart};

const KDE_POINTS: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistType {
    /// Filled bars at alpha 0.5.
    #[default]
    Bar,
    /// Unfilled outline.
    Step,
}

impl std::str::FromStr for HistType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bar" => Ok(HistType::Bar),
            "step" => Ok(HistType::Step),
            other => Err(format!("unknown histtype `{other}` (bar, step)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistOptions {
    pub text: ChartText,
    pub hue: Option<String>,
    pub bins: usize,
    pub histtype: HistType,
    pub cumulative: bool,
    /// Numeric column weighting each row's count. Rows without a weight are dropped.
    pub weights: Option<String>,
    /// Stack the hue groups' bars on shared bins.
    pub stacked: bool,
    pub kde: bool,
    /// `None` uses the histogram palette (rose, ice, lemon, ...).
    pub palette: Option<Palette>,
}

impl Default for HistOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            hue: None,
            bins: 20,
            histtype: HistType::Bar,
            cumulative: false,
            weights: None,
            stacked: false,
            kde: false,
            palette: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplotOptions {
    pub text: ChartText,
    pub hue: Option<String>,
    pub bins: usize,
    pub kde: bool,
    pub figsize: (u32, u32),
}

impl Default for DisplotOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            hue: None,
            bins: 30,
            kde: false,
            figsize: (800, 600),
        }
    }
}

/// One hue group's histogram and density curve.
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    pub group: HueGroup,
    pub histogram: Histogram,
    /// Per-bin baseline of a stacked histogram; empty otherwise.
    pub bottom: Vec<f64>,
    /// Empty when KDE is off or the group cannot carry one.
    pub kde: Vec<(f64, f64)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Hist,
    Displot,
}

pub struct Hist<'a> {
    theme: &'a Theme,
    kind: Kind,
    y: String,
    text: ChartText,
    histtype: HistType,
    kde: bool,
    size: (u32, u32),
    dists: Vec<Distribution>,
}

impl Distribution {
    fn base(&self, bin: usize) -> f64 {
        self.bottom.get(bin).copied().unwrap_or(0.0)
    }

    /// Bar corners, from the baseline to the top of each bin.
    pub fn bars(&self) -> Vec<[(f64, f64); 2]> {
        self.histogram
            .bins()
            .enumerate()
            .map(|(i, (l, r, v))| {
                let b = self.base(i);
                [(l, b), (r, b + v)]
            })
            .collect()
    }

    /// Step path along the top of the bars.
    pub fn outline(&self) -> Vec<(f64, f64)> {
        let h = &self.histogram;
        if self.bottom.is_empty() {
            return h.step_outline();
        }
        let mut pts = Vec::with_capacity(h.heights.len() * 2 + 2);
        if let Some(&first) = h.edges.first() {
            pts.push((first, self.base(0)));
        }
        for (i, (l, r, v)) in h.bins().enumerate() {
            let top = self.base(i) + v;
            pts.push((l, top));
            pts.push((r, top));
        }
        if let Some(&last) = h.edges.last() {
            pts.push((last, self.base(h.heights.len().saturating_sub(1))));
        }
        pts
    }

    fn top(&self) -> f64 {
        self.histogram
            .heights
            .iter()
            .enumerate()
            .map(|(i, v)| self.base(i) + v)
            .fold(0.0, f64::max)
    }
}

struct Binning<'a> {
    bins: usize,
    cumulative: bool,
    weights: Option<&'a str>,
    stacked: bool,
    kde: bool,
}

fn distributions(
    data: &Dataset,
    y_column: &str,
    hue: Option<&str>,
    palette: &Palette,
    binning: Binning<'_>,
) -> Result<Vec<Distribution>> {
    let order = data.sorted_rows(y_column, true)?;
    let ys = data.numeric(y_column)?;
    let ws = binning.weights.map(|w| data.numeric(w)).transpose()?;

    let mut groups = Vec::new();
    for group in hue::partition(data, hue, palette, &order)? {
        let mut values = Vec::with_capacity(group.rows.len());
        let mut weights = Vec::new();
        for &row in &group.rows {
            let Some(v) = ys[row] else { continue };
            if let Some(ws) = &ws {
                let Some(w) = ws[row] else { continue };
                if w < 0.0 {
                    return Err(NeonError::InvalidInput(format!("negative weight {w} in row {row}")).into());
                }
                weights.push(w);
            }
            values.push(v);
        }
        // Groups without values are skipped rather than failing the chart.
        if values.iter().all(|v| !v.is_finite()) {
            log::debug!("group {:?} has no values, skipped", group.label);
            continue;
        }
        groups.push((group, values, ws.as_ref().map(|_| weights)));
    }

    let histograms: Vec<Histogram> = if binning.stacked {
        let input: Vec<(Vec<f64>, Option<Vec<f64>>)> =
            groups.iter().map(|(_, v, w)| (v.clone(), w.clone())).collect();
        Histogram::stacked(&input, binning.bins, true, binning.cumulative).unwrap_or_default()
    } else {
        groups
            .iter()
            .filter_map(|(_, v, w)| match w {
                Some(w) => Histogram::compute_weighted(v, w, binning.bins, true, binning.cumulative),
                None => Histogram::compute(v, binning.bins, true, binning.cumulative),
            })
            .collect()
    };
    if histograms.len() != groups.len() {
        // every weight of some group was dropped
        return Err(NeonError::EmptyData.into());
    }

    let mut out = Vec::with_capacity(groups.len());
    let mut running: Vec<f64> = Vec::new();
    for ((group, values, _), histogram) in groups.into_iter().zip(histograms) {
        let bottom = if binning.stacked {
            running.resize(histogram.heights.len(), 0.0);
            let bottom = running.clone();
            for (acc, h) in running.iter_mut().zip(&histogram.heights) {
                *acc += h;
            }
            bottom
        } else {
            Vec::new()
        };
        let kde = if binning.kde {
            match Kde::silverman(&values) {
                Some(k) => k.curve(KDE_POINTS),
                None => {
                    log::debug!("group {:?} cannot carry a KDE, curve skipped", group.label);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        out.push(Distribution {
            group,
            histogram,
            bottom,
            kde,
        });
    }
    Ok(out)
}

impl<'a> Hist<'a> {
    pub fn new(data: &Dataset, y_column: &str, opts: HistOptions, theme: &'a Theme) -> Result<Self> {
        let palette = opts.palette.clone().unwrap_or_else(Palette::neon_histogram);
        let binning = Binning {
            bins: opts.bins,
            cumulative: opts.cumulative,
            weights: opts.weights.as_deref(),
            stacked: opts.stacked,
            kde: opts.kde,
        };
        let dists = distributions(data, y_column, opts.hue.as_deref(), &palette, binning)?;
        if dists.is_empty() {
            return Err(NeonError::EmptyData.into());
        }
        Ok(Self {
            theme,
            kind: Kind::Hist,
            y: y_column.to_string(),
            text: opts.text,
            histtype: opts.histtype,
            kde: opts.kde,
            size: theme.figsize,
            dists,
        })
    }

    /// Distribution plot. A hue column without any values yields a chart
    /// with nothing to draw (see [`Hist::is_empty`]); any other input
    /// without values is [`NeonError::EmptyData`].
    pub fn displot(data: &Dataset, y_column: &str, opts: DisplotOptions, theme: &'a Theme) -> Result<Self> {
        let binning = Binning {
            bins: opts.bins,
            cumulative: false,
            weights: None,
            stacked: false,
            kde: opts.kde,
        };
        let dists = distributions(data, y_column, opts.hue.as_deref(), &theme.palette, binning)?;
        if dists.is_empty() {
            let hue_is_blank = match opts.hue.as_deref() {
                Some(h) => hue::distinct_values(data, h)?.is_empty(),
                None => false,
            };
            if !hue_is_blank {
                return Err(NeonError::EmptyData.into());
            }
        }
        Ok(Self {
            theme,
            kind: Kind::Displot,
            y: y_column.to_string(),
            text: opts.text,
            histtype: HistType::Bar,
            kde: opts.kde,
            size: opts.figsize,
            dists,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    pub fn distributions(&self) -> &[Distribution] {
        &self.dists
    }

    pub fn title(&self) -> Option<String> {
        match self.kind {
            Kind::Hist => Some(self.text.title_or(|| self.y.clone())),
            Kind::Displot => self.text.title.clone(),
        }
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let mut items = Vec::new();
        for d in &self.dists {
            let label = match (&d.group.label, self.kind) {
                (Some(l), _) => Some(l.clone()),
                (None, Kind::Displot) => Some("Distribution".to_string()),
                (None, Kind::Hist) => None,
            };
            if let Some(l) = label {
                items.push(LegendItem::new(l, d.group.color, Glyph::Patch));
            }
        }
        if self.kde {
            for d in self.dists.iter().filter(|d| !d.kde.is_empty()) {
                let label = match &d.group.label {
                    Some(l) => format!("KDE ({l})"),
                    None => "KDE".to_string(),
                };
                items.push(LegendItem::new(label, d.group.color, Glyph::Line));
            }
        }
        items
    }

    fn axis_names(&self) -> (String, String) {
        match self.kind {
            // hist keeps the column on the y axis description
            Kind::Hist => (
                self.text.x_name.clone().unwrap_or_default(),
                self.text.y_label(&self.y),
            ),
            Kind::Displot => (self.text.y_label(&self.y), String::new()),
        }
    }
}

impl Chart for Hist<'_> {
    fn theme(&self) -> &Theme {
        self.theme
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()> {
        let items = self.legend_items();
        let (plot, legend_area) = legend::split_for_legend(canvas, &items);

        let xs = self.dists.iter().flat_map(|d| {
            d.histogram
                .edges
                .iter()
                .copied()
                .chain(d.kde.iter().map(|p| p.0))
        });
        let (x0, x1) = extent(xs).unwrap_or((0.0, 1.0));
        let top = self
            .dists
            .iter()
            .flat_map(|d| std::iter::once(d.top()).chain(d.kde.iter().map(|p| p.1)))
            .fold(0.0f64, f64::max);
        let top = if top > 0.0 { top * 1.05 } else { 1.0 };
        let pad = (x1 - x0) * 0.03;

        let title = self.title();
        let (x_desc, y_desc) = self.axis_names();
        let mut spec = AxesSpec::new((x0 - pad)..(x1 + pad), 0.0..top);
        spec.title = title.as_deref();
        spec.x_desc = &x_desc;
        spec.y_desc = &y_desc;
        let mut chart = axes::build(&plot, self.theme, family, &spec)?;

        for d in &self.dists {
            let c = d.group.color;
            match self.histtype {
                HistType::Bar => {
                    let rects = d.bars();
                    let fill = c.with_alpha(0.5).filled();
                    let edge = c.rgb().stroke_width(1);
                    chart
                        .draw_series(rects.iter().map(|r| Rectangle::new(*r, fill)))
                        .map_err(draw_err)?;
                    chart
                        .draw_series(rects.iter().map(|r| Rectangle::new(*r, edge)))
                        .map_err(draw_err)?;
                }
                HistType::Step => {
                    chart
                        .draw_series(LineSeries::new(d.outline(), c.rgb().stroke_width(1)))
                        .map_err(draw_err)?;
                }
            }
            if !d.kde.is_empty() {
                chart
                    .draw_series(LineSeries::new(d.kde.clone(), c.rgb().stroke_width(2)))
                    .map_err(draw_err)?;
            }
        }

        // The plain distribution plot has no halo.
        if self.kind == Kind::Hist {
            GlowSpec::HISTOGRAM.apply(|layer| {
                for d in &self.dists {
                    let style = layer.stroke(d.group.color);
                    match self.histtype {
                        HistType::Bar => {
                            let rects = d.bars();
                            chart
                                .draw_series(rects.iter().map(|r| Rectangle::new(*r, style)))
                                .map_err(draw_err)?;
                        }
                        HistType::Step => {
                            chart
                                .draw_series(LineSeries::new(d.outline(), style))
                                .map_err(draw_err)?;
                        }
                    }
                }
                Ok(())
            })?;
            GlowSpec::KDE.apply(|layer| {
                for d in self.dists.iter().filter(|d| !d.kde.is_empty()) {
                    chart
                        .draw_series(LineSeries::new(d.kde.clone(), layer.stroke(d.group.color)))
                        .map_err(draw_err)?;
                }
                Ok(())
            })?;
        }

        let note = self.text.annotation(1.45, -0.2, annotation::NARROW);
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

/// Density histogram of `y_column`.
pub fn hist<P: AsRef<Path>>(
    data: &Dataset,
    y_column: &str,
    opts: HistOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = Hist::new(data, y_column, opts, theme)?;
    viz::render(&chart, out)
}

/// Distribution plot of `y_column`. Returns `false`, and writes nothing,
/// when the hue column has no values at all.
pub fn displot<P: AsRef<Path>>(
    data: &Dataset,
    y_column: &str,
    opts: DisplotOptions,
    theme: &Theme,
    out: P,
) -> Result<bool> {
    let chart = Hist::displot(data, y_column, opts, theme)?;
    if chart.is_empty() {
        log::warn!("hue column has no values, nothing rendered");
        return Ok(false);
    }
    viz::render(&chart, out)?;
    Ok(true)
}
