//! Rendering: output backends, fonts, the neon axes, legends and markers.
//!
//! - `.svg` output goes through `plotters-svg`, everything else is a bitmap
//! - Text uses the `ab_glyph` path; see [`fonts`] for how a font is found
//! - Every chart implements [`Chart`] and is drawn by [`render`]

pub mod axes;
pub mod fonts;
pub mod legend;
pub mod markers;
pub mod text;

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::path::Path;

use crate::annotation::Annotation;
use crate::error::draw_err;
use crate::theme::Theme;
use axes::{Axes2d, AxesSpec};
use legend::LegendItem;

/// A chart that can draw itself onto any plotters backend.
pub trait Chart {
    fn theme(&self) -> &Theme;

    /// Canvas size in pixels.
    fn size(&self) -> (u32, u32) {
        self.theme().figsize
    }

    /// Draw onto `canvas`, already filled with the background color.
    fn draw<DB: DrawingBackend>(&self, canvas: &DrawingArea<DB, Shift>, family: FontFamily<'_>) -> Result<()>;
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

fn draw_root<C: Chart, DB: DrawingBackend>(
    chart: &C,
    root: &DrawingArea<DB, Shift>,
    family: FontFamily<'_>,
) -> Result<()> {
    let bg = chart.theme().bg_color.rgb();
    root.fill(&bg).map_err(draw_err)?;
    chart.draw(root, family)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

/// Render `chart` to `out`; the extension picks SVG or bitmap output.
pub fn render<C: Chart, P: AsRef<Path>>(chart: &C, out: P) -> Result<()> {
    let family = fonts::resolve(chart.theme())?;
    let out = out.as_ref();
    let size = chart.size();
    if is_svg(out) {
        let root = SVGBackend::new(out, size).into_drawing_area();
        draw_root(chart, &root, family)?;
    } else {
        let root = BitMapBackend::new(out, size).into_drawing_area();
        draw_root(chart, &root, family)?;
    }
    log::info!("wrote {} ({}x{})", out.display(), size.0, size.1);
    Ok(())
}

/// Render `chart` to an in-memory SVG document.
pub fn render_svg_string<C: Chart>(chart: &C) -> Result<String> {
    let family = fonts::resolve(chart.theme())?;
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, chart.size()).into_drawing_area();
        draw_root(chart, &root, family)?;
    }
    Ok(buf)
}

/// Everything drawn after the data: category labels, the legend panel and
/// the annotation. All of these go onto the top-level canvas.
pub(crate) fn finish_axes<DB: DrawingBackend>(
    canvas: &DrawingArea<DB, Shift>,
    chart: &Axes2d<'_, DB>,
    theme: &Theme,
    family: FontFamily<'_>,
    spec: &AxesSpec<'_>,
    legend: Option<(&DrawingArea<DB, Shift>, &[LegendItem])>,
    annotation: &Annotation,
) -> Result<()> {
    axes::draw_category_labels(
        canvas,
        chart,
        theme,
        family,
        spec.x_categories,
        spec.y_categories,
    )?;
    let pixels = axes::plot_pixels(chart);
    if let Some((area, items)) = legend {
        // Panel coordinates are relative to its own area.
        let (_, area_y) = area.get_base_pixel();
        legend::draw_legend_panel(area, items, family, pixels.1.start - area_y)?;
    }
    annotation.draw(canvas, pixels, family)
}
