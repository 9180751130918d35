//! Scatter plot with glowing marker outlines.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::{ChartText, hue_legend, xy_points};
use crate::annotation;
use crate::dataset::Dataset;
use crate::error::{NeonError, draw_err};
use crate::glow::GlowSpec;
use crate::hue::{self, HueGroup};
use crate::theme::Theme;
use crate::viz::axes::{self, AxesSpec, extent, padded_range};
use crate::viz::legend::{self, Glyph, LegendItem};
use crate::viz::markers::radius_for_area;
use crate::viz::{self, Chart};

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterOptions {
    pub text: ChartText,
    pub hue: Option<String>,
    /// Marker area in points squared.
    pub s: f64,
    pub alpha: f64,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            text: ChartText::default(),
            hue: None,
            s: 80.0,
            alpha: 0.7,
        }
    }
}

pub struct Scatter<'a> {
    theme: &'a Theme,
    x: String,
    y: String,
    opts: ScatterOptions,
    groups: Vec<(HueGroup, Vec<(f64, f64)>)>,
}

impl<'a> Scatter<'a> {
    /// Validate columns and partition rows (sorted by `y` descending) by hue.
    pub fn new(
        data: &Dataset,
        y_column: &str,
        x_column: &str,
        opts: ScatterOptions,
        theme: &'a Theme,
    ) -> Result<Self> {
        let order = data.sorted_rows(y_column, true)?;
        let groups = hue::partition(data, opts.hue.as_deref(), &theme.palette, &order)?
            .into_iter()
            .map(|g| {
                let pts = xy_points(data, &g.rows, x_column, y_column)?;
                Ok((g, pts))
            })
            .collect::<Result<Vec<_>, NeonError>>()?;
        if groups.iter().all(|(_, p)| p.is_empty()) {
            return Err(NeonError::EmptyData.into());
        }
        Ok(Self {
            theme,
            x: x_column.to_string(),
            y: y_column.to_string(),
            opts,
            groups,
        })
    }

    pub fn groups(&self) -> impl Iterator<Item = &HueGroup> {
        self.groups.iter().map(|(g, _)| g)
    }

    pub fn title(&self) -> String {
        self.opts.text.title_or(|| format!("{} by {}", self.x, self.y))
    }

    pub fn legend_items(&self) -> Vec<LegendItem> {
        let groups: Vec<HueGroup> = self.groups().cloned().collect();
        hue_legend(&groups, Glyph::Dot)
    }
}

impl Chart for Scatter<'_> {
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
        let mut spec = AxesSpec::new(padded_range(x0, x1, 0.05), padded_range(y0, y1, 0.05));
        spec.title = Some(&title);
        spec.x_desc = &x_desc;
        spec.y_desc = &y_desc;
        let mut chart = axes::build(&plot, self.theme, family, &spec)?;

        let r = radius_for_area(self.opts.s);
        for (g, pts) in &self.groups {
            let face = g.color.with_alpha(self.opts.alpha).filled();
            let edge = g.color.rgb().stroke_width(1);
            chart
                .draw_series(pts.iter().map(|&c| Circle::new(c, r, face)))
                .map_err(draw_err)?;
            chart
                .draw_series(pts.iter().map(|&c| Circle::new(c, r, edge)))
                .map_err(draw_err)?;
        }
        GlowSpec::OUTLINE.apply(|layer| {
            for (g, pts) in &self.groups {
                let style = layer.stroke(g.color);
                chart
                    .draw_series(pts.iter().map(|&c| Circle::new(c, r, style)))
                    .map_err(draw_err)?;
            }
            Ok(())
        })?;

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

/// Scatter `y_column` against `x_column` and write the figure to `out`.
pub fn scatter<P: AsRef<Path>>(
    data: &Dataset,
    y_column: &str,
    x_column: &str,
    opts: ScatterOptions,
    theme: &Theme,
    out: P,
) -> Result<()> {
    let chart = Scatter::new(data, y_column, x_column, opts, theme)?;
    viz::render(&chart, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;

    fn data() -> Dataset {
        Dataset::from_columns(vec![
            Column::numeric("x", [1.0, 2.0, 3.0, 4.0]),
            Column::numeric("y", [3.0, 1.0, 4.0, 2.0]),
            Column::text("kind", ["a", "b", "a", "c"]),
        ])
        .unwrap()
    }

    #[test]
    fn default_title_and_names() {
        let t = Theme::default();
        let c = Scatter::new(&data(), "y", "x", ScatterOptions::default(), &t).unwrap();
        assert_eq!(c.title(), "x by y");
        assert!(c.legend_items().is_empty());
    }

    #[test]
    fn hue_groups_take_palette_colors() {
        let t = Theme::default();
        let opts = ScatterOptions {
            hue: Some("kind".into()),
            ..ScatterOptions::default()
        };
        let c = Scatter::new(&data(), "y", "x", opts, &t).unwrap();
        let groups: Vec<&HueGroup> = c.groups().collect();
        assert_eq!(groups.len(), 3);
        for (i, g) in groups.iter().enumerate() {
            assert_eq!(g.color, t.palette.pick(i));
        }
        // rows follow the y-descending order
        assert_eq!(groups[0].rows, vec![2, 0]);
    }

    #[test]
    fn unknown_column_fails() {
        let t = Theme::default();
        let err = Scatter::new(&data(), "nope", "x", ScatterOptions::default(), &t).err().unwrap();
        assert!(err.to_string().contains("nope"));
    }
}
