//! Glow halo: the same geometry redrawn at fading opacity.
//!
//! A shape is first drawn once at full strength by the chart. `GlowSpec`
//! then yields `passes` extra layers with loop index `i = passes..1`,
//! `alpha = i / alpha_divisor` and `stroke_width = i * width_step`, so the
//! widest stroke is also the most opaque and the halo thins out inwards.

use crate::theme::Rgb8;
use anyhow::Result;
use plotters::style::ShapeStyle;

/// One redraw of the halo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowLayer {
    /// Loop index, counting down from `passes` to 1.
    pub index: u32,
    pub alpha: f64,
    pub stroke_width: u32,
}

impl GlowLayer {
    /// Outline style for this layer.
    pub fn stroke(&self, color: Rgb8) -> ShapeStyle {
        ShapeStyle {
            color: color.with_alpha(self.alpha),
            filled: false,
            stroke_width: self.stroke_width,
        }
    }

    /// Filled style for this layer (full/semi bars).
    pub fn fill(&self, color: Rgb8) -> ShapeStyle {
        ShapeStyle {
            color: color.with_alpha(self.alpha),
            filled: true,
            stroke_width: self.stroke_width,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowSpec {
    pub passes: u32,
    pub alpha_divisor: f64,
    pub width_step: u32,
}

impl GlowSpec {
    /// Scatter markers, outlined bars and lines.
    pub const OUTLINE: GlowSpec = GlowSpec::new(20.0, 3);
    /// Filled and semi-filled bars.
    pub const FILLED_BAR: GlowSpec = GlowSpec::new(23.0, 3);
    /// Histogram patches.
    pub const HISTOGRAM: GlowSpec = GlowSpec::new(25.0, 1);
    /// Density curves over histograms.
    pub const KDE: GlowSpec = GlowSpec::new(24.0, 2);
    /// Violin bodies.
    pub const VIOLIN: GlowSpec = GlowSpec::new(25.0, 2);

    pub const fn new(alpha_divisor: f64, width_step: u32) -> Self {
        Self {
            passes: 4,
            alpha_divisor,
            width_step,
        }
    }

    pub fn layers(&self) -> impl Iterator<Item = GlowLayer> + '_ {
        (1..=self.passes).rev().map(move |i| GlowLayer {
            index: i,
            alpha: f64::from(i) / self.alpha_divisor,
            stroke_width: i * self.width_step,
        })
    }

    /// Run `draw` once per layer. `draw` must redraw the exact geometry of
    /// the base shape; only the style changes between calls.
    pub fn apply<F>(&self, mut draw: F) -> Result<()>
    where
        F: FnMut(&GlowLayer) -> Result<()>,
    {
        for layer in self.layers() {
            draw(&layer)?;
        }
        Ok(())
    }
}
