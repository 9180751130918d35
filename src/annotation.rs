//! Free-text annotation: fixed-width wrapping and right-aligned placement.

use crate::error::draw_err;
use crate::theme::WHITE;
use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

/// Wrap width used by scatter, bar, barh and pie.
pub const WIDE: usize = 80;
/// Wrap width used by the other charts.
pub const NARROW: usize = 60;

/// Greedy fixed-length chunks of `width` characters. Words are not kept
/// together; `ceil(len / width)` lines come back in text order.
pub fn wrap_fixed(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub text: String,
    /// Anchor in axes fraction; 0..1 spans the plotting area, values outside
    /// reach into the margins.
    pub x: f64,
    pub y: f64,
    pub line_width: usize,
    /// Gap between lines, in axes fraction.
    pub spacing: f64,
    pub font_px: u32,
}

impl Annotation {
    pub fn new(text: impl Into<String>, x: f64, y: f64, line_width: usize) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            line_width,
            spacing: 0.03,
            font_px: 12,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        wrap_fixed(&self.text, self.line_width)
    }

    /// Pixel anchors (right edge, baseline) for every line, given the pixel
    /// ranges of the axes and the canvas size. The block is shifted as a whole
    /// so that it stays on the canvas.
    pub fn place(
        &self,
        axes: (Range<i32>, Range<i32>),
        canvas: (u32, u32),
    ) -> Vec<(String, (i32, i32))> {
        let (xr, yr) = axes;
        let w = f64::from(xr.end - xr.start);
        let h = f64::from(yr.end - yr.start);
        let (cw, ch) = (canvas.0 as i32, canvas.1 as i32);

        let px = (f64::from(xr.start) + self.x * w).round() as i32;
        let px = px.clamp(1, (cw - 2).max(1));

        let mut placed: Vec<(String, (i32, i32))> = self
            .lines()
            .into_iter()
            .enumerate()
            .map(|(k, line)| {
                let fy = self.y - k as f64 * self.spacing;
                let py = (f64::from(yr.end) - fy * h).round() as i32;
                (line, (px, py))
            })
            .collect();

        if let (Some(first), Some(last)) = (placed.first(), placed.last()) {
            let top = first.1.1 - self.font_px as i32;
            let bottom = last.1.1;
            let shift = if bottom > ch - 2 {
                (ch - 2) - bottom
            } else if top < 0 {
                -top
            } else {
                0
            };
            for (_, (_, y)) in placed.iter_mut() {
                *y += shift;
            }
        }
        placed
    }

    /// Draw onto the top-level canvas (absolute pixel coordinates).
    pub fn draw<DB: DrawingBackend>(
        &self,
        canvas: &DrawingArea<DB, Shift>,
        axes: (Range<i32>, Range<i32>),
        family: FontFamily<'_>,
    ) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let white = WHITE.rgb();
        let style = TextStyle::from((family, self.font_px))
            .color(&white)
            .pos(Pos::new(HPos::Right, VPos::Bottom));
        for (line, pos) in self.place(axes, canvas.dim_in_pixel()) {
            canvas
                .draw(&Text::new(line, pos, style.clone()))
                .map_err(draw_err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_fixed("", 80).is_empty());
    }

    #[test]
    fn splits_mid_word() {
        assert_eq!(wrap_fixed("neon tokyo", 4), vec!["neon", " tok", "yo"]);
    }

    #[test]
    fn lines_step_down_by_spacing() {
        let a = Annotation::new("a".repeat(130), 0.5, 0.5, 60);
        let placed = a.place((100..900, 100..700), (1000, 800));
        assert_eq!(placed.len(), 3);
        // 0.03 of a 600 px axes is 18 px
        assert_eq!(placed[1].1.1 - placed[0].1.1, 18);
        assert_eq!(placed[2].1.1 - placed[1].1.1, 18);
        assert!(placed.iter().all(|(_, (x, _))| *x == 500));
    }

    #[test]
    fn offscreen_anchor_is_pulled_onto_canvas() {
        let a = Annotation::new("far right and below", 1.45, -0.2, 80);
        let placed = a.place((100..900, 100..700), (1000, 800));
        let (_, (x, y)) = &placed[0];
        assert_eq!(*x, 998);
        assert!(*y <= 798);
    }
}
