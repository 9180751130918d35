//! Legend panel to the right of the axes ("upper left, anchored at (1, 1)").
//!
//! Labels are white, glyphs carry the neon halo (a wider translucent stroke
//! under the glyph), and long labels wrap inside the panel.

use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::{max_text_width_px, wrap_text_to_width};
use crate::error::draw_err;
use crate::theme::{Rgb8, WHITE};

/// How an entry is drawn next to its label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    /// Filled dot (scatter).
    Dot,
    /// Short line (line, KDE, violin).
    Line,
    /// Small rectangle (bar, histogram, pie, box).
    Patch,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LegendItem {
    pub label: String,
    pub color: Rgb8,
    pub glyph: Glyph,
}

impl LegendItem {
    pub fn new(label: impl Into<String>, color: Rgb8, glyph: Glyph) -> Self {
        Self {
            label: label.into(),
            color,
            glyph,
        }
    }
}

const FONT_PX: u32 = 14;
const LINE_H: i32 = FONT_PX as i32 + 4;
const ROW_GAP: i32 = 6;
const PAD_X: i32 = 10;
const GLYPH_W: i32 = 22;
const GLYPH_TO_TEXT: i32 = 10;

/// Width the panel wants for these labels, bounded to a share of the canvas.
pub fn panel_width_px(items: &[LegendItem], canvas_w: u32) -> u32 {
    let text = max_text_width_px(items.iter().map(|i| i.label.as_str()), FONT_PX);
    let wanted = text + (PAD_X * 2 + GLYPH_W + GLYPH_TO_TEXT) as u32;
    wanted.clamp(90, (canvas_w as f32 * 0.28) as u32)
}

/// Split `area` into (plot, legend) when there is anything to list.
pub fn split_for_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    items: &[LegendItem],
) -> (DrawingArea<DB, Shift>, Option<DrawingArea<DB, Shift>>) {
    if items.is_empty() {
        return (area.clone(), None);
    }
    let (w, _) = area.dim_in_pixel();
    let panel = panel_width_px(items, w) as i32;
    let (plot, legend) = area.split_horizontally(w as i32 - panel);
    (plot, Some(legend))
}

fn draw_glyph<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    glyph: Glyph,
    color: Rgb8,
    (x, y): (i32, i32),
) -> Result<()> {
    let halo = ShapeStyle {
        color: color.with_alpha(0.5),
        filled: false,
        stroke_width: 3,
    };
    match glyph {
        Glyph::Dot => {
            area.draw(&Circle::new((x + GLYPH_W / 2, y), 6, halo))
                .map_err(draw_err)?;
            area.draw(&Circle::new((x + GLYPH_W / 2, y), 5, color.with_alpha(0.8).filled()))
                .map_err(draw_err)?;
        }
        Glyph::Line => {
            let pts = vec![(x, y), (x + GLYPH_W, y)];
            area.draw(&PathElement::new(pts.clone(), halo)).map_err(draw_err)?;
            area.draw(&PathElement::new(pts, color.rgb().stroke_width(2)))
                .map_err(draw_err)?;
        }
        Glyph::Patch => {
            let rect = [(x, y - 6), (x + GLYPH_W, y + 6)];
            area.draw(&Rectangle::new(rect, halo)).map_err(draw_err)?;
            area.draw(&Rectangle::new(rect, color.with_alpha(0.7).filled()))
                .map_err(draw_err)?;
        }
    }
    Ok(())
}

/// Draw the entries top-down starting at `top_px` (the top edge of the axes).
pub fn draw_legend_panel<DB: DrawingBackend>(
    legend_area: &DrawingArea<DB, Shift>,
    items: &[LegendItem],
    family: FontFamily<'_>,
    top_px: i32,
) -> Result<()> {
    let (w, _) = legend_area.dim_in_pixel();
    let white = WHITE.rgb();
    let label_style = TextStyle::from((family, FONT_PX))
        .color(&white)
        .pos(Pos::new(HPos::Left, VPos::Center));

    let text_x = PAD_X + GLYPH_W + GLYPH_TO_TEXT;
    let max_text_w = (w as i32 - text_x - PAD_X).max(40) as u32;

    let mut y = top_px.max(PAD_X);
    for item in items {
        let lines = wrap_text_to_width(&item.label, FONT_PX, max_text_w);
        let block_h = (lines.len().max(1) as i32) * LINE_H;
        draw_glyph(legend_area, item.glyph, item.color, (PAD_X, y + LINE_H / 2))?;
        for (i, line) in lines.iter().enumerate() {
            let line_center = y + i as i32 * LINE_H + LINE_H / 2;
            legend_area
                .draw(&Text::new(line.as_str(), (text_x, line_center), label_style.clone()))
                .map_err(draw_err)?;
        }
        y += block_h + ROW_GAP;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ROSE;

    #[test]
    fn panel_width_is_bounded() {
        let short = vec![LegendItem::new("a", ROSE, Glyph::Dot)];
        assert_eq!(panel_width_px(&short, 1000), 90);
        let long = vec![LegendItem::new("x".repeat(200), ROSE, Glyph::Dot)];
        assert_eq!(panel_width_px(&long, 1000), 280);
    }
}
