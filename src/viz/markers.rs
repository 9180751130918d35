//! Marker shapes drawn at data coordinates with a fixed pixel size.

use anyhow::Result;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::error::draw_err;
use crate::theme::MarkerShape;

type DataArea<DB> = DrawingArea<DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Marker radius in pixels for a matplotlib-style area `s` (points squared).
pub fn radius_for_area(s: f64) -> i32 {
    ((s.max(1.0) / std::f64::consts::PI).sqrt()).round().max(1.0) as i32
}

/// Draw one marker of half-size `s` px centered on `at`.
pub fn draw_marker<DB: DrawingBackend>(
    area: &DataArea<DB>,
    at: (f64, f64),
    s: i32,
    st: ShapeStyle,
    marker: MarkerShape,
) -> Result<()> {
    match marker {
        MarkerShape::Circle => area
            .draw(&(EmptyElement::at(at) + Circle::new((0, 0), s, st)))
            .map_err(draw_err),
        MarkerShape::Square => area
            .draw(&(EmptyElement::at(at) + Rectangle::new([(-s, -s), (s, s)], st)))
            .map_err(draw_err),
        MarkerShape::Triangle => area
            .draw(&(EmptyElement::at(at) + Polygon::new(vec![(0, -s), (-s, s), (s, s)], st)))
            .map_err(draw_err),
        MarkerShape::Diamond => area
            .draw(
                &(EmptyElement::at(at)
                    + Polygon::new(vec![(0, -s), (-s, 0), (0, s), (s, 0)], st)),
            )
            .map_err(draw_err),
        MarkerShape::Cross => area
            .draw(
                &(EmptyElement::at(at)
                    + PathElement::new(vec![(-s, 0), (s, 0)], st.stroke_width(2))
                    + PathElement::new(vec![(0, -s), (0, s)], st.stroke_width(2))),
            )
            .map_err(draw_err),
        MarkerShape::X => area
            .draw(
                &(EmptyElement::at(at)
                    + PathElement::new(vec![(-s, -s), (s, s)], st.stroke_width(2))
                    + PathElement::new(vec![(-s, s), (s, -s)], st.stroke_width(2))),
            )
            .map_err(draw_err),
    }
}
