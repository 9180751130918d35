//! Two-dimensional binning and iso-lines used by joint plots.

use crate::stats::linspace;
use std::ops::Range;

/// One segment of an iso-line, in data coordinates.
pub type Segment = [(f64, f64); 2];

/// Density sampled on a regular grid; `z[j][i]` sits at `(xs[i], ys[j])`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub z: Vec<Vec<f64>>,
}

impl Field {
    pub fn new(x: Range<f64>, y: Range<f64>, z: Vec<Vec<f64>>) -> Self {
        let ny = z.len();
        let nx = z.first().map_or(0, Vec::len);
        Self {
            xs: linspace(x.start, x.end, nx),
            ys: linspace(y.start, y.end, ny),
            z,
        }
    }

    pub fn max(&self) -> f64 {
        self.z.iter().flatten().copied().fold(0.0, f64::max)
    }

    /// `n` evenly spaced levels strictly between zero and the peak.
    pub fn levels(&self, n: usize) -> Vec<f64> {
        let max = self.max();
        (1..=n).map(|k| max * k as f64 / (n + 1) as f64).collect()
    }

    /// Bounding box of the grid points at or above `level`.
    pub fn extent_above(&self, level: f64) -> Option<((f64, f64), (f64, f64))> {
        let mut bounds: Option<((f64, f64), (f64, f64))> = None;
        for (j, row) in self.z.iter().enumerate() {
            for (i, &v) in row.iter().enumerate() {
                if v < level {
                    continue;
                }
                let (x, y) = (self.xs[i], self.ys[j]);
                bounds = Some(match bounds {
                    None => ((x, x), (y, y)),
                    Some(((x0, x1), (y0, y1))) => ((x0.min(x), x1.max(x)), (y0.min(y), y1.max(y))),
                });
            }
        }
        bounds
    }

    /// Marching squares. Saddle cells always separate the two corners
    /// below `level`.
    pub fn contour(&self, level: f64) -> Vec<Segment> {
        let mut out = Vec::new();
        let lerp = |p: (f64, f64, f64), q: (f64, f64, f64)| {
            let t = if q.2 == p.2 { 0.5 } else { (level - p.2) / (q.2 - p.2) };
            (p.0 + (q.0 - p.0) * t, p.1 + (q.1 - p.1) * t)
        };
        for j in 0..self.ys.len().saturating_sub(1) {
            for i in 0..self.xs.len().saturating_sub(1) {
                let a = (self.xs[i], self.ys[j], self.z[j][i]);
                let b = (self.xs[i + 1], self.ys[j], self.z[j][i + 1]);
                let c = (self.xs[i + 1], self.ys[j + 1], self.z[j + 1][i + 1]);
                let d = (self.xs[i], self.ys[j + 1], self.z[j + 1][i]);
                let inside = |p: (f64, f64, f64)| p.2 >= level;
                // bottom, right, top, left
                let edges = [(a, b), (b, c), (d, c), (a, d)];
                let hits: Vec<(f64, f64)> = edges
                    .iter()
                    .filter(|(p, q)| inside(*p) != inside(*q))
                    .map(|&(p, q)| lerp(p, q))
                    .collect();
                match hits.as_slice() {
                    [p, q] => out.push([*p, *q]),
                    [bottom, right, top, left] => {
                        out.push([*bottom, *right]);
                        out.push([*top, *left]);
                    }
                    _ => {}
                }
            }
        }
        out
    }
}

/// Counts on an `nx` x `ny` grid over the given ranges, row-major by y.
/// Points outside the ranges are ignored.
pub fn hist2d(points: &[(f64, f64)], nx: usize, ny: usize, x: &Range<f64>, y: &Range<f64>) -> Vec<Vec<f64>> {
    let (nx, ny) = (nx.max(1), ny.max(1));
    let mut counts = vec![vec![0.0; nx]; ny];
    let (wx, wy) = ((x.end - x.start) / nx as f64, (y.end - y.start) / ny as f64);
    if wx <= 0.0 || wy <= 0.0 {
        return counts;
    }
    for &(px, py) in points {
        if px < x.start || px > x.end || py < y.start || py > y.end {
            continue;
        }
        let i = (((px - x.start) / wx) as usize).min(nx - 1);
        let j = (((py - y.start) / wy) as usize).min(ny - 1);
        counts[j][i] += 1.0;
    }
    counts
}

#[derive(Clone, Debug, PartialEq)]
pub struct HexCell {
    pub center: (f64, f64),
    pub count: usize,
}

/// Hexagonal binning with `gridsize` hexagons across `x`. Two offset
/// rectangular lattices; each point goes to the nearer center.
#[derive(Clone, Debug, PartialEq)]
pub struct HexGrid {
    pub origin: (f64, f64),
    pub sx: f64,
    pub sy: f64,
}

impl HexGrid {
    pub fn new(x: &Range<f64>, y: &Range<f64>, gridsize: usize) -> Self {
        let nx = gridsize.max(1) as f64;
        let ny = (nx / 3f64.sqrt()).floor().max(1.0);
        let span = |r: &Range<f64>| if r.end > r.start { r.end - r.start } else { 1.0 };
        Self {
            origin: (x.start, y.start),
            sx: span(x) / nx,
            sy: span(y) / ny,
        }
    }

    /// Lattice key and center of the hexagon holding `(x, y)`.
    fn locate(&self, (x, y): (f64, f64)) -> ((i64, i64, bool), (f64, f64)) {
        let u = (x - self.origin.0) / self.sx;
        let v = (y - self.origin.1) / self.sy;
        let (i1, j1) = (u.round(), v.round());
        let (i2, j2) = (u.floor(), v.floor());
        let d1 = (u - i1).powi(2) + 3.0 * (v - j1).powi(2);
        let d2 = (u - i2 - 0.5).powi(2) + 3.0 * (v - j2 - 0.5).powi(2);
        if d1 <= d2 {
            (
                (i1 as i64, j1 as i64, false),
                (self.origin.0 + i1 * self.sx, self.origin.1 + j1 * self.sy),
            )
        } else {
            (
                (i2 as i64, j2 as i64, true),
                (
                    self.origin.0 + (i2 + 0.5) * self.sx,
                    self.origin.1 + (j2 + 0.5) * self.sy,
                ),
            )
        }
    }

    /// Occupied cells in first-hit order.
    pub fn bin(&self, points: &[(f64, f64)]) -> Vec<HexCell> {
        let mut index: ahash::AHashMap<(i64, i64, bool), usize> = ahash::AHashMap::new();
        let mut cells: Vec<HexCell> = Vec::new();
        for &p in points {
            let (key, center) = self.locate(p);
            match index.get(&key) {
                Some(&k) => cells[k].count += 1,
                None => {
                    index.insert(key, cells.len());
                    cells.push(HexCell { center, count: 1 });
                }
            }
        }
        cells
    }

    /// Vertices of the hexagon around `center`.
    pub fn hexagon(&self, center: (f64, f64)) -> Vec<(f64, f64)> {
        const UNIT: [(f64, f64); 6] = [(0.5, -0.5), (0.5, 0.5), (0.0, 1.0), (-0.5, 0.5), (-0.5, -0.5), (0.0, -1.0)];
        UNIT.iter()
            .map(|(u, v)| (center.0 + u * self.sx, center.1 + v * self.sy / 3.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_peak_gives_a_diamond() {
        let z = vec![vec![0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 0.0]];
        let f = Field::new(0.0..2.0, 0.0..2.0, z);
        let segs = f.contour(0.5);
        assert_eq!(segs.len(), 4);
        for seg in segs {
            for (x, y) in seg {
                assert!(((x - 1.0).abs() + (y - 1.0).abs() - 0.5).abs() < 1e-12);
            }
        }
        assert_eq!(f.extent_above(0.5), Some(((1.0, 1.0), (1.0, 1.0))));
        assert_eq!(f.levels(1), vec![0.5]);
    }

    #[test]
    fn flat_field_has_no_lines() {
        let f = Field::new(0.0..1.0, 0.0..1.0, vec![vec![1.0; 4]; 4]);
        assert!(f.contour(0.5).is_empty());
    }

    #[test]
    fn hist2d_counts_and_closes_last_bin() {
        let pts = [(0.0, 0.0), (1.0, 1.0), (0.9, 0.1), (5.0, 5.0)];
        let c = hist2d(&pts, 2, 2, &(0.0..1.0), &(0.0..1.0));
        assert_eq!(c, vec![vec![1.0, 1.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn hexbin_groups_nearby_points() {
        let g = HexGrid::new(&(0.0..10.0), &(0.0..10.0), 10);
        let cells = g.bin(&[(2.0, 2.0), (2.01, 2.01), (8.0, 8.0)]);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].count, 2);
        assert_eq!(cells.iter().map(|c| c.count).sum::<usize>(), 3);
        assert_eq!(g.hexagon(cells[0].center).len(), 6);
    }
}
