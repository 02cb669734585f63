use std::collections::{HashMap, VecDeque};

use geo::{Coordinate, LineString};

use super::DemRaster;

/// Contour lines of `raster` at the given elevation.
///
/// Runs marching squares over every 2x2 cell block and fuses the per-cell
/// segments into maximal poly-lines. Every returned line is either a closed
/// loop or has both endpoints on the raster's outer boundary.
pub fn marching_squares(raster: &DemRaster, elevation: f64) -> Vec<LineString<f64>> {
    let (columns, rows) = raster.dimensions();
    let mut fuser = LineFuser::new();

    if columns >= 2 && rows >= 2 {
        for col in 0..columns - 1 {
            for row in 0..rows - 1 {
                for (start, end) in cell_segments(raster, col, row, elevation) {
                    fuser.add_segment(start, end);
                }
            }
        }
    }

    fuser.into_lines()
}

fn interpolate(c0: f64, h0: f64, c1: f64, h1: f64, elevation: f64) -> f64 {
    (c0 * (h1 - elevation) + c1 * (elevation - h0)) / (h1 - h0)
}

/// Segments crossing one 2x2 cell block.
///
/// Corner mask bits: 8 = top-left, 4 = top-right, 2 = bottom-right,
/// 1 = bottom-left; a bit is set iff the corner is strictly above the
/// elevation. The saddle cases are fixed per mask: 5 emits left->top plus
/// bottom->right, 10 emits left->bottom plus top->right; the cell center is
/// never consulted.
fn cell_segments(
    raster: &DemRaster,
    col: usize,
    row: usize,
    elevation: f64,
) -> Vec<(Coordinate<f64>, Coordinate<f64>)> {
    let tl = raster.z(col, row);
    let tr = raster.z(col + 1, row);
    let br = raster.z(col + 1, row + 1);
    let bl = raster.z(col, row + 1);

    let left_x = raster.x(col);
    let right_x = raster.x(col + 1);
    let bottom_y = raster.y(row + 1);
    let top_y = raster.y(row);

    let mut mask = 0_u8;
    if tl > elevation {
        mask |= 8;
    }
    if tr > elevation {
        mask |= 4;
    }
    if br > elevation {
        mask |= 2;
    }
    if bl > elevation {
        mask |= 1;
    }

    let top = || Coordinate {
        x: interpolate(left_x, tl, right_x, tr, elevation),
        y: top_y,
    };
    let left = || Coordinate {
        x: left_x,
        y: interpolate(bottom_y, bl, top_y, tl, elevation),
    };
    let bottom = || Coordinate {
        x: interpolate(left_x, bl, right_x, br, elevation),
        y: bottom_y,
    };
    let right = || Coordinate {
        x: right_x,
        y: interpolate(bottom_y, br, top_y, tr, elevation),
    };

    match mask {
        0 | 15 => vec![],
        1 | 14 => vec![(bottom(), left())],
        2 | 13 => vec![(right(), bottom())],
        3 | 12 => vec![(right(), left())],
        4 | 11 => vec![(top(), right())],
        5 => vec![(left(), top()), (bottom(), right())],
        6 | 9 => vec![(top(), bottom())],
        7 | 8 => vec![(left(), top())],
        10 => vec![(left(), bottom()), (top(), right())],
        _ => unreachable!(),
    }
}

type EndpointKey = (u64, u64);

fn key(c: &Coordinate<f64>) -> EndpointKey {
    // segments sharing a cell edge interpolate to bit-identical coordinates,
    // so exact bit equality is the fusion criterion
    (c.x.to_bits(), c.y.to_bits())
}

/// Incrementally fuses segments into poly-lines by matching open endpoints.
struct LineFuser {
    lines: Vec<Option<VecDeque<Coordinate<f64>>>>,
    open_ends: HashMap<EndpointKey, usize>,
}

impl LineFuser {
    fn new() -> Self {
        LineFuser {
            lines: Vec::new(),
            open_ends: HashMap::new(),
        }
    }

    fn add_segment(&mut self, start: Coordinate<f64>, end: Coordinate<f64>) {
        if key(&start) == key(&end) {
            return;
        }

        let mut line = VecDeque::with_capacity(2);
        line.push_back(start);
        line.push_back(end);
        self.add_line(line);
    }

    fn add_line(&mut self, mut line: VecDeque<Coordinate<f64>>) {
        loop {
            let front = key(line.front().unwrap());
            let back = key(line.back().unwrap());

            if front == back {
                // closed loop, nothing left to fuse
                self.lines.push(Some(line));
                return;
            }

            if let Some(index) = self.open_ends.remove(&front) {
                let other = self.unregister(index, front);
                line = stitch(other, line, front);
                continue;
            }

            if let Some(index) = self.open_ends.remove(&back) {
                let other = self.unregister(index, back);
                line = stitch(other, reversed(line), back);
                continue;
            }

            let index = self.lines.len();
            self.lines.push(Some(line));
            self.open_ends.insert(front, index);
            self.open_ends.insert(back, index);
            return;
        }
    }

    /// Takes a registered line out of the arena and drops its remaining
    /// endpoint registration (`matched` was already removed by the caller).
    fn unregister(&mut self, index: usize, matched: EndpointKey) -> VecDeque<Coordinate<f64>> {
        let line = self.lines[index].take().unwrap();

        let front = key(line.front().unwrap());
        let back = key(line.back().unwrap());
        let other_end = if front == matched { back } else { front };
        self.open_ends.remove(&other_end);

        line
    }

    fn into_lines(self) -> Vec<LineString<f64>> {
        self.lines
            .into_iter()
            .flatten()
            .map(|line| LineString(line.into_iter().collect()))
            .collect()
    }
}

fn reversed(line: VecDeque<Coordinate<f64>>) -> VecDeque<Coordinate<f64>> {
    line.into_iter().rev().collect()
}

/// Joins `other` and `line` at the shared endpoint `at`, which must be an
/// endpoint of `other` and the front of `line`. The shared point is kept once.
fn stitch(
    mut other: VecDeque<Coordinate<f64>>,
    mut line: VecDeque<Coordinate<f64>>,
    at: EndpointKey,
) -> VecDeque<Coordinate<f64>> {
    if key(other.front().unwrap()) == at {
        other = reversed(other);
    }

    line.pop_front();
    other.extend(line);
    other
}

#[cfg(test)]
mod tests {
    use super::marching_squares;
    use crate::dem::{DemRaster, Origin};
    use geo::Coordinate;

    fn raster(columns: usize, rows: usize, data: Vec<f64>) -> DemRaster {
        DemRaster::new(columns, rows, Origin::Corner(0.0, 0.0), 1.0, -9999.0, data)
    }

    fn on_boundary(raster: &DemRaster, c: &Coordinate<f64>) -> bool {
        let (columns, rows) = raster.dimensions();
        c.x == raster.x(0)
            || c.x == raster.x(columns - 1)
            || c.y == raster.y(0)
            || c.y == raster.y(rows - 1)
    }

    #[test]
    fn flat_plane_emits_no_lines() {
        let r = raster(4, 4, vec![10.0; 16]);

        assert!(marching_squares(&r, 10.0).is_empty());
    }

    #[test]
    fn raster_smaller_than_two_by_two_yields_nothing() {
        let r = raster(1, 1, vec![5.0]);

        assert!(marching_squares(&r, 0.0).is_empty());
    }

    #[test]
    fn single_peak_produces_one_closed_loop() {
        let r = raster(
            3,
            3,
            vec![
                1.0, 1.0, 1.0, //
                1.0, 5.0, 1.0, //
                1.0, 1.0, 1.0,
            ],
        );

        let lines = marching_squares(&r, 3.0);

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.0.first(), line.0.last());
        // midpoint between center (elev 5) and edge (elev 1) at threshold 3
        assert!(line.0.iter().any(|c| (c.x - 1.0).abs() < 1e-9));
    }

    #[test]
    fn ridge_produces_open_lines_ending_on_the_boundary() {
        // columns rise from 0 to 2, one crossing of elevation 0.5 per row pair
        let r = raster(
            3,
            3,
            vec![
                0.0, 1.0, 2.0, //
                0.0, 1.0, 2.0, //
                0.0, 1.0, 2.0,
            ],
        );

        let lines = marching_squares(&r, 0.5);

        assert!(!lines.is_empty());
        for line in &lines {
            let closed = line.0.first() == line.0.last();
            let boundary_terminated = on_boundary(&r, line.0.first().unwrap())
                && on_boundary(&r, line.0.last().unwrap());
            assert!(closed || boundary_terminated);
        }
    }

    #[test]
    fn every_line_is_closed_or_boundary_terminated() {
        // a bumpy surface with several crossings of elevation 2
        let r = raster(
            5,
            5,
            vec![
                0.0, 1.0, 0.0, 3.0, 0.0, //
                1.0, 4.0, 1.0, 4.0, 1.0, //
                0.0, 1.0, 0.0, 1.0, 0.0, //
                1.0, 4.0, 1.0, 4.0, 1.0, //
                0.0, 1.0, 0.0, 3.0, 0.0,
            ],
        );

        for elevation in [-1.0, 0.5, 2.0, 3.5] {
            for line in marching_squares(&r, elevation) {
                let closed = line.0.first() == line.0.last();
                let boundary_terminated = on_boundary(&r, line.0.first().unwrap())
                    && on_boundary(&r, line.0.last().unwrap());
                assert!(
                    closed || boundary_terminated,
                    "dangling line at elevation {}",
                    elevation
                );
            }
        }
    }

    #[test]
    fn no_pair_of_lines_can_be_fused_further() {
        let r = raster(
            4,
            4,
            vec![
                0.0, 2.0, 2.0, 0.0, //
                2.0, 2.0, 2.0, 2.0, //
                2.0, 2.0, 2.0, 2.0, //
                0.0, 2.0, 2.0, 0.0,
            ],
        );

        let lines = marching_squares(&r, 1.0);

        for (i, a) in lines.iter().enumerate() {
            if a.0.first() == a.0.last() {
                continue;
            }
            for (j, b) in lines.iter().enumerate() {
                if i == j || b.0.first() == b.0.last() {
                    continue;
                }
                for ea in [a.0.first().unwrap(), a.0.last().unwrap()] {
                    for eb in [b.0.first().unwrap(), b.0.last().unwrap()] {
                        assert_ne!(ea, eb, "lines {} and {} still share an endpoint", i, j);
                    }
                }
            }
        }
    }
}
