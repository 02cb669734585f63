use std::collections::HashMap;

use geo::{Coordinate, Geometry, LineString, Polygon};

use crate::dem::DemRaster;
use crate::feature::{make_clockwise, Feature, FeatureCollection};

const TOP_EDGE: u8 = 0b0001;
const LEFT_EDGE: u8 = 0b0010;
const BOTTOM_EDGE: u8 = 0b0100;
const RIGHT_EDGE: u8 = 0b1000;

/// Promotes the 0-elevation contour lines into the `water` polygon layer.
///
/// Every line becomes a closed clockwise ring; the rings' nesting determines
/// which are polygon outlines and which are holes, and a probe into the
/// raster decides whether the landmass is an island that needs a synthetic
/// whole-map ring around everything.
pub fn build_water(
    lines: &[LineString<f64>],
    world_size: f64,
    raster: &DemRaster,
) -> FeatureCollection {
    let rings: Vec<LineString<f64>> = lines
        .iter()
        .map(|line| close_ring(line, world_size, raster.cell_size()))
        .collect();

    let mut arena = RingArena::new(rings);

    let (probe_elevation, probe) = probe_cell(raster);
    let containing = arena.count_rings_containing(probe);
    let is_island = (probe_elevation > 0.0) != (containing % 2 == 0);

    if is_island {
        arena.push_whole_map_ring(world_size);
    }

    arena.orient_holes();
    arena.into_polygons()
}

/// Turns a contour line into a closed ring. Open lines terminate on world
/// edges; when start and end sit on different edges the corner between them
/// is inserted before closing. The top and right edges sit one cell size
/// inside the world bound, matching the exporting engine; the corner points
/// use the full world size.
fn close_ring(line: &LineString<f64>, world_size: f64, cell_size: f64) -> LineString<f64> {
    let mut ring = line.clone();

    if ring.0.first() != ring.0.last() {
        let start = *ring.0.first().unwrap();
        let end = *ring.0.last().unwrap();

        let edges_of = |point: &Coordinate<f64>| -> u8 {
            let mut edges = 0;
            if point.y == world_size - cell_size {
                edges |= TOP_EDGE;
            }
            if point.x == world_size - cell_size {
                edges |= RIGHT_EDGE;
            }
            if point.y == 0.0 {
                edges |= BOTTOM_EDGE;
            }
            if point.x == 0.0 {
                edges |= LEFT_EDGE;
            }
            edges
        };

        let start_edges = edges_of(&start);
        let end_edges = edges_of(&end);

        if start_edges & end_edges == 0 {
            let on = |edges: u8, edge: u8| edges & edge > 0;
            let between = |a: u8, b: u8| {
                (on(start_edges, a) && on(end_edges, b)) || (on(start_edges, b) && on(end_edges, a))
            };

            if between(TOP_EDGE, RIGHT_EDGE) {
                ring.0.push(Coordinate {
                    x: world_size,
                    y: world_size,
                });
            }
            if between(BOTTOM_EDGE, RIGHT_EDGE) {
                ring.0.push(Coordinate {
                    x: world_size,
                    y: 0.0,
                });
            }
            if between(BOTTOM_EDGE, LEFT_EDGE) {
                ring.0.push(Coordinate { x: 0.0, y: 0.0 });
            }
            if between(TOP_EDGE, LEFT_EDGE) {
                ring.0.push(Coordinate {
                    x: 0.0,
                    y: world_size,
                });
            }
        }

        ring.0.push(start);
    }

    make_clockwise(&mut ring);
    ring
}

/// First cell (scanning row by row from the top-left) whose elevation
/// magnitude exceeds 0.1, as elevation and world coordinate. Falls back to
/// the last cell on an all-flat raster.
fn probe_cell(raster: &DemRaster) -> (f64, Coordinate<f64>) {
    let (columns, rows) = raster.dimensions();
    let mut col = 0;
    let mut row = 0;
    let mut elevation = raster.z(col, row);

    while elevation < 0.1 && elevation > -0.1 {
        col += 1;

        if col >= columns {
            col = 0;
            row += 1;
        }

        if row >= rows {
            col = columns - 1;
            row = rows - 1;
            break;
        }

        elevation = raster.z(col, row);
    }

    (
        raster.z(col, row),
        Coordinate {
            x: raster.x(col),
            y: raster.y(row),
        },
    )
}

/// Rings plus their nesting relation, all by index. Consumed rings turn into
/// `None`, which makes the "remove from pool" step of polygon assembly a
/// plain `take`.
struct RingArena {
    rings: Vec<Option<LineString<f64>>>,
    children: Vec<Vec<usize>>,
    parent_counts: Vec<usize>,
}

impl RingArena {
    fn new(rings: Vec<LineString<f64>>) -> Self {
        let count = rings.len();
        let mut children = vec![Vec::new(); count];
        let mut parent_counts = vec![0_usize; count];

        for parent in 0..count {
            for child in 0..count {
                if parent == child {
                    continue;
                }

                if ring_contains_ring(&rings[parent], &rings[child]) {
                    children[parent].push(child);
                    parent_counts[child] += 1;
                }
            }
        }

        RingArena {
            rings: rings.into_iter().map(Some).collect(),
            children,
            parent_counts,
        }
    }

    fn count_rings_containing(&self, point: Coordinate<f64>) -> usize {
        self.rings
            .iter()
            .flatten()
            .filter(|ring| ring_contains(ring, point))
            .count()
    }

    /// Appends a ring around the whole map as the outermost parent of every
    /// existing ring.
    fn push_whole_map_ring(&mut self, world_size: f64) {
        let ring = LineString(vec![
            Coordinate { x: 0.0, y: 0.0 },
            Coordinate {
                x: 0.0,
                y: world_size,
            },
            Coordinate {
                x: world_size,
                y: world_size,
            },
            Coordinate {
                x: world_size,
                y: 0.0,
            },
            Coordinate { x: 0.0, y: 0.0 },
        ]);

        let existing: Vec<usize> = (0..self.rings.len()).collect();
        for &id in &existing {
            self.parent_counts[id] += 1;
        }

        self.rings.push(Some(ring));
        self.children.push(existing);
        self.parent_counts.push(0);
    }

    /// Rings at odd nesting depth become holes and are reversed to
    /// counter-clockwise.
    fn orient_holes(&mut self) {
        for (id, ring) in self.rings.iter_mut().enumerate() {
            if self.parent_counts[id] % 2 == 1 {
                if let Some(ring) = ring {
                    ring.0.reverse();
                }
            }
        }
    }

    /// Assembles polygons level by level, deepest outer rings first, so holes
    /// are always claimed by their innermost enclosing outer ring.
    fn into_polygons(mut self) -> FeatureCollection {
        let mut collection = FeatureCollection::new();

        let max_parents = self.parent_counts.iter().copied().max().unwrap_or(0);
        let mut level = max_parents - max_parents % 2;

        loop {
            for id in 0..self.rings.len() {
                if self.parent_counts[id] != level {
                    continue;
                }

                let outer = match self.rings[id].take() {
                    Some(ring) => ring,
                    None => continue,
                };

                let holes: Vec<LineString<f64>> = self.children[id]
                    .iter()
                    .filter_map(|&child| self.rings[child].take())
                    .collect();

                collection.push(Feature {
                    geometry: Geometry::Polygon(Polygon::new(outer, holes)),
                    properties: HashMap::new(),
                });
            }

            if level < 2 {
                break;
            }
            level -= 2;
        }

        collection
    }
}

fn ring_contains_ring(parent: &LineString<f64>, child: &LineString<f64>) -> bool {
    child.0.iter().all(|point| ring_contains(parent, *point))
}

/// Planar point-in-ring test; points on the boundary count as contained.
fn ring_contains(ring: &LineString<f64>, point: Coordinate<f64>) -> bool {
    if ring.0.len() < 2 {
        return false;
    }

    let mut inside = false;

    for segment in ring.0.windows(2) {
        match ray_intersect(point, segment[0], segment[1]) {
            RayHit::OnSegment => return true,
            RayHit::Crosses => inside = !inside,
            RayHit::Misses => {}
        }
    }

    inside
}

enum RayHit {
    Crosses,
    Misses,
    OnSegment,
}

fn nudge_right(x: f64) -> f64 {
    if x == 0.0 {
        f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        f64::from_bits(x.to_bits() - 1)
    }
}

/// Casts a ray from `p` towards positive X against the segment `s`-`e`.
fn ray_intersect(mut p: Coordinate<f64>, mut s: Coordinate<f64>, mut e: Coordinate<f64>) -> RayHit {
    if s.x > e.x {
        std::mem::swap(&mut s, &mut e);
    }

    if p.x == s.x {
        if p.y == s.y {
            return RayHit::OnSegment;
        }
        if s.x == e.x {
            let (min_y, max_y) = if s.y < e.y { (s.y, e.y) } else { (e.y, s.y) };
            if min_y <= p.y && p.y <= max_y {
                return RayHit::OnSegment;
            }
        }

        // degenerate vertical alignment, move the ray off the endpoint
        p.x = nudge_right(p.x);
    } else if p.x == e.x {
        if p.y == e.y {
            return RayHit::OnSegment;
        }

        p.x = nudge_right(p.x);
    }

    if p.x < s.x || p.x > e.x {
        return RayHit::Misses;
    }

    if s.y > e.y {
        if p.y > s.y {
            return RayHit::Misses;
        }
        if p.y < e.y {
            return RayHit::Crosses;
        }
    } else {
        if p.y > e.y {
            return RayHit::Misses;
        }
        if p.y < s.y {
            return RayHit::Crosses;
        }
    }

    let ray_slope = (p.y - s.y) / (p.x - s.x);
    let segment_slope = (e.y - s.y) / (e.x - s.x);

    if ray_slope == segment_slope {
        return RayHit::OnSegment;
    }

    if ray_slope <= segment_slope {
        RayHit::Crosses
    } else {
        RayHit::Misses
    }
}
