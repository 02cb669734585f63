use geo::algorithm::euclidean_distance::EuclideanDistance;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{
    Coordinate, GeoFloat, Geometry, Line, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon, Rect,
};

/// Clipping of a geometry against an axis-aligned rectangle. `None` means
/// nothing of the geometry lies within the rectangle.
pub trait Clip<T: GeoFloat, Rhs = Self> {
    type Output;
    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output>;
}

fn contains<T: GeoFloat>(rect: &Rect<T>, coord: &Coordinate<T>) -> bool {
    coord.x >= rect.min().x
        && coord.x <= rect.max().x
        && coord.y >= rect.min().y
        && coord.y <= rect.max().y
}

impl<T: GeoFloat> Clip<T> for Geometry<T> {
    type Output = Geometry<T>;

    fn clip(&self, rect: &Rect<T>) -> Option<Geometry<T>> {
        match self {
            Geometry::Point(pt) => pt.clip(rect).map(Geometry::Point),
            Geometry::MultiPoint(mp) => mp.clip(rect).map(Geometry::MultiPoint),
            Geometry::Line(l) => l.clip(rect).map(Geometry::Line),
            Geometry::LineString(ls) => ls.clip(rect).map(|mut mls| {
                if mls.0.len() == 1 {
                    Geometry::LineString(mls.0.remove(0))
                } else {
                    Geometry::MultiLineString(mls)
                }
            }),
            Geometry::MultiLineString(mls) => mls.clip(rect).map(Geometry::MultiLineString),
            Geometry::Polygon(pg) => pg.clip(rect).map(Geometry::Polygon),
            Geometry::MultiPolygon(mpg) => mpg.clip(rect).map(Geometry::MultiPolygon),
            _ => None,
        }
    }
}

impl<T: GeoFloat> Clip<T> for Point<T> {
    type Output = Point<T>;

    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output> {
        if contains(rect, &self.0) {
            Some(*self)
        } else {
            None
        }
    }
}

impl<T: GeoFloat> Clip<T> for MultiPoint<T> {
    type Output = MultiPoint<T>;

    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output> {
        let points: Vec<Point<T>> = self.0.iter().filter_map(|p| p.clip(rect)).collect();

        if points.is_empty() {
            None
        } else {
            Some(MultiPoint(points))
        }
    }
}

impl<T: GeoFloat> Clip<T> for Line<T> {
    type Output = Line<T>;

    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output> {
        let start_contained = contains(rect, &self.start);
        let end_contained = contains(rect, &self.end);

        if start_contained && end_contained {
            return Some(*self);
        }

        let box_lines: Vec<Line<T>> = rect.to_polygon().exterior().lines().collect();
        let intersections: Vec<LineIntersection<T>> = box_lines
            .into_iter()
            .filter_map(|box_line| line_intersection(box_line, *self))
            .collect();

        let (collinears, single_points): (Vec<_>, Vec<_>) = intersections
            .into_iter()
            .partition(|i| matches!(i, LineIntersection::Collinear { .. }));

        if let Some(LineIntersection::Collinear { intersection }) = collinears.first() {
            return Some(*intersection);
        }

        let mut crossings: Vec<Coordinate<T>> = single_points
            .into_iter()
            .filter_map(|sp| match sp {
                LineIntersection::SinglePoint { intersection, .. } => Some(intersection),
                _ => None,
            })
            .collect();
        crossings.dedup();

        match crossings.as_slice() {
            [] => None,
            [intersection] => {
                if start_contained {
                    Some(Line::new(self.start, *intersection))
                } else if end_contained {
                    Some(Line::new(*intersection, self.end))
                } else {
                    // grazing touch on the boundary
                    None
                }
            }
            [first, second, ..] => {
                if first.euclidean_distance(&self.start) < second.euclidean_distance(&self.start) {
                    Some(Line::new(*first, *second))
                } else {
                    Some(Line::new(*second, *first))
                }
            }
        }
    }
}

impl<T: GeoFloat> Clip<T> for LineString<T> {
    type Output = MultiLineString<T>;

    /// Clips segment by segment and stitches consecutive surviving segments
    /// back together, so a line leaving and re-entering the rectangle yields
    /// multiple parts.
    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output> {
        let mut parts: Vec<LineString<T>> = Vec::new();
        let mut current: Vec<Coordinate<T>> = Vec::new();

        for segment in self.lines() {
            match segment.clip(rect) {
                Some(clipped) => {
                    if current.last() == Some(&clipped.start) {
                        current.push(clipped.end);
                    } else {
                        if current.len() > 1 {
                            parts.push(LineString(std::mem::take(&mut current)));
                        }
                        current = vec![clipped.start, clipped.end];
                    }
                }
                None => {
                    if current.len() > 1 {
                        parts.push(LineString(std::mem::take(&mut current)));
                    }
                    current.clear();
                }
            }
        }

        if current.len() > 1 {
            parts.push(LineString(current));
        }

        if parts.is_empty() {
            None
        } else {
            Some(MultiLineString(parts))
        }
    }
}

impl<T: GeoFloat> Clip<T> for MultiLineString<T> {
    type Output = MultiLineString<T>;

    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output> {
        let parts: Vec<LineString<T>> = self
            .0
            .iter()
            .filter_map(|ls| ls.clip(rect))
            .flat_map(|mls| mls.0)
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(MultiLineString(parts))
        }
    }
}

impl<T: GeoFloat> Clip<T> for Polygon<T> {
    type Output = Polygon<T>;

    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output> {
        let exterior = clip_ring(self.exterior(), rect)?;

        let interiors: Vec<LineString<T>> = self
            .interiors()
            .iter()
            .filter_map(|ring| clip_ring(ring, rect))
            .collect();

        Some(Polygon::new(exterior, interiors))
    }
}

impl<T: GeoFloat> Clip<T> for MultiPolygon<T> {
    type Output = MultiPolygon<T>;

    fn clip(&self, rect: &Rect<T>) -> Option<Self::Output> {
        let polygons: Vec<Polygon<T>> = self.0.iter().filter_map(|pg| pg.clip(rect)).collect();

        if polygons.is_empty() {
            None
        } else {
            Some(MultiPolygon(polygons))
        }
    }
}

/// Sutherland-Hodgman clipping of one ring against the four rectangle edges.
/// Winding order is preserved. Returns `None` when the ring collapses.
fn clip_ring<T: GeoFloat>(ring: &LineString<T>, rect: &Rect<T>) -> Option<LineString<T>> {
    let mut vertices: Vec<Coordinate<T>> = ring.0.clone();

    // operate on an open vertex list
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    let min = rect.min();
    let max = rect.max();

    vertices = clip_against(&vertices, |c| c.x >= min.x, |a, b| at_x(a, b, min.x));
    vertices = clip_against(&vertices, |c| c.x <= max.x, |a, b| at_x(a, b, max.x));
    vertices = clip_against(&vertices, |c| c.y >= min.y, |a, b| at_y(a, b, min.y));
    vertices = clip_against(&vertices, |c| c.y <= max.y, |a, b| at_y(a, b, max.y));

    if vertices.len() < 3 {
        return None;
    }

    let first = vertices[0];
    vertices.push(first);

    Some(LineString(vertices))
}

fn clip_against<T: GeoFloat>(
    vertices: &[Coordinate<T>],
    inside: impl Fn(&Coordinate<T>) -> bool,
    intersect: impl Fn(&Coordinate<T>, &Coordinate<T>) -> Coordinate<T>,
) -> Vec<Coordinate<T>> {
    let mut result = Vec::with_capacity(vertices.len() + 4);

    for i in 0..vertices.len() {
        let current = vertices[i];
        let previous = vertices[(i + vertices.len() - 1) % vertices.len()];

        match (inside(&previous), inside(&current)) {
            (true, true) => result.push(current),
            (true, false) => result.push(intersect(&previous, &current)),
            (false, true) => {
                result.push(intersect(&previous, &current));
                result.push(current);
            }
            (false, false) => {}
        }
    }

    result
}

fn at_x<T: GeoFloat>(a: &Coordinate<T>, b: &Coordinate<T>, x: T) -> Coordinate<T> {
    let t = (x - a.x) / (b.x - a.x);
    Coordinate {
        x,
        y: a.y + (b.y - a.y) * t,
    }
}

fn at_y<T: GeoFloat>(a: &Coordinate<T>, b: &Coordinate<T>, y: T) -> Coordinate<T> {
    let t = (y - a.y) / (b.y - a.y);
    Coordinate {
        x: a.x + (b.x - a.x) * t,
        y,
    }
}
