use geo::bounding_rect::BoundingRect;
use geo::euclidean_length::EuclideanLength;
use geo::simplify::Simplify;
use geo::{Geometry, GeometryCollection, Rect};

use super::FeatureCollection;

pub trait Simplifiable {
    /// Douglas-Peucker simplification with tolerance `epsilon`.
    fn simplify(&mut self, epsilon: f64);

    /// Removes features that became negligible after simplification: lines
    /// shorter than `line_limit` and polygons whose bounding box has no
    /// dimension of at least `extent_limit`. Points always survive.
    fn remove_empty(&mut self, line_limit: f64, extent_limit: f64);
}

fn simplify_geo_collection(collection: &GeometryCollection<f64>, epsilon: f64) -> GeometryCollection<f64> {
    collection
        .iter()
        .filter_map(|geo| simplify_geo(geo, epsilon))
        .collect()
}

fn simplify_geo(geometry: &Geometry<f64>, epsilon: f64) -> Option<Geometry<f64>> {
    match geometry {
        Geometry::LineString(g) => Some(Geometry::LineString(g.simplify(&epsilon))),
        Geometry::Polygon(g) => Some(Geometry::Polygon(g.simplify(&epsilon))),
        Geometry::MultiLineString(g) => Some(Geometry::MultiLineString(g.simplify(&epsilon))),
        Geometry::MultiPolygon(g) => Some(Geometry::MultiPolygon(g.simplify(&epsilon))),
        Geometry::GeometryCollection(g) => Some(Geometry::GeometryCollection(
            simplify_geo_collection(g, epsilon),
        )),
        _ => None,
    }
}

fn max_dimension(rect: Option<Rect<f64>>) -> f64 {
    match rect {
        Some(rect) => (rect.max().x - rect.min().x).max(rect.max().y - rect.min().y),
        None => 0.0,
    }
}

impl Simplifiable for FeatureCollection {
    fn simplify(&mut self, epsilon: f64) {
        self.0.iter_mut().for_each(|f| {
            if let Some(geo) = simplify_geo(&f.geometry, epsilon) {
                f.geometry = geo;
            }
        });
    }

    fn remove_empty(&mut self, line_limit: f64, extent_limit: f64) {
        self.0.retain(|f| match &f.geometry {
            Geometry::Line(l) => l.euclidean_length() >= line_limit,
            Geometry::LineString(ls) => ls.euclidean_length() >= line_limit,
            Geometry::MultiLineString(mls) => mls.euclidean_length() >= line_limit,
            Geometry::Polygon(pg) => max_dimension(pg.bounding_rect()) >= extent_limit,
            Geometry::MultiPolygon(mpg) => max_dimension(mpg.bounding_rect()) >= extent_limit,
            _ => true,
        });
    }
}
