use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use geo::Geometry;

use ::mvt::{Feature as MvtFeature, GeomData, GeomEncoder, GeomType, Tile};
use pointy::Transform;

use crate::coords::TILE_EXTENT;
use crate::feature::{FeatureCollection, PropertyValue};

/// Encodes one tile's layers into a gzipped vector-tile payload.
///
/// Geometries must already be in tile-local coordinates. Layers are written
/// even when empty, so a tile always advertises the full layer set of its
/// LOD.
pub fn encode_tile(layers: &[(String, FeatureCollection)]) -> anyhow::Result<Vec<u8>> {
    let mut tile = Tile::new(TILE_EXTENT as u32);

    for (name, collection) in layers {
        let mut layer = tile.create_layer(name);

        for feature in collection.iter() {
            let geom_data = match encode_geometry(&feature.geometry)? {
                Some(data) => data,
                None => continue,
            };

            let mut mvt_feature = layer.into_feature(geom_data);
            add_tags(&mut mvt_feature, &feature.properties);
            layer = mvt_feature.into_layer();
        }

        tile.add_layer(layer)?;
    }

    let bytes = tile.to_bytes()?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes)?;
    Ok(encoder.finish()?)
}

fn add_tags(feature: &mut MvtFeature, properties: &crate::feature::Properties) {
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();

    for key in keys {
        match &properties[key] {
            PropertyValue::Null => {}
            PropertyValue::Bool(b) => feature.add_tag_bool(key, *b),
            PropertyValue::Number(n) => feature.add_tag_double(key, *n),
            PropertyValue::String(s) => feature.add_tag_string(key, s),
            // the tile format has no list values; lists travel as JSON text
            value @ PropertyValue::Array(_) => {
                feature.add_tag_string(key, &property_to_json(value).to_string())
            }
        }
    }
}

fn property_to_json(value: &PropertyValue) -> serde_json::Value {
    match value {
        PropertyValue::Null => serde_json::Value::Null,
        PropertyValue::Bool(b) => serde_json::Value::Bool(*b),
        PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        PropertyValue::String(s) => serde_json::Value::String(s.clone()),
        PropertyValue::Array(values) => {
            serde_json::Value::Array(values.iter().map(property_to_json).collect())
        }
    }
}

fn encode_geometry(geometry: &Geometry<f64>) -> anyhow::Result<Option<GeomData>> {
    let data = match geometry {
        Geometry::Point(p) => GeomEncoder::new(GeomType::Point, Transform::default())
            .point(p.x(), p.y())?
            .encode()?,
        Geometry::MultiPoint(mp) => {
            let mut encoder = GeomEncoder::new(GeomType::Point, Transform::default());
            for point in &mp.0 {
                encoder = encoder.point(point.x(), point.y())?;
            }
            encoder.encode()?
        }
        Geometry::Line(l) => GeomEncoder::new(GeomType::Linestring, Transform::default())
            .point(l.start.x, l.start.y)?
            .point(l.end.x, l.end.y)?
            .encode()?,
        Geometry::LineString(ls) => {
            let mut encoder = GeomEncoder::new(GeomType::Linestring, Transform::default());
            for c in &ls.0 {
                encoder = encoder.point(c.x, c.y)?;
            }
            encoder.encode()?
        }
        Geometry::MultiLineString(mls) => {
            let mut encoder = GeomEncoder::new(GeomType::Linestring, Transform::default());
            for ls in &mls.0 {
                for c in &ls.0 {
                    encoder = encoder.point(c.x, c.y)?;
                }
                encoder = encoder.complete()?;
            }
            encoder.encode()?
        }
        Geometry::Polygon(pg) => {
            let mut encoder = GeomEncoder::new(GeomType::Polygon, Transform::default());
            encoder = encode_ring(encoder, pg.exterior())?;
            for ring in pg.interiors() {
                encoder = encode_ring(encoder, ring)?;
            }
            encoder.encode()?
        }
        Geometry::MultiPolygon(mpg) => {
            let mut encoder = GeomEncoder::new(GeomType::Polygon, Transform::default());
            for pg in &mpg.0 {
                encoder = encode_ring(encoder, pg.exterior())?;
                for ring in pg.interiors() {
                    encoder = encode_ring(encoder, ring)?;
                }
            }
            encoder.encode()?
        }
        _ => return Ok(None),
    };

    Ok(Some(data))
}

/// Rings are stored closed; the tile format closes them itself, so the
/// trailing duplicate point is dropped before encoding.
fn encode_ring(
    mut encoder: GeomEncoder<f64>,
    ring: &geo::LineString<f64>,
) -> anyhow::Result<GeomEncoder<f64>> {
    let mut coordinates = ring.0.as_slice();

    if coordinates.len() > 1 && coordinates.first() == coordinates.last() {
        coordinates = &coordinates[..coordinates.len() - 1];
    }

    for c in coordinates {
        encoder = encoder.point(c.x, c.y)?;
    }

    Ok(encoder.complete()?)
}

#[cfg(test)]
mod tests {
    use super::encode_tile;
    use crate::feature::{Feature, FeatureCollection, PropertyValue};
    use geo::{Coordinate, Geometry, LineString, Point, Polygon};
    use std::collections::HashMap;

    fn gunzip(bytes: &[u8]) -> Vec<u8> {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn empty_layer_list_yields_an_empty_tile() {
        let payload = encode_tile(&[]).unwrap();

        assert_eq!(gunzip(&payload).len(), 0);
    }

    #[test]
    fn empty_layers_are_still_written() {
        let payload =
            encode_tile(&[("foo".to_string(), FeatureCollection::new())]).unwrap();

        let raw = gunzip(&payload);
        assert!(!raw.is_empty());
        // layer name appears in the protobuf
        assert!(raw.windows(3).any(|w| w == b"foo"));
    }

    #[test]
    fn features_and_tags_survive_encoding() {
        let mut properties = HashMap::new();
        properties.insert(
            "text".to_string(),
            PropertyValue::String("1234".to_string()),
        );
        properties.insert("elevation".to_string(), PropertyValue::Number(1234.0));

        let collection = FeatureCollection(vec![Feature {
            geometry: Geometry::Point(Point(Coordinate { x: 12.0, y: 34.0 })),
            properties,
        }]);

        let payload = encode_tile(&[("mount".to_string(), collection)]).unwrap();
        let raw = gunzip(&payload);

        assert!(raw.windows(5).any(|w| w == b"mount"));
        assert!(raw.windows(4).any(|w| w == b"text"));
        assert!(raw.windows(4).any(|w| w == b"1234"));
    }

    #[test]
    fn list_properties_become_json_strings() {
        let mut properties = HashMap::new();
        properties.insert(
            "position".to_string(),
            PropertyValue::Array(vec![
                PropertyValue::Number(1.0),
                PropertyValue::Number(2.0),
            ]),
        );

        let collection = FeatureCollection(vec![Feature {
            geometry: Geometry::Point(Point(Coordinate { x: 0.0, y: 0.0 })),
            properties,
        }]);

        let payload = encode_tile(&[("house".to_string(), collection)]).unwrap();
        let raw = gunzip(&payload);

        assert!(raw.windows(9).any(|w| w == b"[1.0,2.0]"));
    }

    #[test]
    fn polygons_encode_without_the_closing_vertex() {
        let polygon = Polygon::new(
            LineString(vec![
                Coordinate { x: 0.0, y: 0.0 },
                Coordinate { x: 0.0, y: 10.0 },
                Coordinate { x: 10.0, y: 10.0 },
                Coordinate { x: 10.0, y: 0.0 },
                Coordinate { x: 0.0, y: 0.0 },
            ]),
            vec![],
        );

        let collection = FeatureCollection(vec![Feature {
            geometry: Geometry::Polygon(polygon),
            properties: HashMap::new(),
        }]);

        let payload = encode_tile(&[("water".to_string(), collection)]).unwrap();

        assert!(!gunzip(&payload).is_empty());
    }
}
