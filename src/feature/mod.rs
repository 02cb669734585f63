mod simplifiable;
mod winding;

use std::collections::HashMap;

use geo::map_coords::MapCoordsInplace;
use geo::Geometry;

pub use simplifiable::Simplifiable;
pub use winding::{is_clockwise, make_clockwise, shoelace_sum};

/// A property bag value. Lists keep their element values; objects are not
/// supported by the tile format and are rejected at ingest.
#[derive(Clone, Debug)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    String(String),
    Number(f64),
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for PropertyValue {
    fn from(val: &serde_json::Value) -> Self {
        match val {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => Self::Bool(*v),
            serde_json::Value::String(v) => Self::String(v.clone()),
            serde_json::Value::Number(v) => Self::Number(v.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::Array(v) => Self::Array(v.iter().map(PropertyValue::from).collect()),
            serde_json::Value::Object(_) => Self::Null,
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(val: serde_json::Value) -> Self {
        PropertyValue::from(&val)
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for PropertyValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub type Properties = HashMap<String, PropertyValue>;

#[derive(Clone, Debug)]
pub struct Feature {
    pub geometry: Geometry<f64>,
    pub properties: Properties,
}

impl MapCoordsInplace<f64> for Feature {
    fn map_coords_inplace(&mut self, func: impl Fn(&(f64, f64)) -> (f64, f64) + Copy) {
        self.geometry.map_coords_inplace(func);
    }
}

#[derive(Clone, Debug, Default)]
pub struct FeatureCollection(pub Vec<Feature>);

impl FeatureCollection {
    pub fn new() -> Self {
        FeatureCollection(Vec::new())
    }
}

impl std::ops::Deref for FeatureCollection {
    type Target = Vec<Feature>;
    fn deref(&self) -> &Vec<Feature> {
        &self.0
    }
}

impl std::ops::DerefMut for FeatureCollection {
    fn deref_mut(&mut self) -> &mut Vec<Feature> {
        &mut self.0
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        FeatureCollection(iter.into_iter().collect())
    }
}

impl MapCoordsInplace<f64> for FeatureCollection {
    fn map_coords_inplace(&mut self, func: impl Fn(&(f64, f64)) -> (f64, f64) + Copy) {
        for feature in self.iter_mut() {
            feature.map_coords_inplace(func);
        }
    }
}
