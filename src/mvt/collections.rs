use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use geo::map_coords::MapCoordsInplace;

use crate::feature::FeatureCollection;

/// The layer registry: layer name to feature collection. Producers fill it,
/// the tile assembler owns and mutates it afterwards.
#[derive(Default)]
pub struct Collections(pub HashMap<String, FeatureCollection>);

impl Collections {
    pub fn new() -> Self {
        Collections(HashMap::new())
    }

    /// Layer names in sorted order, the internal `contours` layer excluded.
    pub fn public_layer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .0
            .keys()
            .filter(|name| name.as_str() != "contours")
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl MapCoordsInplace<f64> for Collections {
    fn map_coords_inplace(&mut self, func: impl Fn(&(f64, f64)) -> (f64, f64) + Copy) {
        for layer in self.0.values_mut() {
            layer.map_coords_inplace(func);
        }
    }
}

impl Deref for Collections {
    type Target = HashMap<String, FeatureCollection>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Collections {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Collections;
    use crate::feature::FeatureCollection;

    #[test]
    fn public_layer_names_are_sorted_and_skip_contours() {
        let mut collections = Collections::new();
        for name in ["water", "contours", "house", "contours/01"] {
            collections.insert(name.to_string(), FeatureCollection::new());
        }

        assert_eq!(
            collections.public_layer_names(),
            vec!["contours/01", "house", "water"]
        );
    }
}
