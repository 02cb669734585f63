mod build_vector_tiles;
mod clip_feature;
mod collections;
mod contours;
mod encode;
mod layer_settings;
mod load_geo_jsons;
mod lod_projection;
mod mounts;
mod water;

pub use build_vector_tiles::build_vector_tiles;
pub use collections::Collections;
pub use contours::build_contours;
pub use layer_settings::{load_layer_settings, LayerSetting};
pub use load_geo_jsons::load_geo_jsons;
pub use mounts::build_mounts;
