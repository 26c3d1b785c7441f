//! Coordinate reference systems and geospatial derivation.

mod crs;
mod derive;
mod geometry;
mod transform;

pub use crs::{
    ConstantGeoid, Crs, CrsId, CrsPair, CrsRegistry, EGM2008_HEIGHT, EpsgRegistry, GeoidModel,
    WGS84,
};
pub use derive::{derive_geometry, project_crs};
pub use geometry::Geometry;
pub use transform::{Geodetic, GeodeticTransform};
