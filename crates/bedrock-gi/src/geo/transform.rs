//! Projected to geodetic coordinate transformation.

use std::sync::Arc;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};

use super::crs::{Crs, GeoidModel};
use crate::error::{GiError, Result};

const WGS84_GEODETIC: &str = "+proj=longlat +datum=WGS84";

/// A WGS 84 geodetic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// Degrees east.
    pub longitude: f64,
    /// Degrees north.
    pub latitude: f64,
    /// Metres above the WGS 84 ellipsoid, when a height and geoid were known.
    pub ellipsoidal_height: Option<f64>,
}

/// Transforms between one source CRS and WGS 84.
///
/// Horizontal coordinates go through `proj4rs`. Heights are converted with
/// `h = H + N`, where `N` comes from the geoid model of the vertical CRS;
/// without one, ellipsoidal heights are not available.
pub struct GeodeticTransform {
    source: Proj,
    wgs84: Proj,
    source_is_geographic: bool,
    geoid: Option<Arc<dyn GeoidModel>>,
}

impl GeodeticTransform {
    /// Build a transform from `horizontal` to WGS 84.
    pub fn new(horizontal: &Crs, geoid: Option<Arc<dyn GeoidModel>>) -> Result<Self> {
        if horizontal.is_vertical() || horizontal.proj4.trim().is_empty() {
            return Err(GiError::Projection(format!(
                "{} has no horizontal PROJ definition",
                horizontal.id
            )));
        }
        let source = Proj::from_proj_string(&horizontal.proj_string()).map_err(|e| {
            GiError::Projection(format!("cannot build {}: {}", horizontal.id, e))
        })?;
        let wgs84 = Proj::from_proj_string(WGS84_GEODETIC)
            .map_err(|e| GiError::Projection(format!("cannot build WGS 84: {}", e)))?;

        Ok(Self {
            source,
            wgs84,
            source_is_geographic: horizontal.is_geographic(),
            geoid,
        })
    }

    /// Returns true if ellipsoidal heights can be computed.
    pub fn has_geoid(&self) -> bool {
        self.geoid.is_some()
    }

    /// Transform a source coordinate and optional gravity-related height.
    pub fn to_geodetic(&self, easting: f64, northing: f64, height: Option<f64>) -> Result<Geodetic> {
        if !easting.is_finite() || !northing.is_finite() {
            return Err(GiError::Projection(format!(
                "({}, {}): coordinates are not finite",
                easting, northing
            )));
        }
        let mut point = if self.source_is_geographic {
            (easting.to_radians(), northing.to_radians(), 0.0)
        } else {
            (easting, northing, 0.0)
        };
        transform(&self.source, &self.wgs84, &mut point)
            .map_err(|e| GiError::Projection(format!("({}, {}): {}", easting, northing, e)))?;

        let longitude = point.0.to_degrees();
        let latitude = point.1.to_degrees();
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(GiError::Projection(format!(
                "({}, {}): no finite WGS 84 position",
                easting, northing
            )));
        }
        let ellipsoidal_height = match (height, &self.geoid) {
            (Some(h), Some(geoid)) => geoid.undulation(longitude, latitude).map(|n| h + n),
            _ => None,
        };

        Ok(Geodetic {
            longitude,
            latitude,
            ellipsoidal_height,
        })
    }

    /// Transform a WGS 84 position back to the source CRS.
    ///
    /// Returns easting, northing and the gravity-related height when the
    /// ellipsoidal height and geoid are known.
    pub fn from_geodetic(&self, geodetic: &Geodetic) -> Result<(f64, f64, Option<f64>)> {
        let mut point = (
            geodetic.longitude.to_radians(),
            geodetic.latitude.to_radians(),
            0.0,
        );
        transform(&self.wgs84, &self.source, &mut point).map_err(|e| {
            GiError::Projection(format!(
                "({}, {}): {}",
                geodetic.longitude, geodetic.latitude, e
            ))
        })?;

        let (x, y) = if self.source_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        let height = match (geodetic.ellipsoidal_height, &self.geoid) {
            (Some(h), Some(geoid)) => geoid
                .undulation(geodetic.longitude, geodetic.latitude)
                .map(|n| h - n),
            _ => None,
        };
        Ok((x, y, height))
    }
}
