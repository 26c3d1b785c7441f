//! Coordinate reference system identifiers, definitions and lookup.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GiError, Result};

// `EPSG:27700`, `epsg:27700` or a bare `27700`.
static CRS_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:epsg\s*:\s*)?(\d{1,7})$").unwrap());

/// EPSG code of the WGS 84 geographic CRS.
pub const WGS84: CrsId = CrsId(4326);
/// EPSG code of EGM2008 height, the default vertical CRS.
pub const EGM2008_HEIGHT: CrsId = CrsId(3855);

/// An EPSG coordinate reference system code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CrsId(pub u32);

impl CrsId {
    pub fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for CrsId {
    type Err = GiError;

    fn from_str(s: &str) -> Result<Self> {
        CRS_ID_PATTERN
            .captures(s.trim())
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .map(CrsId)
            .ok_or_else(|| GiError::InvalidCrsId(s.to_string()))
    }
}

impl TryFrom<String> for CrsId {
    type Error = GiError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CrsId> for String {
    fn from(id: CrsId) -> Self {
        id.to_string()
    }
}

/// A resolved CRS definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    pub id: CrsId,
    /// PROJ.4 definition, empty for vertical CRSs.
    pub proj4: String,
    /// Well-known text.
    pub wkt: String,
}

impl Crs {
    /// Create a CRS definition.
    pub fn new(id: CrsId, proj4: impl Into<String>, wkt: impl Into<String>) -> Self {
        Self {
            id,
            proj4: proj4.into(),
            wkt: wkt.into(),
        }
    }

    /// Returns true if coordinates are longitude/latitude in degrees.
    pub fn is_geographic(&self) -> bool {
        self.proj4
            .split_whitespace()
            .any(|token| token == "+proj=longlat" || token == "+proj=latlong")
    }

    /// Returns true if this is a vertical (height) CRS.
    pub fn is_vertical(&self) -> bool {
        let wkt = self.wkt.trim_start();
        wkt.starts_with("VERT_CS") || wkt.starts_with("VERTCRS")
    }

    /// The PROJ.4 definition without tokens that `proj4rs` does not accept.
    pub fn proj_string(&self) -> String {
        self.proj4
            .split_whitespace()
            .filter(|token| *token != "+type=crs" && *token != "+no_defs")
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Geoid undulation model: ellipsoidal height minus gravity-related height.
pub trait GeoidModel: Send + Sync + fmt::Debug {
    /// Undulation in metres at a WGS 84 longitude/latitude in degrees, if
    /// the model covers that position.
    fn undulation(&self, longitude: f64, latitude: f64) -> Option<f64>;
}

/// A geoid with the same undulation everywhere.
///
/// Useful for small sites where a single offset is known from a survey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantGeoid(pub f64);

impl GeoidModel for ConstantGeoid {
    fn undulation(&self, _longitude: f64, _latitude: f64) -> Option<f64> {
        Some(self.0)
    }
}

/// Resolves CRS identifiers to definitions.
pub trait CrsRegistry: Send + Sync {
    /// Look up a CRS definition.
    fn resolve(&self, id: &CrsId) -> Result<Crs>;

    /// The geoid model relating a vertical CRS to the WGS 84 ellipsoid.
    fn geoid(&self, vertical: &CrsId) -> Option<Arc<dyn GeoidModel>>;
}

/// Vertical CRSs commonly used for ground level elevations.
const VERTICAL_CRS: &[(u32, &str)] = &[
    (
        3855,
        r#"VERT_CS["EGM2008 height",VERT_DATUM["EGM2008 geoid",2005],UNIT["metre",1],AXIS["Gravity-related height",UP],AUTHORITY["EPSG","3855"]]"#,
    ),
    (
        5701,
        r#"VERT_CS["ODN height",VERT_DATUM["Ordnance Datum Newlyn",2005],UNIT["metre",1],AXIS["Gravity-related height",UP],AUTHORITY["EPSG","5701"]]"#,
    ),
    (
        5703,
        r#"VERT_CS["NAVD88 height",VERT_DATUM["North American Vertical Datum 1988",2005],UNIT["metre",1],AXIS["Gravity-related height",UP],AUTHORITY["EPSG","5703"]]"#,
    ),
    (
        5738,
        r#"VERT_CS["HKPD height",VERT_DATUM["Hong Kong Principal Datum",2005],UNIT["metre",1],AXIS["Gravity-related height",UP],AUTHORITY["EPSG","5738"]]"#,
    ),
];

/// Registry backed by the EPSG dataset.
///
/// Lookup order: definitions registered by the caller, the built-in vertical
/// CRS table, then the EPSG dataset shipped with `crs-definitions`.
#[derive(Debug, Default, Clone)]
pub struct EpsgRegistry {
    definitions: HashMap<CrsId, Crs>,
    geoids: HashMap<CrsId, Arc<dyn GeoidModel>>,
}

impl EpsgRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any existing one for its id.
    pub fn register(&mut self, crs: Crs) {
        self.definitions.insert(crs.id, crs);
    }

    /// Builder form of [`EpsgRegistry::register`].
    pub fn with_definition(mut self, crs: Crs) -> Self {
        self.register(crs);
        self
    }

    /// Register the geoid model for a vertical CRS.
    pub fn register_geoid(&mut self, vertical: CrsId, model: Arc<dyn GeoidModel>) {
        self.geoids.insert(vertical, model);
    }

    /// Builder form of [`EpsgRegistry::register_geoid`].
    pub fn with_geoid(mut self, vertical: CrsId, model: Arc<dyn GeoidModel>) -> Self {
        self.register_geoid(vertical, model);
        self
    }

    fn builtin_vertical(id: &CrsId) -> Option<Crs> {
        VERTICAL_CRS
            .iter()
            .find(|(code, _)| *code == id.0)
            .map(|(_, wkt)| Crs::new(*id, "", *wkt))
    }

    fn from_dataset(id: &CrsId) -> Option<Crs> {
        let code = u16::try_from(id.0).ok()?;
        crs_definitions::from_code(code).map(|def| Crs::new(*id, def.proj4, def.wkt))
    }
}

impl CrsRegistry for EpsgRegistry {
    fn resolve(&self, id: &CrsId) -> Result<Crs> {
        if let Some(crs) = self.definitions.get(id) {
            return Ok(crs.clone());
        }
        let crs = Self::builtin_vertical(id)
            .or_else(|| Self::from_dataset(id))
            .ok_or_else(|| GiError::UnknownCrs { id: id.to_string() })?;
        debug!(crs = %id, "resolved CRS");
        Ok(crs)
    }

    fn geoid(&self, vertical: &CrsId) -> Option<Arc<dyn GeoidModel>> {
        self.geoids.get(vertical).cloned()
    }
}

/// Horizontal and vertical CRS supplied once per ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrsPair {
    pub horizontal: Crs,
    pub vertical: Crs,
}

impl CrsPair {
    /// Resolve both identifiers through `registry`.
    pub fn resolve(
        registry: &dyn CrsRegistry,
        horizontal: &CrsId,
        vertical: &CrsId,
    ) -> Result<Self> {
        Ok(Self {
            horizontal: registry.resolve(horizontal)?,
            vertical: registry.resolve(vertical)?,
        })
    }
}
