//! Point and line geometries rendered as well-known text.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::Value;

/// A simple geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// 2D point.
    Point(f64, f64),
    /// 3D point.
    PointZ(f64, f64, f64),
    /// 3D polyline.
    LineStringZ(Vec<[f64; 3]>),
}

impl Geometry {
    /// A vertical line from `top` down to `base` at one plan position, or a
    /// point at `top` when the base is unknown.
    pub fn vertical(x: f64, y: f64, top: f64, base: Option<f64>) -> Geometry {
        match base {
            Some(base) => Geometry::LineStringZ(vec![[x, y, top], [x, y, base]]),
            None => Geometry::PointZ(x, y, top),
        }
    }

    /// Well-known text representation.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }

    /// Cell value holding the WKT.
    pub fn to_value(&self) -> Value {
        Value::String(self.to_wkt())
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point(x, y) => write!(f, "POINT ({} {})", x, y),
            Geometry::PointZ(x, y, z) => write!(f, "POINT Z ({} {} {})", x, y, z),
            Geometry::LineStringZ(coords) => {
                f.write_str("LINESTRING Z (")?;
                for (i, [x, y, z]) in coords.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {} {}", x, y, z)?;
                }
                f.write_str(")")
            }
        }
    }
}
