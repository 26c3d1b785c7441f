//! Group and heading names that differ between AGS editions.

use super::depth::{AGS3_DEPTH_RULES, AGS4_DEPTH_RULES, DepthRule};
use crate::ags::AgsVersion;

/// Source names the mapper looks for.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub version: AgsVersion,
    pub project_group: &'static str,
    pub project_id: &'static str,
    pub location_group: &'static str,
    pub location_id: &'static str,
    pub location_type: &'static str,
    pub easting: &'static str,
    pub northing: &'static str,
    pub ground_level: &'static str,
    pub final_depth: &'static str,
    pub sample_group: &'static str,
    pub sample_reference: &'static str,
    pub sample_type: &'static str,
    pub sample_top: &'static str,
    pub sample_base: &'static str,
    pub depth_rules: &'static [DepthRule],
}

pub static AGS3: Dialect = Dialect {
    version: AgsVersion::Ags3,
    project_group: "PROJ",
    project_id: "PROJ_ID",
    location_group: "HOLE",
    location_id: "HOLE_ID",
    location_type: "HOLE_TYPE",
    easting: "HOLE_NATE",
    northing: "HOLE_NATN",
    ground_level: "HOLE_GL",
    final_depth: "HOLE_FDEP",
    sample_group: "SAMP",
    sample_reference: "SAMP_REF",
    sample_type: "SAMP_TYPE",
    sample_top: "SAMP_TOP",
    sample_base: "SAMP_BASE",
    depth_rules: AGS3_DEPTH_RULES,
};

pub static AGS4: Dialect = Dialect {
    version: AgsVersion::Ags4,
    project_group: "PROJ",
    project_id: "PROJ_ID",
    location_group: "LOCA",
    location_id: "LOCA_ID",
    location_type: "LOCA_TYPE",
    easting: "LOCA_NATE",
    northing: "LOCA_NATN",
    ground_level: "LOCA_GL",
    final_depth: "LOCA_FDEP",
    sample_group: "SAMP",
    sample_reference: "SAMP_REF",
    sample_type: "SAMP_TYPE",
    sample_top: "SAMP_TOP",
    sample_base: "SAMP_BASE",
    depth_rules: AGS4_DEPTH_RULES,
};

impl Dialect {
    /// The dialect of an AGS edition.
    pub fn for_version(version: AgsVersion) -> &'static Dialect {
        match version {
            AgsVersion::Ags3 => &AGS3,
            AgsVersion::Ags4 => &AGS4,
        }
    }
}
