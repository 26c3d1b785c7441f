//! Group classification and mapping to the canonical schema.

mod depth;
mod dialect;
mod keys;
mod mapper;

pub use depth::{
    AGS3_DEPTH_RULES, AGS4_DEPTH_RULES, BaseColumn, DepthColumns, DepthRule, MissingDepth,
    resolve_depth_columns,
};
pub use dialect::{AGS3, AGS4, Dialect};
pub use keys::{SampleKeyColumns, location_uid, sample_source_id, sample_uid};
pub use mapper::map_groups;
