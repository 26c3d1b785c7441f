//! Surrogate key synthesis.
//!
//! Source identifiers are only unique within one project, and sample
//! references may be missing altogether, so canonical keys are composed
//! from several source fields plus the project id. Null fragments render as
//! `None`.

use crate::table::{GroupTable, Value};

/// `{location_id}_{project_uid}`.
pub fn location_uid(location_id: &Value, project_uid: &str) -> String {
    format!("{}_{}", location_id.key_fragment(), project_uid)
}

/// `{reference}_{type}_{top}_{location_id}`.
pub fn sample_source_id(
    reference: &Value,
    sample_type: &Value,
    top: &Value,
    location_id: &Value,
) -> String {
    format!(
        "{}_{}_{}_{}",
        reference.key_fragment(),
        sample_type.key_fragment(),
        top.key_fragment(),
        location_id.key_fragment()
    )
}

/// `{sample_source_id}_{project_uid}`.
pub fn sample_uid(sample_source_id: &str, project_uid: &str) -> String {
    format!("{}_{}", sample_source_id, project_uid)
}

/// Column positions of the sample key fields within one group.
#[derive(Debug, Clone, Copy)]
pub struct SampleKeyColumns {
    reference: Option<usize>,
    sample_type: Option<usize>,
    top: usize,
    location: usize,
}

impl SampleKeyColumns {
    /// Locate the key columns. The top depth and location id are required;
    /// a missing reference or type renders as `None`.
    pub fn locate(
        group: &GroupTable,
        reference: &str,
        sample_type: &str,
        top: &str,
        location: &str,
    ) -> Option<Self> {
        Some(Self {
            reference: group.column_index(reference),
            sample_type: group.column_index(sample_type),
            top: group.column_index(top)?,
            location: group.column_index(location)?,
        })
    }

    pub fn location<'a>(&self, row: &'a [Value]) -> &'a Value {
        cell(row, Some(self.location))
    }

    pub fn top<'a>(&self, row: &'a [Value]) -> &'a Value {
        cell(row, Some(self.top))
    }

    pub fn source_id(&self, row: &[Value]) -> String {
        sample_source_id(
            cell(row, self.reference),
            cell(row, self.sample_type),
            cell(row, Some(self.top)),
            cell(row, Some(self.location)),
        )
    }
}

fn cell(row: &[Value], index: Option<usize>) -> &Value {
    static NULL: Value = Value::Null;
    index.and_then(|i| row.get(i)).unwrap_or(&NULL)
}
