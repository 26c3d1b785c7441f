//! Schema and referential-integrity validation of canonical databases.
//!
//! The engine runs every rule and aggregates the violations, so a caller
//! sees all problems in one pass. Schema rules run before referential ones.

mod rules;
mod violation;

use tracing::debug;

use crate::database::CanonicalDatabase;

pub use rules::{
    ColumnPresenceValidator, ForeignKeyValidator, NullabilityValidator, NumericValidator,
    ProjectRowCountValidator, UniqueKeyValidator, ValidationMode, Validator,
};
pub use violation::{ValidationReport, Violation, ViolationCategory, ViolationKind};

/// Runs a fixed sequence of validators over a database.
pub struct ValidationEngine {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidationEngine {
    /// Create an engine with all rules for `mode`.
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            validators: vec![
                Box::new(ColumnPresenceValidator),
                Box::new(ProjectRowCountValidator { mode }),
                Box::new(NullabilityValidator),
                Box::new(NumericValidator),
                Box::new(UniqueKeyValidator),
                Box::new(ForeignKeyValidator),
            ],
        }
    }

    /// Run all validators and collect violations.
    pub fn validate(&self, db: &CanonicalDatabase) -> ValidationReport {
        let mut violations = Vec::new();
        for validator in &self.validators {
            violations.extend(validator.validate(db));
        }
        debug!(violations = violations.len(), "validated database");
        ValidationReport::new(violations)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(ValidationMode::default())
    }
}

/// Validate a single-ingestion database.
pub fn validate(db: &CanonicalDatabase) -> ValidationReport {
    ValidationEngine::default().validate(db)
}
