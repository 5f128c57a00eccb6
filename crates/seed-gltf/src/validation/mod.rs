//! Two-phase model validation.
//!
//! The reference phase checks that every index in the document resolves and
//! that unique-reference rules hold; it only looks at the JSON. The content
//! phase decodes binary data and checks numeric rules; it assumes references
//! are sound. Both phases are pure: they collect [`ValidationIssue`]s into a
//! [`ValidationResult`]. Repairs are a separate step, [`apply_fixes`].

mod content;
mod fixes;
mod references;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use content::validate_content;
pub use fixes::{apply_fixes, Fix};
pub use references::validate_references;

use crate::error::{ErrorCategory, GltfError, Result};
use crate::extensions::ExtensionRegistry;
use crate::model::ModelRoot;

/// Tolerance on the length of vectors required to be unit length.
pub const UNIT_LENGTH_TOLERANCE: f32 = 0.01;

/// Tolerance on the per-vertex sum of skin weights.
pub const WEIGHT_SUM_TOLERANCE: f32 = 0.02;

/// How strictly models are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Every violation is an error.
    #[default]
    Strict,
    /// Repair fixable content violations, then fail on what remains.
    TryFix,
    /// Skip the content phase. References are still checked when reading.
    Skip,
}

/// One violation found by a validation phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Path of the offending object, e.g. `accessors[3]`.
    pub target: String,
    /// What is wrong.
    pub message: String,
    /// Which phase of the taxonomy the issue belongs to.
    pub category: ErrorCategory,
    /// Repair that would resolve the issue, if one exists.
    pub fix: Option<Fix>,
}

impl ValidationIssue {
    /// Convert into the error the pipelines report.
    pub fn to_error(&self) -> GltfError {
        match self.category {
            ErrorCategory::Reference => GltfError::reference(&self.target, &self.message),
            ErrorCategory::Format => {
                GltfError::format(format!("{}: {}", self.target, self.message))
            }
            ErrorCategory::Contract => {
                GltfError::contract(format!("{}: {}", self.target, self.message))
            }
            ErrorCategory::Content | ErrorCategory::Io => {
                GltfError::content(&self.target, &self.message)
            }
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.target, self.message)?;
        if self.fix.is_some() {
            f.write_str(" (fixable)")?;
        }
        Ok(())
    }
}

/// Issues collected by one or more validation phases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(
        &mut self,
        category: ErrorCategory,
        target: impl Into<String>,
        message: impl Into<String>,
        fix: Option<Fix>,
    ) {
        self.issues.push(ValidationIssue {
            target: target.into(),
            message: message.into(),
            category,
            fix,
        });
    }

    pub(crate) fn reference(&mut self, target: impl Into<String>, message: impl Into<String>) {
        self.push(ErrorCategory::Reference, target, message, None);
    }

    pub(crate) fn content(&mut self, target: impl Into<String>, message: impl Into<String>) {
        self.push(ErrorCategory::Content, target, message, None);
    }

    pub(crate) fn fixable(
        &mut self,
        target: impl Into<String>,
        message: impl Into<String>,
        fix: Fix,
    ) {
        self.push(ErrorCategory::Content, target, message, Some(fix));
    }

    /// True when nothing was found.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Every collected issue, in discovery order.
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Repairs offered by the collected issues.
    pub fn fixes(&self) -> impl Iterator<Item = &Fix> {
        self.issues.iter().filter_map(|issue| issue.fix.as_ref())
    }

    /// The first issue as an error, if any.
    pub fn first_error(&self) -> Option<GltfError> {
        self.issues.first().map(ValidationIssue::to_error)
    }

    /// `Ok` when empty, otherwise the first issue as an error.
    pub fn into_result(self) -> Result<()> {
        match self.first_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Append the issues of another result.
    pub fn merge(&mut self, other: ValidationResult) {
        self.issues.extend(other.issues);
    }
}

/// Run the content phase under `mode`, repairing what can be repaired in
/// [`ValidationMode::TryFix`].
pub fn check_content(model: &mut ModelRoot, mode: ValidationMode) -> Result<()> {
    match mode {
        ValidationMode::Skip => {
            debug!("content validation skipped");
            Ok(())
        }
        ValidationMode::Strict => validate_content(model).into_result(),
        ValidationMode::TryFix => {
            let result = validate_content(model);
            if result.is_ok() {
                return Ok(());
            }
            let applied = apply_fixes(model, &result)?;
            if applied > 0 {
                info!(fixes = applied, "repaired content violations");
            }
            let remaining = validate_content(model);
            if let Some(issue) = remaining.errors().first() {
                warn!(%issue, "content violation remains after repair");
            }
            remaining.into_result()
        }
    }
}

/// Run both phases: references, then content under `mode`.
pub fn validate(
    model: &mut ModelRoot,
    mode: ValidationMode,
    registry: &ExtensionRegistry,
) -> Result<()> {
    if mode == ValidationMode::Skip {
        debug!("validation skipped");
        return Ok(());
    }
    validate_references(model.document(), registry).into_result()?;
    check_content(model, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_reports_first_issue() {
        let mut result = ValidationResult::new();
        assert!(result.is_ok());
        result.reference("nodes[2]", "mesh 7 does not exist");
        result.content("accessors[0]", "value is not finite");

        assert_eq!(result.errors().len(), 2);
        let err = result.into_result().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Reference);
        insta::assert_snapshot!(err.to_string(), @"reference error in nodes[2]: mesh 7 does not exist");
    }

    #[test]
    fn test_issue_display_marks_fixable() {
        let mut result = ValidationResult::new();
        result.fixable(
            "nodes[0]",
            "rotation is not unit length",
            Fix::NormalizeRotation { node: 0 },
        );
        assert_eq!(
            result.errors()[0].to_string(),
            "[content] nodes[0]: rotation is not unit length (fixable)"
        );
        assert_eq!(result.fixes().count(), 1);
    }

    #[test]
    fn test_validate_runs_references_then_content() {
        let registry = ExtensionRegistry::default();
        let mut model = ModelRoot::new();
        model.document_mut().nodes.push(crate::schema::Node {
            rotation: Some([0.0, 0.0, 0.0, 2.0]),
            ..crate::schema::Node::default()
        });

        let err = validate(&mut model, ValidationMode::Strict, &registry).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Content);
        validate(&mut model, ValidationMode::TryFix, &registry).unwrap();
        assert_eq!(model.document().nodes[0].rotation, Some([0.0, 0.0, 0.0, 1.0]));

        model.document_mut().nodes[0].mesh = Some(4);
        assert!(validate(&mut model, ValidationMode::Skip, &registry).is_ok());
        let err = validate(&mut model, ValidationMode::Strict, &registry).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Reference);
    }

    #[test]
    fn test_mode_serde_names() {
        assert_eq!(
            serde_json::to_string(&ValidationMode::TryFix).unwrap(),
            "\"try_fix\""
        );
        assert_eq!(ValidationMode::default(), ValidationMode::Strict);
    }
}
