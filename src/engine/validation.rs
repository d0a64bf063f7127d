//! Required-field checks run before a submission.

use super::values::{FileMap, FormValues, ResolvedField};
use crate::domain::ValidationError;

fn violation(field: &ResolvedField, values: &FormValues, files: &FileMap) -> Option<ValidationError> {
    if !field.descriptor.required {
        return None;
    }

    let missing = if field.kind.is_file() {
        files.get(field.field_id()).is_none()
    } else {
        // No trimming: only a literal empty string counts as missing.
        values
            .get(field.field_id())
            .map(|v| v.is_empty())
            .unwrap_or(true)
    };

    missing.then(|| ValidationError::RequiredField {
        field_id: field.field_id().to_string(),
        label: field.label().to_string(),
    })
}

/// Fail fast on the first required field (in schema order) without a value.
pub fn validate_required(
    fields: &[ResolvedField],
    values: &FormValues,
    files: &FileMap,
) -> Result<(), ValidationError> {
    match fields.iter().find_map(|f| violation(f, values, files)) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every required field without a value, in schema order.
pub fn collect_violations(
    fields: &[ResolvedField],
    values: &FormValues,
    files: &FileMap,
) -> Vec<ValidationError> {
    fields
        .iter()
        .filter_map(|f| violation(f, values, files))
        .collect()
}
