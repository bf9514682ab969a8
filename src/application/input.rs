//! Field checks shared by the write services.

use std::collections::BTreeSet;

use crate::domain::error::ValidationErrors;

/// Trimmed value of a required text field bounded to `max` characters.
///
/// Records an error and returns `None` when the value is absent, blank or
/// too long.
pub(crate) fn required_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max: Option<usize>,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.add(field, format!("The {field} field is required."));
        return None;
    }

    if let Some(max) = max {
        if trimmed.chars().count() > max {
            errors.add(
                field,
                format!("The {field} may not be greater than {max} characters."),
            );
            return None;
        }
    }

    Some(trimmed.to_string())
}

/// Like [`required_text`] but only checked when the field was supplied.
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max: Option<usize>,
) -> Option<String> {
    value.and_then(|value| required_text(errors, field, Some(value), max))
}

/// Sorted, de-duplicated tag ids.
pub(crate) fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}
