// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Small input validation helpers shared by the handlers.

/// Names of required fields that are missing or blank.
pub fn missing_fields<'a>(fields: &[(&'a str, Option<&str>)]) -> Vec<&'a str> {
    fields
        .iter()
        .filter(|(_, value)| value.map(str::trim).is_none_or(str::is_empty))
        .map(|(name, _)| *name)
        .collect()
}

/// Character-count upper bound.
pub fn max_length(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

/// Minimal email shape check: one `@`, non-empty local part, dotted domain.
pub fn email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
