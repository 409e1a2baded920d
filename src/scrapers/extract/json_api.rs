//! Dotted-path extraction from JSON APIs.

use serde_json::Value;

use super::{value_text, RawPosting};
use crate::scrapers::config::ApiFieldPaths;
use crate::scrapers::error::ExtractError;

/// Extract a value from nested JSON using dot-notation path.
///
/// Numeric segments index into arrays. Missing keys yield `Null`.
pub fn extract_path<'a>(data: &'a Value, path: &str) -> &'a Value {
    if path.is_empty() {
        return data;
    }

    let mut current = data;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(key).unwrap_or(&Value::Null),
            Value::Array(arr) => match key.parse::<usize>() {
                Ok(idx) => arr.get(idx).unwrap_or(&Value::Null),
                Err(_) => &Value::Null,
            },
            _ => &Value::Null,
        };
    }

    current
}

pub(super) fn extract(paths: &ApiFieldPaths, body: &str) -> Result<Vec<RawPosting>, ExtractError> {
    let data: Value = serde_json::from_str(body)?;
    extract_value(paths, &data)
}

pub(super) fn extract_value(
    paths: &ApiFieldPaths,
    data: &Value,
) -> Result<Vec<RawPosting>, ExtractError> {
    let items = extract_path(data, &paths.items_path)
        .as_array()
        .ok_or_else(|| {
            ExtractError::Config(format!(
                "items path {:?} does not point to an array",
                paths.items_path
            ))
        })?;

    let field = |item: &Value, path: &Option<String>| {
        path.as_deref()
            .and_then(|p| value_text(extract_path(item, p)))
    };

    let postings = items
        .iter()
        .filter_map(|item| {
            let title = value_text(extract_path(item, &paths.title))?;
            let arrangement_hint = field(item, &paths.arrangement);
            Some(RawPosting {
                title,
                url: field(item, &paths.url),
                location: field(item, &paths.location),
                description: field(item, &paths.description),
                requirements: field(item, &paths.requirements),
                salary_text: field(item, &paths.salary),
                duration_text: field(item, &paths.duration),
                remote: arrangement_hint
                    .as_deref()
                    .map(|h| h.eq_ignore_ascii_case("remote"))
                    .unwrap_or(false),
                arrangement_hint,
                posted: field(item, &paths.posted),
                ..Default::default()
            })
        })
        .collect();

    Ok(postings)
}
