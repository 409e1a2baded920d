//! Turning fetched careers pages into raw postings.

mod html;
mod json_api;
mod json_ld;

pub use json_api::extract_path;

use serde_json::Value;
use tracing::debug;

use super::config::{ApiFieldPaths, ScrapeConfig, Strategy};
use super::error::ExtractError;
use super::http_client::FetchedPage;

/// Structured salary as published by the source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSalary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
    /// Pay period as written, e.g. `MONTH` or `per hour`.
    pub unit: Option<String>,
}

/// A posting as found on the page, before normalization.
///
/// Text fields may still contain markup or odd whitespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPosting {
    pub title: String,
    pub url: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary_text: Option<String>,
    pub salary: Option<RawSalary>,
    pub duration_text: Option<String>,
    /// Free text hinting at remote, hybrid or on-site work.
    pub arrangement_hint: Option<String>,
    /// Source explicitly flags the role as remote.
    pub remote: bool,
    pub posted: Option<String>,
    pub employment_type: Option<String>,
}

/// Extract postings from a page according to the company's config.
pub fn extract_postings(
    config: &ScrapeConfig,
    page: &FetchedPage,
) -> Result<Vec<RawPosting>, ExtractError> {
    let postings = match config.strategy {
        Strategy::JsonLd => require_some(json_ld::extract(&page.body), page)?,
        Strategy::Html => {
            let selectors = config.html.as_ref().ok_or_else(|| {
                ExtractError::Config("html strategy requires selectors".to_string())
            })?;
            html::extract(selectors, &page.body)?
        }
        Strategy::JsonApi => {
            let paths = config.api.as_ref().ok_or_else(|| {
                ExtractError::Config("json_api strategy requires field paths".to_string())
            })?;
            json_api::extract(paths, &page.body)?
        }
        Strategy::Greenhouse => json_api::extract(&ApiFieldPaths::greenhouse(), &page.body)?,
        Strategy::Lever => json_api::extract(&ApiFieldPaths::lever(), &page.body)?,
        Strategy::Auto => extract_auto(page)?,
    };

    debug!(
        "Extracted {} postings from {} ({})",
        postings.len(),
        page.url,
        config.strategy.as_str()
    );
    Ok(postings)
}

fn extract_auto(page: &FetchedPage) -> Result<Vec<RawPosting>, ExtractError> {
    if page.is_json() {
        let data: Value = serde_json::from_str(&page.body)?;
        if data.get("jobs").map(Value::is_array).unwrap_or(false) {
            return json_api::extract_value(&ApiFieldPaths::greenhouse(), &data);
        }
        if let Some(items) = data.as_array() {
            let looks_like_lever = items
                .first()
                .map(|item| item.get("text").is_some() && item.get("hostedUrl").is_some())
                .unwrap_or(true);
            if looks_like_lever {
                return json_api::extract_value(&ApiFieldPaths::lever(), &data);
            }
        }
        return Err(ExtractError::NoPostings(page.url.clone()));
    }

    require_some(json_ld::extract(&page.body), page)
}

fn require_some(
    postings: Vec<RawPosting>,
    page: &FetchedPage,
) -> Result<Vec<RawPosting>, ExtractError> {
    if postings.is_empty() {
        Err(ExtractError::NoPostings(page.url.clone()))
    } else {
        Ok(postings)
    }
}

/// Keep postings whose title contains any keyword (case-insensitive).
/// An empty keyword list keeps everything.
pub fn filter_by_keywords(postings: Vec<RawPosting>, keywords: &[String]) -> Vec<RawPosting> {
    if keywords.is_empty() {
        return postings;
    }
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    postings
        .into_iter()
        .filter(|p| {
            let title = p.title.to_lowercase();
            keywords.iter().any(|k| title.contains(k.as_str()))
        })
        .collect()
}

/// Render a JSON scalar (or array of scalars) as text.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .get("description")
            .or_else(|| map.get("name"))
            .and_then(value_text)?,
        Value::Null => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
