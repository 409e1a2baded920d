//! schema.org `JobPosting` extraction from JSON-LD script blocks.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::{value_text, RawPosting, RawSalary};

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).unwrap()
});

/// Every `JobPosting` found in the page's JSON-LD blocks.
pub(super) fn extract(body: &str) -> Vec<RawPosting> {
    let document = Html::parse_document(body);
    let mut postings = Vec::new();

    for script in document.select(&LD_JSON) {
        let text: String = script.text().collect();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(value) => collect(&value, &mut postings),
            Err(e) => debug!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    postings
}

fn collect(value: &Value, out: &mut Vec<RawPosting>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect(graph, out);
            }
            if is_job_posting(value) {
                if let Some(posting) = parse_posting(value) {
                    out.push(posting);
                }
            }
        }
        _ => {}
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "JobPosting",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn parse_posting(value: &Value) -> Option<RawPosting> {
    let title = value
        .get("title")
        .or_else(|| value.get("name"))
        .and_then(value_text)?;

    let location_type = value.get("jobLocationType").and_then(value_text);
    let remote = location_type
        .as_deref()
        .map(|t| t.to_uppercase().contains("TELECOMMUTE"))
        .unwrap_or(false);

    let requirements = ["qualifications", "experienceRequirements", "skills"]
        .iter()
        .filter_map(|key| value.get(*key).and_then(value_text))
        .collect::<Vec<_>>();

    Some(RawPosting {
        title,
        url: value.get("url").and_then(value_text),
        location: value.get("jobLocation").and_then(location_text),
        description: value.get("description").and_then(value_text),
        requirements: if requirements.is_empty() {
            None
        } else {
            Some(requirements.join("\n"))
        },
        salary: value.get("baseSalary").and_then(parse_salary),
        arrangement_hint: location_type,
        remote,
        posted: value.get("datePosted").and_then(value_text),
        employment_type: value.get("employmentType").and_then(value_text),
        ..Default::default()
    })
}

fn location_text(value: &Value) -> Option<String> {
    if let Some(places) = value.as_array() {
        return places.iter().find_map(location_text);
    }
    if let Some(s) = value.as_str() {
        return Some(s.trim().to_string()).filter(|s| !s.is_empty());
    }

    let address = value.get("address").unwrap_or(value);
    if let Some(s) = address.as_str() {
        return Some(s.trim().to_string()).filter(|s| !s.is_empty());
    }

    let mut parts: Vec<String> = Vec::new();
    for key in ["addressLocality", "addressRegion", "addressCountry"] {
        if let Some(part) = address.get(key).and_then(value_text) {
            if !parts.iter().any(|p| p.eq_ignore_ascii_case(&part)) {
                parts.push(part);
            }
        }
    }
    if parts.is_empty() {
        value.get("name").and_then(value_text)
    } else {
        Some(parts.join(", "))
    }
}

fn parse_salary(value: &Value) -> Option<RawSalary> {
    let number = |v: Option<&Value>| {
        v.and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.replace(',', "").trim().parse().ok(),
            _ => None,
        })
    };

    let currency = value.get("currency").and_then(value_text);
    let inner = value.get("value").unwrap_or(&Value::Null);

    let (min, max, unit) = match inner {
        Value::Object(_) => {
            let exact = number(inner.get("value"));
            (
                number(inner.get("minValue")).or(exact),
                number(inner.get("maxValue")).or(exact),
                inner.get("unitText").and_then(value_text),
            )
        }
        other => {
            let exact = number(Some(other));
            (exact, exact, None)
        }
    };

    let unit = unit.or_else(|| value.get("unitText").and_then(value_text));
    if min.is_none() && max.is_none() {
        return None;
    }

    Some(RawSalary {
        min,
        max,
        currency,
        unit,
    })
}
