//! Mapping raw postings onto canonical job records.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use sha2::{Digest, Sha256};
use url::Url;

use crate::models::{Company, Job, SalaryPeriod, WorkArrangement};
use crate::scrapers::{RawPosting, RawSalary};

pub const DEFAULT_LOCATION: &str = "Singapore";
pub const DEFAULT_CURRENCY: &str = "SGD";

const MAX_TITLE_LEN: usize = 200;
const MAX_SLUG_BASE_LEN: usize = 80;

/// Query parameters that only carry tracking information.
const TRACKING_PARAMS: &[&str] = &["gclid", "fbclid", "ref", "source", "src", "trk"];

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?[a-z][a-z0-9]*(?:\s[^<>]*)?/?>").unwrap());

static SALARY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)\s*(k)?\b").unwrap());
static PERIOD_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(hour|hr|hrs|hourly)\b|/\s*h\b").unwrap());
static PERIOD_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(month|months|monthly|mth|mths|mo)\b").unwrap());
static PERIOD_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(year|yearly|annum|annual|annually|yr|pa)\b|p\.a\.").unwrap()
});

static DURATION_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s*(?:-|–|to)\s*(\d{1,2})\s*-?\s*(months?|mths?|weeks?|wks?|years?|yrs?)\b")
        .unwrap()
});
static DURATION_SINGLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s*-?\s*(months?|mths?|weeks?|wks?|years?|yrs?)\b").unwrap()
});

/// Salary range after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salary {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub currency: String,
    pub period: Option<SalaryPeriod>,
}

impl Default for Salary {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            currency: DEFAULT_CURRENCY.to_string(),
            period: None,
        }
    }
}

/// A posting in canonical form, ready for deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedJob {
    pub company_id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: String,
    pub work_arrangement: WorkArrangement,
    pub salary: Salary,
    pub duration: Option<String>,
    pub duration_months: Option<i32>,
    pub application_url: String,
    pub posted_at: DateTime<Utc>,
    pub dedup_key: String,
    pub content_hash: String,
}

impl NormalizedJob {
    /// A new active job first seen at `now`.
    pub fn into_job(self, now: DateTime<Utc>) -> Job {
        Job {
            id: uuid::Uuid::new_v4().to_string(),
            company_id: self.company_id,
            title: self.title,
            slug: self.slug,
            description: self.description,
            requirements: self.requirements,
            location: self.location,
            work_arrangement: self.work_arrangement,
            salary_min: self.salary.min,
            salary_max: self.salary.max,
            salary_currency: self.salary.currency,
            salary_period: self.salary.period,
            duration: self.duration,
            duration_months: self.duration_months,
            application_url: self.application_url,
            posted_at: self.posted_at,
            dedup_key: self.dedup_key,
            content_hash: self.content_hash,
            is_active: true,
            inactive_reason: None,
            first_seen_at: now,
            last_seen_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the scraped content of an existing job, keeping its identity
    /// (id, slug, first sighting, creation time) and reactivating it.
    pub fn apply_to(self, job: &mut Job, now: DateTime<Utc>) {
        job.title = self.title;
        job.description = self.description;
        job.requirements = self.requirements;
        job.location = self.location;
        job.work_arrangement = self.work_arrangement;
        job.salary_min = self.salary.min;
        job.salary_max = self.salary.max;
        job.salary_currency = self.salary.currency;
        job.salary_period = self.salary.period;
        job.duration = self.duration;
        job.duration_months = self.duration_months;
        job.application_url = self.application_url;
        job.posted_at = self.posted_at;
        job.content_hash = self.content_hash;
        job.is_active = true;
        job.inactive_reason = None;
        job.last_seen_at = now;
        job.updated_at = now;
    }
}

/// Normalize one raw posting found on `page_url` for `company`.
///
/// Returns `None` for postings without a usable title.
pub fn normalize_posting(
    raw: &RawPosting,
    company: &Company,
    page_url: &str,
    now: DateTime<Utc>,
) -> Option<NormalizedJob> {
    let title = clean_title(&raw.title)?;

    let description = raw
        .description
        .as_deref()
        .map(html_to_text)
        .unwrap_or_default();
    let requirements = raw
        .requirements
        .as_deref()
        .map(html_to_text)
        .filter(|r| !r.is_empty());

    let location = normalize_location(raw.location.as_deref());
    let work_arrangement = detect_arrangement(raw, &title);

    let salary = match raw.salary {
        Some(ref structured) => salary_from_structured(structured),
        None => None,
    }
    .or_else(|| raw.salary_text.as_deref().and_then(parse_salary))
    .unwrap_or_default();

    let (duration, duration_months) = match raw.duration_text.as_deref() {
        Some(text) => (
            Some(collapse_whitespace(text)).filter(|d| !d.is_empty()),
            parse_duration_months(text),
        ),
        None => (None, parse_duration_months(&title)),
    };

    let application_url = resolve_application_url(raw.url.as_deref(), page_url, &company.careers_url);
    let posted_at = raw
        .posted
        .as_deref()
        .and_then(parse_posted_at)
        .filter(|dt| *dt <= now)
        .unwrap_or(now);

    let dedup_key = dedup_key(&application_url, page_url, &company.careers_url, &title, &location);
    let slug = make_slug(&title, &company.name, &company.id, &dedup_key);

    let salary_min = salary.min.map(|v| v.to_string()).unwrap_or_default();
    let salary_max = salary.max.map(|v| v.to_string()).unwrap_or_default();
    let content_hash = content_hash(&[
        title.as_str(),
        description.as_str(),
        requirements.as_deref().unwrap_or(""),
        location.as_str(),
        work_arrangement.as_str(),
        salary_min.as_str(),
        salary_max.as_str(),
        salary.currency.as_str(),
        salary.period.map(|p| p.as_str()).unwrap_or(""),
        duration.as_deref().unwrap_or(""),
        application_url.as_str(),
    ]);

    Some(NormalizedJob {
        company_id: company.id.clone(),
        title,
        slug,
        description,
        requirements,
        location,
        work_arrangement,
        salary,
        duration,
        duration_months,
        application_url,
        posted_at,
        dedup_key,
        content_hash,
    })
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode HTML entities in plain text.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    Html::parse_fragment(s).root_element().text().collect()
}

fn clean_title(raw: &str) -> Option<String> {
    let title = collapse_whitespace(&decode_entities(raw));
    if title.is_empty() {
        return None;
    }
    Some(title.chars().take(MAX_TITLE_LEN).collect())
}

/// Elements rendered on their own line.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "table", "section",
    "article", "header", "footer", "blockquote", "pre",
];

/// Convert HTML (possibly entity-escaped, as some ATS APIs return it) to
/// plain text with one paragraph or list item per line. Input without any
/// tags is treated as plain text.
pub fn html_to_text(input: &str) -> String {
    let markup = if MARKUP_TAG.is_match(input) {
        Some(input.to_string())
    } else if input.contains("&lt;") {
        Some(decode_entities(input)).filter(|decoded| MARKUP_TAG.is_match(decoded))
    } else {
        None
    };

    let text = match markup {
        Some(html) => {
            let fragment = Html::parse_fragment(&html);
            let mut out = String::new();
            render_text(fragment.root_element(), &mut out);
            out
        }
        None => decode_entities(input),
    };

    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = collapse_whitespace(line);
        if line.is_empty() || line == "-" {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn render_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                match el.name() {
                    "script" | "style" | "noscript" | "template" => {}
                    "br" => out.push('\n'),
                    "li" => {
                        out.push_str("\n- ");
                        render_text(child, out);
                        out.push('\n');
                    }
                    name if BLOCK_ELEMENTS.contains(&name) => {
                        out.push('\n');
                        render_text(child, out);
                        out.push('\n');
                    }
                    _ => render_text(child, out),
                }
            }
            _ => {}
        }
    }
}

/// Canonical location text; defaults to Singapore.
pub fn normalize_location(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return DEFAULT_LOCATION.to_string();
    };

    let mut parts: Vec<String> = Vec::new();
    for part in raw.split([',', '/', '|']) {
        // Drop arrangement notes such as "(Hybrid)".
        let part = match part.find('(') {
            Some(idx) => &part[..idx],
            None => part,
        };
        let part = collapse_whitespace(part);
        if part.is_empty() || is_arrangement_word(&part) {
            continue;
        }
        let part = match part.to_lowercase().as_str() {
            "sg" | "sgp" | "singapore" | "republic of singapore" => DEFAULT_LOCATION.to_string(),
            _ => part,
        };
        if !parts.iter().any(|p| p.eq_ignore_ascii_case(&part)) {
            parts.push(part);
        }
    }

    if parts.is_empty() {
        DEFAULT_LOCATION.to_string()
    } else {
        parts.join(", ")
    }
}

fn is_arrangement_word(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "remote" | "hybrid" | "on-site" | "onsite" | "on site" | "wfh" | "work from home"
    )
}

/// Work arrangement from explicit flags or keywords in title/location/hints.
pub fn detect_arrangement(raw: &RawPosting, title: &str) -> WorkArrangement {
    if raw.remote {
        return WorkArrangement::Remote;
    }

    let haystack = [
        Some(title),
        raw.location.as_deref(),
        raw.arrangement_hint.as_deref(),
        raw.employment_type.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

    if haystack.contains("hybrid") {
        WorkArrangement::Hybrid
    } else if ["remote", "work from home", "wfh", "telecommute"]
        .iter()
        .any(|k| haystack.contains(k))
    {
        WorkArrangement::Remote
    } else {
        WorkArrangement::OnSite
    }
}

fn period_from_text(text: &str) -> Option<SalaryPeriod> {
    if PERIOD_HOUR.is_match(text) {
        Some(SalaryPeriod::Hour)
    } else if PERIOD_MONTH.is_match(text) {
        Some(SalaryPeriod::Month)
    } else if PERIOD_YEAR.is_match(text) {
        Some(SalaryPeriod::Year)
    } else {
        None
    }
}

fn currency_from_text(text: &str) -> String {
    let upper = text.to_uppercase();
    if upper.contains("USD") || upper.contains("US$") {
        "USD".to_string()
    } else {
        DEFAULT_CURRENCY.to_string()
    }
}

fn ordered(min: Option<i32>, max: Option<i32>) -> (Option<i32>, Option<i32>) {
    match (min, max) {
        (Some(a), Some(b)) if a > b => (Some(b), Some(a)),
        other => other,
    }
}

/// Parse free-text pay such as `S$1,500 - S$2,000 / month` or `$1.5k-2k`.
pub fn parse_salary(text: &str) -> Option<Salary> {
    let mut numbers: Vec<(f64, bool)> = SALARY_NUMBER
        .captures_iter(text)
        .filter_map(|cap| {
            let value: f64 = cap.get(1)?.as_str().replace(',', "").parse().ok()?;
            Some((value, cap.get(2).is_some()))
        })
        .take(2)
        .collect();

    if numbers.is_empty() {
        return None;
    }

    // "1.5-2k": a trailing k applies to the whole range.
    let range_in_thousands = numbers.last().map(|(_, k)| *k).unwrap_or(false);
    for (value, k) in numbers.iter_mut() {
        if *k || (range_in_thousands && *value < 100.0) {
            *value *= 1000.0;
        }
    }

    let to_int = |v: f64| Some(v.round() as i32).filter(|v| *v > 0);
    let min = to_int(numbers[0].0);
    let max = numbers.get(1).and_then(|(v, _)| to_int(*v)).or(min);
    if min.is_none() && max.is_none() {
        return None;
    }
    let (min, max) = ordered(min, max);

    Some(Salary {
        min,
        max,
        currency: currency_from_text(text),
        period: period_from_text(text),
    })
}

fn salary_from_structured(raw: &RawSalary) -> Option<Salary> {
    let to_int = |v: Option<f64>| v.map(|v| v.round() as i32).filter(|v| *v > 0);
    let min = to_int(raw.min).or(to_int(raw.max));
    let max = to_int(raw.max).or(min);
    if min.is_none() {
        return None;
    }
    let (min, max) = ordered(min, max);

    let period = raw.unit.as_deref().and_then(|u| match u.to_uppercase().as_str() {
        "HOUR" => Some(SalaryPeriod::Hour),
        "MONTH" => Some(SalaryPeriod::Month),
        "YEAR" => Some(SalaryPeriod::Year),
        other => period_from_text(other),
    });

    Some(Salary {
        min,
        max,
        currency: raw
            .currency
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        period,
    })
}

fn months_for(count: u32, unit: &str) -> i32 {
    let unit = unit.to_lowercase();
    if unit.starts_with('w') {
        (count as f64 / 4.345).ceil() as i32
    } else if unit.starts_with('y') {
        count as i32 * 12
    } else {
        count as i32
    }
}

/// Internship length in months. Ranges yield the lower bound.
pub fn parse_duration_months(text: &str) -> Option<i32> {
    if let Some(cap) = DURATION_RANGE.captures(text) {
        let low: u32 = cap[1].parse().ok()?;
        let high: u32 = cap[2].parse().ok()?;
        return Some(months_for(low.min(high), &cap[3])).filter(|m| *m > 0);
    }
    let cap = DURATION_SINGLE.captures(text)?;
    let count: u32 = cap[1].parse().ok()?;
    Some(months_for(count, &cap[2])).filter(|m| *m > 0)
}

/// Strip fragments and tracking parameters so the same posting linked
/// from different campaigns compares equal.
pub fn canonicalize_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.trim().to_string();
    };
    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| {
            let k = k.to_lowercase();
            !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

/// Absolute, canonical application link; falls back to the careers page.
pub fn resolve_application_url(raw: Option<&str>, page_url: &str, careers_url: &str) -> String {
    let resolved = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .and_then(|r| {
            let base = Url::parse(page_url).or_else(|_| Url::parse(careers_url)).ok()?;
            base.join(r).ok()
        })
        .filter(|u| matches!(u.scheme(), "http" | "https"));

    match resolved {
        Some(url) => canonicalize_url(url.as_str()),
        None => canonicalize_url(careers_url),
    }
}

/// Parse RFC 3339, plain dates, `20 Apr 2024`, or epoch seconds/millis.
pub fn parse_posted_at(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.chars().all(|c| c.is_ascii_digit()) {
        if s.len() == 8 {
            let date = NaiveDate::parse_from_str(s, "%Y%m%d").ok()?;
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
        // Anything shorter than epoch seconds in this century is a year or noise.
        let n: i64 = s.parse().ok()?;
        return match n {
            ..1_000_000_000 => None,
            1_000_000_000..100_000_000_000 => Utc.timestamp_opt(n, 0).single(),
            _ => Utc.timestamp_millis_opt(n).single(),
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%d %b %Y", "%d %B %Y", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Lower-case alphanumerics separated by single spaces.
fn key_text(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&cleaned)
}

/// Identity of a posting within its company.
///
/// A dedicated application link identifies the posting; when the only link
/// is the careers page itself, title and location stand in.
pub fn dedup_key(
    application_url: &str,
    page_url: &str,
    careers_url: &str,
    title: &str,
    location: &str,
) -> String {
    let generic = [canonicalize_url(page_url), canonicalize_url(careers_url)];
    if !generic.iter().any(|g| g == application_url) {
        format!("url:{}", application_url)
    } else {
        format!("title:{}|{}", key_text(title), key_text(location))
    }
}

/// SHA-256 over the fields that make up a posting's visible content.
pub fn content_hash(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for field in fields {
        hasher.update(field.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}

/// URL slug `title-company-xxxxxxxx`, stable for a given identity.
pub fn make_slug(title: &str, company_name: &str, company_id: &str, dedup_key: &str) -> String {
    let mut base = String::new();
    for c in format!("{} {}", title, company_name).chars() {
        if c.is_ascii_alphanumeric() {
            base.push(c.to_ascii_lowercase());
        } else if !base.ends_with('-') {
            base.push('-');
        }
    }
    let mut base = base.trim_matches('-').to_string();
    if base.len() > MAX_SLUG_BASE_LEN {
        base.truncate(MAX_SLUG_BASE_LEN);
        base = base.trim_end_matches('-').to_string();
    }
    if base.is_empty() {
        base.push_str("internship");
    }

    let digest = Sha256::digest(format!("{}|{}", company_id, dedup_key).as_bytes());
    format!("{}-{}", base, &hex::encode(digest)[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn company() -> Company {
        let mut c = Company::new("Acme Pte. Ltd.".into(), "https://acme.sg/careers".into());
        c.id = "c1".into();
        c
    }

    #[test]
    fn test_salary_formats() {
        let s = parse_salary("S$1,500 - S$2,000 / month").unwrap();
        assert_eq!((s.min, s.max), (Some(1500), Some(2000)));
        assert_eq!(s.currency, "SGD");
        assert_eq!(s.period, Some(SalaryPeriod::Month));

        let s = parse_salary("$1.5k-2k").unwrap();
        assert_eq!((s.min, s.max), (Some(1500), Some(2000)));
        assert_eq!(s.period, None);

        let s = parse_salary("SGD 1200 per month").unwrap();
        assert_eq!((s.min, s.max), (Some(1200), Some(1200)));

        let s = parse_salary("$20/hr").unwrap();
        assert_eq!(s.min, Some(20));
        assert_eq!(s.period, Some(SalaryPeriod::Hour));

        let s = parse_salary("US$3,000 - 2,000 monthly").unwrap();
        assert_eq!((s.min, s.max), (Some(2000), Some(3000)));
        assert_eq!(s.currency, "USD");

        let s = parse_salary("1.5 - 2k").unwrap();
        assert_eq!((s.min, s.max), (Some(1500), Some(2000)));

        let s = parse_salary("S$1,000.50 per month").unwrap();
        assert_eq!((s.min, s.max), (Some(1001), Some(1001)));
        let s = parse_salary("S$1,000.40 - S$1,200.60 per month").unwrap();
        assert_eq!((s.min, s.max), (Some(1000), Some(1201)));

        assert!(parse_salary("Competitive").is_none());
    }

    #[test]
    fn test_structured_salary_wins() {
        let raw = RawPosting {
            title: "Intern".into(),
            salary: Some(RawSalary {
                min: Some(1800.0),
                max: None,
                currency: Some("sgd".into()),
                unit: Some("MONTH".into()),
            }),
            salary_text: Some("$5k".into()),
            ..Default::default()
        };
        let job = normalize_posting(&raw, &company(), "https://acme.sg/careers", Utc::now()).unwrap();
        assert_eq!((job.salary.min, job.salary.max), (Some(1800), Some(1800)));
        assert_eq!(job.salary.period, Some(SalaryPeriod::Month));
    }

    #[test]
    fn test_duration() {
        assert_eq!(parse_duration_months("3 months"), Some(3));
        assert_eq!(parse_duration_months("6-month internship"), Some(6));
        assert_eq!(parse_duration_months("12 weeks"), Some(3));
        assert_eq!(parse_duration_months("10 weeks"), Some(3));
        assert_eq!(parse_duration_months("1 year"), Some(12));
        assert_eq!(parse_duration_months("3-6 months"), Some(3));
        assert_eq!(parse_duration_months("3 to 6 mths"), Some(3));
        assert_eq!(parse_duration_months("flexible"), None);
    }

    #[test]
    fn test_duration_from_title_when_missing() {
        let raw = RawPosting {
            title: "6-Month Marketing Internship".into(),
            ..Default::default()
        };
        let job = normalize_posting(&raw, &company(), "https://acme.sg/careers", Utc::now()).unwrap();
        assert_eq!(job.duration, None);
        assert_eq!(job.duration_months, Some(6));
    }

    #[test]
    fn test_location() {
        assert_eq!(normalize_location(None), "Singapore");
        assert_eq!(normalize_location(Some("")), "Singapore");
        assert_eq!(normalize_location(Some("SG")), "Singapore");
        assert_eq!(normalize_location(Some("Singapore, SG")), "Singapore");
        assert_eq!(normalize_location(Some("Singapore, Singapore")), "Singapore");
        assert_eq!(normalize_location(Some("Singapore (Hybrid)")), "Singapore");
        assert_eq!(normalize_location(Some("Remote")), "Singapore");
        assert_eq!(normalize_location(Some("  One-North,   Singapore ")), "One-North, Singapore");
    }

    #[test]
    fn test_arrangement() {
        let raw = |loc: &str| RawPosting {
            title: "Intern".into(),
            location: Some(loc.into()),
            ..Default::default()
        };
        assert_eq!(detect_arrangement(&raw("Singapore"), "Intern"), WorkArrangement::OnSite);
        assert_eq!(detect_arrangement(&raw("Singapore (Hybrid)"), "Intern"), WorkArrangement::Hybrid);
        assert_eq!(detect_arrangement(&raw("Remote - APAC"), "Intern"), WorkArrangement::Remote);
        assert_eq!(
            detect_arrangement(&raw("Singapore"), "Intern (Work From Home)"),
            WorkArrangement::Remote
        );

        let flagged = RawPosting {
            remote: true,
            ..raw("Singapore (Hybrid)")
        };
        assert_eq!(detect_arrangement(&flagged, "Intern"), WorkArrangement::Remote);
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text(
            "<p>About <b>us</b> &amp; you</p><ul><li>Python</li><li>SQL</li></ul><script>x()</script>",
        );
        assert_eq!(text, "About us & you\n- Python\n- SQL");

        // Entity-escaped markup, as returned by Greenhouse.
        let text = html_to_text("&lt;p&gt;Hello&lt;/p&gt;&lt;p&gt;World&lt;/p&gt;");
        assert_eq!(text, "Hello\nWorld");

        // Plain text keeps its comparison signs.
        let text = html_to_text("Open to students with GPA < 4.0 and > 3.0 in CS");
        assert_eq!(text, "Open to students with GPA < 4.0 and > 3.0 in CS");
        let text = html_to_text("Salary &gt; S$1,000\n\nR&amp;D team");
        assert_eq!(text, "Salary > S$1,000\nR&D team");
    }

    #[test]
    fn test_canonicalize_url() {
        assert_eq!(
            canonicalize_url("https://ACME.sg/jobs/42/?utm_source=li&id=7&gclid=x#apply"),
            "https://acme.sg/jobs/42?id=7"
        );
        assert_eq!(
            canonicalize_url("https://acme.sg/jobs/42?utm_medium=email"),
            "https://acme.sg/jobs/42"
        );
    }

    #[test]
    fn test_resolve_application_url() {
        assert_eq!(
            resolve_application_url(Some("/jobs/1"), "https://acme.sg/careers/", "https://acme.sg/careers"),
            "https://acme.sg/jobs/1"
        );
        assert_eq!(
            resolve_application_url(Some("mailto:hr@acme.sg"), "https://acme.sg/careers", "https://acme.sg/careers"),
            "https://acme.sg/careers"
        );
        assert_eq!(
            resolve_application_url(None, "https://acme.sg/careers", "https://acme.sg/careers?utm_source=x"),
            "https://acme.sg/careers"
        );
    }

    #[test]
    fn test_posted_at() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_posted_at("2024-05-01"), Some(expected));
        assert_eq!(parse_posted_at("2024-05-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_posted_at("2024-05-01T08:00:00+08:00"), Some(expected));
        assert_eq!(parse_posted_at("1714521600000"), Some(expected));
        assert_eq!(parse_posted_at("1714521600"), Some(expected));
        assert_eq!(parse_posted_at("1 May 2024"), Some(expected));
        assert_eq!(parse_posted_at("yesterday"), None);
        assert_eq!(parse_posted_at("20240501"), Some(expected));
        assert_eq!(parse_posted_at("2024"), None);
        assert_eq!(parse_posted_at("20241350"), None);
    }

    #[test]
    fn test_future_posted_at_clamped() {
        let now = Utc::now();
        let raw = RawPosting {
            title: "Intern".into(),
            posted: Some((now + Duration::days(10)).to_rfc3339()),
            ..Default::default()
        };
        let job = normalize_posting(&raw, &company(), "https://acme.sg/careers", now).unwrap();
        assert_eq!(job.posted_at, now);
    }

    #[test]
    fn test_dedup_key_prefers_specific_url() {
        let page = "https://acme.sg/careers";
        assert_eq!(
            dedup_key("https://acme.sg/jobs/1", page, page, "Intern", "Singapore"),
            "url:https://acme.sg/jobs/1"
        );
        assert_eq!(
            dedup_key("https://acme.sg/careers", page, page, "Data  Intern!", "Singapore"),
            "title:data intern|singapore"
        );
    }

    #[test]
    fn test_slug_is_stable_and_bounded() {
        let a = make_slug("Software Engineering Intern (2025)", "Acme Pte. Ltd.", "c1", "url:x");
        let b = make_slug("Software Engineering Intern (2025)", "Acme Pte. Ltd.", "c1", "url:x");
        assert_eq!(a, b);
        assert!(a.starts_with("software-engineering-intern-2025-acme-pte-ltd-"));
        assert_eq!(a.len(), "software-engineering-intern-2025-acme-pte-ltd-".len() + 8);

        let other = make_slug("Software Engineering Intern (2025)", "Acme Pte. Ltd.", "c1", "url:y");
        assert_ne!(a, other);

        let long = make_slug(&"very long title ".repeat(20), "Acme", "c1", "k");
        assert!(long.len() <= MAX_SLUG_BASE_LEN + 9);
        assert_eq!(make_slug("实习生", "", "c1", "k").split('-').next(), Some("internship"));
    }

    #[test]
    fn test_content_hash_tracks_changes() {
        let now = Utc::now();
        let mut raw = RawPosting {
            title: "Data Intern".into(),
            url: Some("/jobs/9".into()),
            description: Some("<p>Crunch numbers</p>".into()),
            ..Default::default()
        };
        let a = normalize_posting(&raw, &company(), "https://acme.sg/careers", now).unwrap();
        let b = normalize_posting(&raw, &company(), "https://acme.sg/careers", now).unwrap();
        assert_eq!(a.content_hash, b.content_hash);

        raw.description = Some("<p>Crunch more numbers</p>".into());
        let c = normalize_posting(&raw, &company(), "https://acme.sg/careers", now).unwrap();
        assert_ne!(a.content_hash, c.content_hash);
        assert_eq!(a.dedup_key, c.dedup_key);
        assert_eq!(a.slug, c.slug);
    }

    #[test]
    fn test_blank_title_dropped() {
        let raw = RawPosting {
            title: "  \n ".into(),
            ..Default::default()
        };
        assert!(normalize_posting(&raw, &company(), "https://acme.sg/careers", Utc::now()).is_none());
    }
}
