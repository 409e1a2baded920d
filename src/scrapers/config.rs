//! Per-company extraction configuration.
//!
//! Stored as JSON on each company row. An empty object selects the `auto`
//! strategy, which covers careers pages that publish schema.org
//! `JobPosting` data and the common hosted ATS APIs.

use serde::{Deserialize, Serialize};

/// How postings are pulled out of a fetched page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// JSON-LD first, then the known ATS JSON shapes.
    #[default]
    Auto,
    /// schema.org `JobPosting` blocks embedded in the page.
    JsonLd,
    /// CSS selectors over the HTML.
    Html,
    /// Dotted paths into a JSON response.
    JsonApi,
    /// Greenhouse job board API (`boards-api.greenhouse.io`).
    Greenhouse,
    /// Lever postings API (`api.lever.co`).
    Lever,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::JsonLd => "json_ld",
            Self::Html => "html",
            Self::JsonApi => "json_api",
            Self::Greenhouse => "greenhouse",
            Self::Lever => "lever",
        }
    }
}

/// Extraction configuration for one company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub strategy: Strategy,
    /// URL to fetch instead of the careers page (e.g. an ATS API endpoint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<HtmlSelectors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiFieldPaths>,
    /// Only keep postings whose title contains one of these (case-insensitive).
    /// Falls back to the global keyword list when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title_keywords: Vec<String>,
}

impl ScrapeConfig {
    /// Check that the strategy has the settings it needs.
    pub fn validate(&self) -> Result<(), String> {
        match self.strategy {
            Strategy::Html => {
                let html = self
                    .html
                    .as_ref()
                    .ok_or("html strategy requires an `html` selector block")?;
                if html.item.trim().is_empty() || html.title.trim().is_empty() {
                    return Err("html selectors `item` and `title` are required".into());
                }
                for sel in html.all() {
                    scraper::Selector::parse(sel)
                        .map_err(|_| format!("invalid CSS selector {sel:?}"))?;
                }
            }
            Strategy::JsonApi => {
                let api = self
                    .api
                    .as_ref()
                    .ok_or("json_api strategy requires an `api` path block")?;
                if api.title.trim().is_empty() {
                    return Err("api path `title` is required".into());
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// CSS selectors for the `html` strategy. All but `item` are relative to each item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HtmlSelectors {
    pub item: String,
    pub title: String,
    /// Element whose `href` is the application link. Defaults to the first `a[href]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted: Option<String>,
}

impl HtmlSelectors {
    fn all(&self) -> impl Iterator<Item = &str> {
        [&self.item, &self.title]
            .into_iter()
            .map(|s| s.as_str())
            .chain(
                [
                    &self.link,
                    &self.location,
                    &self.description,
                    &self.salary,
                    &self.duration,
                    &self.posted,
                ]
                .into_iter()
                .filter_map(|s| s.as_deref()),
            )
    }
}

/// Dotted JSON paths for the `json_api` strategy.
///
/// `items_path` locates the array of postings (empty = the root); every other
/// path is relative to one posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiFieldPaths {
    #[serde(default)]
    pub items_path: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Field carrying remote/hybrid/on-site hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrangement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted: Option<String>,
}

impl ApiFieldPaths {
    /// Greenhouse `GET /v1/boards/{board}/jobs?content=true`.
    pub fn greenhouse() -> Self {
        Self {
            items_path: "jobs".into(),
            title: "title".into(),
            url: Some("absolute_url".into()),
            location: Some("location.name".into()),
            description: Some("content".into()),
            posted: Some("updated_at".into()),
            ..Default::default()
        }
    }

    /// Lever `GET /v0/postings/{company}?mode=json`.
    pub fn lever() -> Self {
        Self {
            items_path: String::new(),
            title: "text".into(),
            url: Some("hostedUrl".into()),
            location: Some("categories.location".into()),
            description: Some("descriptionPlain".into()),
            arrangement: Some("workplaceType".into()),
            duration: Some("categories.commitment".into()),
            posted: Some("createdAt".into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_auto() {
        let config: ScrapeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.strategy, Strategy::Auto);
        assert_eq!(config, ScrapeConfig::default());
        assert_eq!(serde_json::to_string(&config).unwrap(), r#"{"strategy":"auto"}"#);
    }

    #[test]
    fn test_html_requires_selectors() {
        let config: ScrapeConfig = serde_json::from_str(r#"{"strategy": "html"}"#).unwrap();
        assert!(config.validate().is_err());

        let config: ScrapeConfig = serde_json::from_str(
            r#"{"strategy": "html", "html": {"item": "li.job", "title": "h3"}}"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let config: ScrapeConfig = serde_json::from_str(
            r#"{"strategy": "html", "html": {"item": "li.job", "title": "h3", "link": "a[["}}"#,
        )
        .unwrap();
        assert!(config.validate().unwrap_err().contains("a[["));
    }

    #[test]
    fn test_json_api_requires_title_path() {
        let config: ScrapeConfig = serde_json::from_str(
            r#"{"strategy": "json_api", "api": {"items_path": "data", "title": ""}}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
