//! Company models: the registry of career pages the scraper visits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scrapers::ScrapeConfig;

/// A company whose careers page is scraped for internship postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub careers_url: String,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub is_enabled: bool,
    /// How postings are extracted from the careers page.
    pub scrape_config: ScrapeConfig,
    /// When the last successful scrape of this company finished.
    pub last_scraped_at: Option<DateTime<Utc>>,
    /// Postings found by the last successful scrape.
    pub last_jobs_found: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Create a new enabled company with a fresh id.
    pub fn new(name: String, careers_url: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            logo_url: None,
            website: None,
            careers_url,
            industry: None,
            size: None,
            is_enabled: true,
            scrape_config: ScrapeConfig::default(),
            last_scraped_at: None,
            last_jobs_found: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// URL the fetcher should request: the config override or the careers page.
    pub fn fetch_url(&self) -> &str {
        self.scrape_config
            .url
            .as_deref()
            .unwrap_or(&self.careers_url)
    }
}

/// Fields accepted when creating a company.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub careers_url: String,
    pub logo_url: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub is_enabled: Option<bool>,
    pub scrape_config: Option<ScrapeConfig>,
}

impl NewCompany {
    pub fn into_company(self) -> Company {
        let mut company = Company::new(self.name.trim().to_string(), self.careers_url);
        company.logo_url = self.logo_url;
        company.website = self.website;
        company.industry = self.industry;
        company.size = self.size;
        company.is_enabled = self.is_enabled.unwrap_or(true);
        if let Some(config) = self.scrape_config {
            company.scrape_config = config;
        }
        company
    }
}

/// Partial update of a company; `None` leaves a field untouched.
///
/// Nullable fields use `Option<Option<_>>` so that an explicit `null`
/// clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub careers_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub industry: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub size: Option<Option<String>>,
    pub is_enabled: Option<bool>,
    pub scrape_config: Option<ScrapeConfig>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl CompanyPatch {
    /// Apply this patch to a company, bumping `updated_at`.
    pub fn apply(self, company: &mut Company) {
        if let Some(name) = self.name {
            company.name = name;
        }
        if let Some(url) = self.careers_url {
            company.careers_url = url;
        }
        if let Some(v) = self.logo_url {
            company.logo_url = v;
        }
        if let Some(v) = self.website {
            company.website = v;
        }
        if let Some(v) = self.industry {
            company.industry = v;
        }
        if let Some(v) = self.size {
            company.size = v;
        }
        if let Some(enabled) = self.is_enabled {
            company.is_enabled = enabled;
        }
        if let Some(config) = self.scrape_config {
            company.scrape_config = config;
        }
        company.updated_at = Utc::now();
    }
}

/// Validate the user-editable fields of a company.
///
/// Returns the name of the offending field and a message.
pub fn validate_company(company: &Company) -> Result<(), (&'static str, String)> {
    if company.name.trim().is_empty() {
        return Err(("name", "Company name is required".to_string()));
    }
    if !is_http_url(&company.careers_url) {
        return Err((
            "careers_url",
            "Careers URL must be an absolute http(s) URL".to_string(),
        ));
    }
    if let Some(ref website) = company.website {
        if !is_http_url(website) {
            return Err(("website", "Website must be an http(s) URL".to_string()));
        }
    }
    if let Some(ref logo) = company.logo_url {
        if !is_http_url(logo) {
            return Err(("logo_url", "Logo URL must be an http(s) URL".to_string()));
        }
    }
    if let Some(ref url) = company.scrape_config.url {
        if !is_http_url(url) {
            return Err((
                "scrape_config",
                "Scrape URL override must be an http(s) URL".to_string(),
            ));
        }
    }
    company
        .scrape_config
        .validate()
        .map_err(|e| ("scrape_config", e))
}

fn is_http_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
