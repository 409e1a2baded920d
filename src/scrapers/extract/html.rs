//! CSS-selector extraction for careers pages without structured data.

use scraper::{ElementRef, Html, Selector};

use super::RawPosting;
use crate::scrapers::config::HtmlSelectors;
use crate::scrapers::error::ExtractError;

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::Selector(selector.to_string()))
}

fn parse_optional(selector: &Option<String>) -> Result<Option<Selector>, ExtractError> {
    selector.as_deref().map(parse_selector).transpose()
}

/// Visible text of an element with whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(item: ElementRef<'_>, selector: &Option<Selector>) -> Option<String> {
    let selector = selector.as_ref()?;
    item.select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

pub(super) fn extract(
    selectors: &HtmlSelectors,
    body: &str,
) -> Result<Vec<RawPosting>, ExtractError> {
    let item_sel = parse_selector(&selectors.item)?;
    let title_sel = parse_selector(&selectors.title)?;
    let link_sel = parse_selector(selectors.link.as_deref().unwrap_or("a[href]"))?;
    let location_sel = parse_optional(&selectors.location)?;
    let description_sel = parse_optional(&selectors.description)?;
    let salary_sel = parse_optional(&selectors.salary)?;
    let duration_sel = parse_optional(&selectors.duration)?;
    let posted_sel = parse_optional(&selectors.posted)?;

    let document = Html::parse_document(body);
    let mut postings = Vec::new();

    for item in document.select(&item_sel) {
        let title = match item.select(&title_sel).next().map(element_text) {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };

        // The item itself may be the link (e.g. `a.job-card`).
        let url = item
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .or_else(|| item.value().attr("href"))
            .map(|s| s.trim().to_string());

        let description = description_sel
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .map(|el| el.inner_html());

        let posted = posted_sel
            .as_ref()
            .and_then(|sel| item.select(sel).next())
            .and_then(|el| {
                el.value()
                    .attr("datetime")
                    .map(|s| s.to_string())
                    .or_else(|| Some(element_text(el)))
            })
            .filter(|s| !s.is_empty());

        let location = first_text(item, &location_sel);
        postings.push(RawPosting {
            title,
            url,
            arrangement_hint: location.clone(),
            location,
            description,
            salary_text: first_text(item, &salary_sel),
            duration_text: first_text(item, &duration_sel),
            posted,
            ..Default::default()
        });
    }

    Ok(postings)
}
