//! Company registry commands.

use console::style;

use crate::config::Settings;
use crate::models::{validate_company, Company, NewCompany};
use crate::repository::DbContext;
use crate::scrapers::{ScrapeConfig, Strategy};

use crate::cli::helpers::{format_time, truncate};
use super::{open_database, print_error};

/// Arguments of `company add`.
pub struct CompanyInput {
    pub name: String,
    pub careers_url: String,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub strategy: String,
    pub scrape_url: Option<String>,
    pub enabled: bool,
}

/// Look a company up by id, then by name.
pub(super) async fn find_company(ctx: &DbContext, key: &str) -> anyhow::Result<Option<Company>> {
    let repo = ctx.companies();
    if let Some(company) = repo.get(key).await? {
        return Ok(Some(company));
    }
    Ok(repo.get_by_name(key).await?)
}

fn parse_strategy(value: &str) -> anyhow::Result<Strategy> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| anyhow::anyhow!("Unknown strategy '{}'", value))
}

/// List registered companies.
pub async fn cmd_company_list(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let companies = ctx.companies().get_all().await?;

    if companies.is_empty() {
        println!("{} No companies registered", style("!").yellow());
        println!("  Use 'internscout company add' or list them in internscout.toml");
        return Ok(());
    }

    let active_jobs = ctx.jobs().count_active_by_company().await?;

    println!(
        "\n{:<38} {:<24} {:<10} {:<8} {:<6} {}",
        style("ID").bold(),
        style("Name").bold(),
        style("Strategy").bold(),
        style("Enabled").bold(),
        style("Jobs").bold(),
        style("Last Scraped").bold()
    );
    println!("{}", "-".repeat(110));

    for company in &companies {
        let enabled = if company.is_enabled {
            style("yes").green().to_string()
        } else {
            style("no").dim().to_string()
        };
        println!(
            "{:<38} {:<24} {:<10} {:<8} {:<6} {}",
            company.id,
            truncate(&company.name, 24),
            company.scrape_config.strategy.as_str(),
            enabled,
            active_jobs.get(&company.id).copied().unwrap_or(0),
            format_time(company.last_scraped_at)
        );
    }

    println!("\n{} companies", companies.len());
    Ok(())
}

/// Register a company.
pub async fn cmd_company_add(settings: &Settings, input: CompanyInput) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;

    let scrape_config = ScrapeConfig {
        strategy: parse_strategy(&input.strategy)?,
        url: input.scrape_url,
        ..Default::default()
    };
    let company = NewCompany {
        name: input.name,
        careers_url: input.careers_url,
        logo_url: input.logo_url,
        website: input.website,
        industry: input.industry,
        size: input.size,
        is_enabled: Some(input.enabled),
        scrape_config: Some(scrape_config),
    }
    .into_company();

    if let Err((field, message)) = validate_company(&company) {
        anyhow::bail!("Invalid {}: {}", field, message);
    }
    if ctx.companies().get_by_name(&company.name).await?.is_some() {
        anyhow::bail!("A company named '{}' already exists", company.name);
    }

    ctx.companies().insert(&company).await?;
    println!(
        "{} Added company {} ({})",
        style("✓").green(),
        style(&company.name).cyan(),
        company.id
    );
    Ok(())
}

/// Enable or disable a company for scraper runs.
pub async fn cmd_company_set_enabled(
    settings: &Settings,
    key: &str,
    enabled: bool,
) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let Some(company) = find_company(&ctx, key).await? else {
        print_error(format!("Company '{}' not found", key));
        return Ok(());
    };

    ctx.companies().set_enabled(&company.id, enabled).await?;
    let state = if enabled { "Enabled" } else { "Disabled" };
    println!("{} {} {}", style("✓").green(), state, company.name);
    Ok(())
}

/// Delete a company and its jobs.
pub async fn cmd_company_remove(
    settings: &Settings,
    key: &str,
    confirm: bool,
) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let Some(company) = find_company(&ctx, key).await? else {
        print_error(format!("Company '{}' not found", key));
        return Ok(());
    };

    if !confirm {
        println!(
            "{} This will delete '{}' and all of its job listings.",
            style("!").yellow(),
            company.name
        );
        println!("  Use --confirm to proceed.");
        return Ok(());
    }

    ctx.companies().delete(&company.id).await?;
    println!("{} Removed {}", style("✓").green(), company.name);
    Ok(())
}
