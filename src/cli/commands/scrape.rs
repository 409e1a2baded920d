//! Scraper run and stale sweep commands.

use std::sync::Arc;

use chrono::Utc;
use console::style;

use crate::config::Settings;
use crate::ingest::{count_stale, sweep_stale, IngestError, Orchestrator, RunSummary};
use crate::models::{RunStatus, RunTrigger};
use crate::scrapers::HttpClient;

use super::company::find_company;
use super::{open_database, print_error};

/// Run the pipeline once, for every enabled company or the given ones.
pub async fn cmd_scrape(settings: &Settings, companies: &[String]) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;

    let mut ids = Vec::with_capacity(companies.len());
    for key in companies {
        match find_company(&ctx, key).await? {
            Some(company) => ids.push(company.id),
            None => anyhow::bail!("Company '{}' not found", key),
        }
    }

    let client = Arc::new(settings.http_client()?);
    let orchestrator = Orchestrator::new(ctx, client.clone(), settings.pipeline_config());

    if ids.is_empty() {
        println!("{} Scraping enabled companies...", style("→").cyan());
    } else {
        println!("{} Scraping {} companies...", style("→").cyan(), ids.len());
    }

    let result = if ids.is_empty() {
        orchestrator.run(RunTrigger::Cli).await
    } else {
        orchestrator.run_only(RunTrigger::Cli, &ids).await
    };

    match result {
        Ok(summary) => {
            print_summary(&summary);
            print_throttled_domains(&client).await;
            Ok(())
        }
        Err(IngestError::RunInProgress) => {
            print_error("A scraper run is already in progress");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_summary(summary: &RunSummary) {
    let marker = match summary.status {
        RunStatus::Completed => style("✓").green(),
        _ => style("✗").red(),
    };
    println!("{} {}", marker, summary.message());

    let c = &summary.counts;
    println!("{:<20} {}", "  Companies:", c.companies_processed);
    println!("{:<20} {}", "  Scraped OK:", c.companies_updated);
    println!("{:<20} {}", "  Jobs found:", c.jobs_found);
    println!("{:<20} {}", "  New:", c.jobs_added);
    println!("{:<20} {}", "  Updated:", c.jobs_updated);
    println!("{:<20} {}", "  Unchanged:", c.jobs_skipped);
    println!("{:<20} {}", "  Deactivated:", c.jobs_deactivated);

    if !summary.errors.is_empty() {
        println!("\n{}", style("Errors").bold());
        for err in &summary.errors {
            println!("  {} {}: {}", style("✗").red(), err.company, err.error);
        }
    }
    println!("\n  Run log #{}", summary.log_id);
}

/// Mention domains that pushed back with 429/503 during the run.
async fn print_throttled_domains(client: &HttpClient) {
    let mut throttled: Vec<_> = client
        .domain_stats()
        .await
        .into_iter()
        .filter(|(_, stats)| stats.rate_limit_hits > 0)
        .collect();
    if throttled.is_empty() {
        return;
    }
    throttled.sort_by(|a, b| a.0.cmp(&b.0));

    println!("\n{}", style("Rate limited").bold());
    for (domain, stats) in throttled {
        println!(
            "  {} {}: {} of {} requests throttled, delay now {:?}",
            style("!").yellow(),
            domain,
            stats.rate_limit_hits,
            stats.total_requests,
            stats.current_delay
        );
    }
}

/// Deactivate stale jobs, or report how many would be with `dry_run`.
pub async fn cmd_sweep(settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let window = chrono::Duration::days(settings.stale_after_days);
    let now = Utc::now();

    if dry_run {
        let count = count_stale(&ctx.jobs(), window, now).await?;
        println!(
            "{} {} jobs not seen in {} days would be deactivated",
            style("!").yellow(),
            count,
            settings.stale_after_days
        );
        return Ok(());
    }

    let swept = sweep_stale(&ctx.jobs(), window, now).await?;
    println!(
        "{} Deactivated {} jobs not seen in {} days",
        style("✓").green(),
        swept,
        settings.stale_after_days
    );
    Ok(())
}
