//! Scraper run history commands.

use console::style;

use crate::config::Settings;
use crate::models::{RunStatus, ScraperLog};

use super::{open_database, print_error};

/// Status label padded to `width` before styling, so ANSI codes do not break alignment.
fn styled_status(status: RunStatus, width: usize) -> String {
    let label = format!("{:<width$}", status.as_str(), width = width);
    match status {
        RunStatus::Completed => style(label).green().to_string(),
        RunStatus::Running => style(label).yellow().to_string(),
        RunStatus::Failed => style(label).red().to_string(),
    }
}

fn duration_label(log: &ScraperLog) -> String {
    match log.completed_at {
        Some(done) => format!("{}s", (done - log.started_at).num_seconds()),
        None => "-".to_string(),
    }
}

/// List the most recent runs.
pub async fn cmd_logs(settings: &Settings, limit: i64) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let page = ctx.scraper_logs().list(1, limit.clamp(1, 100)).await?;

    if page.items.is_empty() {
        println!("{} No scraper runs yet", style("!").yellow());
        return Ok(());
    }

    println!(
        "\n{:<6} {:<18} {:<10} {:<10} {:<8} {:<6} {:<6} {:<6} {}",
        style("ID").bold(),
        style("Started").bold(),
        style("Trigger").bold(),
        style("Status").bold(),
        style("Time").bold(),
        style("Found").bold(),
        style("New").bold(),
        style("Upd").bold(),
        style("Errors").bold()
    );
    println!("{}", "-".repeat(90));

    for log in &page.items {
        println!(
            "{:<6} {:<18} {:<10} {} {:<8} {:<6} {:<6} {:<6} {}",
            log.id,
            log.started_at.format("%Y-%m-%d %H:%M"),
            log.trigger.as_str(),
            styled_status(log.status, 10),
            duration_label(log),
            log.jobs_found,
            log.jobs_added,
            log.jobs_updated,
            log.errors.len()
        );
    }

    println!("\nShowing {} of {} runs", page.items.len(), page.total);
    Ok(())
}

/// Show one run with its errors.
pub async fn cmd_log_show(settings: &Settings, id: i32) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let Some(log) = ctx.scraper_logs().get(id).await? else {
        print_error(format!("Run #{} not found", id));
        return Ok(());
    };

    println!("\n{}", style(format!("Scraper run #{}", log.id)).bold());
    println!("{}", "-".repeat(40));
    println!("{:<20} {}", "Status:", styled_status(log.status, 0));
    println!("{:<20} {}", "Trigger:", log.trigger.as_str());
    println!(
        "{:<20} {}",
        "Started:",
        log.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(done) = log.completed_at {
        println!(
            "{:<20} {} ({})",
            "Completed:",
            done.format("%Y-%m-%d %H:%M:%S UTC"),
            duration_label(&log)
        );
    }
    println!("{:<20} {}", "Companies:", log.companies_processed);
    println!("{:<20} {}", "Jobs Found:", log.jobs_found);
    println!("{:<20} {}", "  New:", log.jobs_added);
    println!("{:<20} {}", "  Updated:", log.jobs_updated);
    println!("{:<20} {}", "  Unchanged:", log.jobs_skipped);
    println!("{:<20} {}", "Deactivated:", log.jobs_deactivated);

    if !log.errors.is_empty() {
        println!("\n{}", style("Errors").bold());
        for err in &log.errors {
            println!("  {} {}: {}", style("✗").red(), err.company, err.error);
        }
    }

    Ok(())
}
