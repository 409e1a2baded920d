//! Initialize command.

use console::style;

use crate::config::{Config, Settings};
use crate::models::validate_company;

/// Initialize the data directory and database, importing configured companies.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;
    let company_repo = ctx.companies();

    let mut companies_added = 0;
    for seed in &config.companies {
        if company_repo.get_by_name(seed.name.trim()).await?.is_some() {
            continue;
        }
        let company = seed.clone().into_company();
        if let Err((field, message)) = validate_company(&company) {
            println!(
                "  {} Skipped {}: {} ({})",
                style("!").yellow(),
                seed.name,
                message,
                field
            );
            continue;
        }
        company_repo.insert(&company).await?;
        companies_added += 1;
        println!("  {} Added company: {}", style("✓").green(), company.name);
    }

    if config.companies.is_empty() {
        println!(
            "{} No companies configured in internscout.toml",
            style("!").yellow()
        );
        println!("  Add [[companies]] entries or use 'internscout company add'");
    } else if companies_added == 0 {
        println!("  All configured companies are already registered");
    }

    println!(
        "{} Initialized internscout in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
