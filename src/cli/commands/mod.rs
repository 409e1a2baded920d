//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod company;
mod contacts;
mod init;
mod logs;
mod scrape;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use crate::config::{load_settings_with_options, LoadOptions, Settings};
use crate::repository::DbContext;

#[derive(Parser)]
#[command(name = "internscout")]
#[command(about = "Internship listing scraper and job board backend")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing internscout.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database, importing configured companies
    Init,

    /// Manage the company registry
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },

    /// Run the scraper pipeline once
    Scrape {
        /// Only scrape these companies (id or name; may be repeated)
        #[arg(long = "company", short = 'C')]
        companies: Vec<String>,
    },

    /// Deactivate jobs no scrape has seen within the staleness window
    Sweep {
        /// Only report how many jobs would be deactivated
        #[arg(long)]
        dry_run: bool,
    },

    /// Show recent scraper runs, or the details of one
    Logs {
        /// Run id to show in full
        id: Option<i32>,
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },

    /// Show recent contact form messages
    Contacts {
        /// Number of messages to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Start the HTTP API server and the daily scheduler
    Serve {
        /// Address to bind to (port, host, or host:port)
        bind: Option<String>,
        /// Do not schedule daily scraper runs
        #[arg(long)]
        no_schedule: bool,
        /// Serve admin routes without authentication when no token is configured
        #[arg(long)]
        insecure_admin: bool,
    },
}

#[derive(Subcommand)]
enum CompanyCommands {
    /// List registered companies
    List,
    /// Register a company
    Add {
        /// Display name
        name: String,
        /// Careers page URL
        careers_url: String,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
        #[arg(long)]
        industry: Option<String>,
        #[arg(long)]
        size: Option<String>,
        /// Extraction strategy: auto, json_ld, html, json_api, greenhouse, lever
        #[arg(long, default_value = "auto")]
        strategy: String,
        /// Fetch this URL instead of the careers page (e.g. an ATS API endpoint)
        #[arg(long)]
        scrape_url: Option<String>,
        /// Register the company without scraping it
        #[arg(long)]
        disabled: bool,
    },
    /// Include a company in scraper runs
    Enable {
        /// Company id or name
        company: String,
    },
    /// Exclude a company from scraper runs
    Disable {
        /// Company id or name
        company: String,
    },
    /// Delete a company and all of its jobs
    Remove {
        /// Company id or name
        company: String,
        /// Skip confirmation prompt
        #[arg(long)]
        confirm: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        data: cli.target,
    };
    let (settings, config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::Company { command } => match command {
            CompanyCommands::List => company::cmd_company_list(&settings).await,
            CompanyCommands::Add {
                name,
                careers_url,
                website,
                logo_url,
                industry,
                size,
                strategy,
                scrape_url,
                disabled,
            } => {
                let input = company::CompanyInput {
                    name,
                    careers_url,
                    website,
                    logo_url,
                    industry,
                    size,
                    strategy,
                    scrape_url,
                    enabled: !disabled,
                };
                company::cmd_company_add(&settings, input).await
            }
            CompanyCommands::Enable { company } => {
                company::cmd_company_set_enabled(&settings, &company, true).await
            }
            CompanyCommands::Disable { company } => {
                company::cmd_company_set_enabled(&settings, &company, false).await
            }
            CompanyCommands::Remove { company, confirm } => {
                company::cmd_company_remove(&settings, &company, confirm).await
            }
        },
        Commands::Scrape { companies } => scrape::cmd_scrape(&settings, &companies).await,
        Commands::Sweep { dry_run } => scrape::cmd_sweep(&settings, dry_run).await,
        Commands::Logs { id, limit } => match id {
            Some(id) => logs::cmd_log_show(&settings, id).await,
            None => logs::cmd_logs(&settings, limit).await,
        },
        Commands::Contacts { limit } => contacts::cmd_contacts(&settings, limit).await,
        Commands::Serve {
            bind,
            no_schedule,
            insecure_admin,
        } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            serve::cmd_serve(&settings, &bind, !no_schedule, insecure_admin).await
        }
    }
}

/// Open the database, failing with a hint if `init` has not been run.
async fn open_database(settings: &Settings) -> anyhow::Result<DbContext> {
    if !settings.database_exists() {
        anyhow::bail!(
            "No database at {}. Run 'internscout init' first.",
            settings.database_path().display()
        );
    }
    let ctx = settings.create_db_context();
    // Keeps older databases current with new tables and indexes.
    ctx.init_schema().await?;
    Ok(ctx)
}

/// Print a failure line in the house style.
fn print_error(message: impl std::fmt::Display) {
    eprintln!("{} {}", style("✗").red(), message);
}
