//! Contact message inbox.

use console::style;

use crate::cli::helpers::truncate;
use crate::config::Settings;

use super::open_database;

/// Print the most recent contact form submissions.
pub async fn cmd_contacts(settings: &Settings, limit: i64) -> anyhow::Result<()> {
    let ctx = open_database(settings).await?;
    let messages = ctx.contacts().recent(limit.clamp(1, 200)).await?;

    if messages.is_empty() {
        println!("{} No contact messages", style("!").yellow());
        return Ok(());
    }

    for msg in &messages {
        println!(
            "\n{} {} <{}>",
            style(msg.created_at.format("%Y-%m-%d %H:%M")).dim(),
            style(&msg.name).bold(),
            msg.email
        );
        if let Some(ref subject) = msg.subject {
            println!("  {}", style(subject).cyan());
        }
        println!("  {}", truncate(&msg.message.replace('\n', " "), 200));
    }

    println!("\n{} messages", messages.len());
    Ok(())
}
