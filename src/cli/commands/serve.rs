//! Web server command.

use console::style;

use crate::config::Settings;
use crate::scheduler::validate_schedule;
use crate::server::ServeOptions;

/// Start the web server, optionally with the daily scraper schedule.
pub async fn cmd_serve(
    settings: &Settings,
    bind: &str,
    schedule: bool,
    insecure_admin: bool,
) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;
    if schedule {
        validate_schedule(&settings.schedule).map_err(|e| {
            anyhow::anyhow!("Invalid schedule '{}': {:?}", settings.schedule, e)
        })?;
    }

    settings.ensure_directories()?;

    println!("{} Preparing database...", style("→").cyan());
    let ctx = settings.create_db_context();
    match ctx.init_schema().await {
        Ok(()) => {
            println!("  {} Database ready", style("✓").green());
        }
        Err(e) => {
            eprintln!("  {} Schema setup failed: {}", style("✗").red(), e);
            return Err(anyhow::anyhow!("Database setup failed: {}", e));
        }
    }

    if schedule {
        println!(
            "  {} Scraper scheduled with '{}' (UTC)",
            style("✓").green(),
            settings.schedule
        );
    }

    println!(
        "{} Starting internscout server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    let options = ServeOptions {
        schedule,
        insecure_admin,
    };
    crate::server::serve(settings, &host, port, options).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Empty bind address");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), 3030))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_address() {
        assert_eq!(
            parse_bind_address("8080").unwrap(),
            ("127.0.0.1".to_string(), 8080)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0").unwrap(),
            ("0.0.0.0".to_string(), 3030)
        );
        assert_eq!(
            parse_bind_address("0.0.0.0:9000").unwrap(),
            ("0.0.0.0".to_string(), 9000)
        );
        assert!(parse_bind_address("  ").is_err());
    }
}
