//! Effective settings display

use std::path::Path;

use autoskip_config::Settings;
use colored::Colorize;

use crate::error::Result;

const MASK: &str = "********";

fn mask(secret: &str) -> &str {
    if secret.is_empty() { "" } else { MASK }
}

/// Display the effective flat settings and the override files in play.
pub fn run_show(config: Option<&Path>, json: bool) -> Result<()> {
    let settings = Settings::load(config)?;
    let flat = settings.flat();

    if json {
        let mut flat_value = serde_json::to_value(flat)?;
        if let Some(account) = flat_value.get_mut("account").and_then(|a| a.as_object_mut()) {
            for secret in ["password", "token"] {
                if let Some(value) = account.get_mut(secret) {
                    let masked = mask(value.as_str().unwrap_or_default());
                    *value = serde_json::Value::String(masked.to_string());
                }
            }
        }
        let output = serde_json::json!({
            "config_file": settings.config_file(),
            "settings": flat_value,
            "override_files": settings.override_files(),
            "overrides": settings.overrides(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "autoskip Settings".bold());
    println!();
    println!(
        "  {:<14} {}",
        "Config:".dimmed(),
        settings.config_file().display()
    );
    println!();

    println!("  {}:", "Account".dimmed());
    println!("    {:<22} {}", "username", flat.account.username);
    println!("    {:<22} {}", "password", mask(&flat.account.password));
    println!("    {:<22} {}", "token", mask(&flat.account.token));
    println!("    {:<22} {}", "servername", flat.account.servername);
    println!();

    println!("  {}:", "Server".dimmed());
    println!("    {:<22} {}", "address", flat.server.address);
    println!("    {:<22} {}", "port", flat.server.port);
    println!("    {:<22} {}", "ssl", flat.server.ssl);
    println!("    {:<22} {}", "ignore-certs", flat.security.ignore_certs);
    println!();

    println!("  {}:", "Skip".dimmed());
    println!("    {:<22} {}", "tags", flat.skip.tags.join(", "));
    println!("    {:<22} {}", "last-chapter", flat.skip.last_chapter);
    println!("    {:<22} {}", "unwatched", flat.skip.unwatched);
    println!(
        "    {:<22} {:?}",
        "first-episode-series", flat.skip.first_episode_series
    );
    println!(
        "    {:<22} {:?}",
        "first-episode-season", flat.skip.first_episode_season
    );
    println!("    {:<22} {}", "custom-cascade", flat.skip.cascade);
    println!(
        "    {:<22} start {} ms, end {} ms",
        "offsets", flat.offsets.start, flat.offsets.end
    );
    println!();

    if settings.override_files().is_empty() {
        println!("  {:<14} {}", "Overrides:".dimmed(), "(none)".dimmed());
    } else {
        println!("  {}:", "Overrides".dimmed());
        for file in settings.override_files() {
            println!("    {} {}", "+".green(), file.display());
        }
    }

    let overrides = settings.overrides();
    let items = overrides.item_keys();
    println!(
        "  {:<14} {} item keys, {} client entries",
        "Merged:".dimmed(),
        items.len(),
        overrides.clients.len()
    );

    Ok(())
}
