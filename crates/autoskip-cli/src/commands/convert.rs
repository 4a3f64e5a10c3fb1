//! Override file key conversion

use std::path::Path;

use autoskip_config::{LibrarySnapshot, Settings};
use colored::Colorize;

use crate::cli::Target;
use crate::error::{CliError, Result};

/// Rewrite every discovered override file into the target namespace.
///
/// Unresolved keys and unreadable files are reported but do not fail the
/// command; a file that could not be saved does.
pub fn run_convert(config: Option<&Path>, to: Target, snapshot: &Path) -> Result<()> {
    let library = LibrarySnapshot::load(snapshot)?;
    let settings = Settings::load(config)?;

    let report = match to {
        Target::Guids => settings.replace_with_guids(&library)?,
        Target::RatingKeys => settings.replace_with_rating_keys(&library)?,
    };

    println!(
        "{} override files to {}",
        "Converted".green().bold(),
        report.target.as_str()
    );
    for file in &report.files {
        if file.skipped {
            println!(
                "  {} {} (unreadable, left unchanged)",
                "-".yellow(),
                file.path.display()
            );
            continue;
        }
        let status = if file.persisted {
            "+".green()
        } else {
            "x".red()
        };
        println!(
            "  {} {} ({} keys rewritten)",
            status,
            file.path.display(),
            file.translated
        );
    }

    let unresolved = report.unresolved();
    if !unresolved.is_empty() {
        println!();
        println!(
            "{} {} keys had no mapping and were kept as-is:",
            "warning:".yellow().bold(),
            unresolved.len()
        );
        for key in unresolved {
            println!("    {} {}", "-".yellow(), key);
        }
    }

    if !report.all_persisted() {
        return Err(CliError::user("one or more override files could not be saved"));
    }
    Ok(())
}
