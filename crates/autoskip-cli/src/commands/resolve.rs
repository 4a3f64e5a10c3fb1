//! Per-item section resolution

use std::path::Path;

use autoskip_config::{LibrarySnapshot, MediaServer, ScopeChain, Section, Settings};
use colored::Colorize;

use crate::error::{CliError, Result};

/// Resolve one override section for an item and print it as JSON.
///
/// The scope chain comes from `chain` verbatim when given, otherwise from
/// the library snapshot's view of the item's parents.
pub fn run_resolve(
    config: Option<&Path>,
    item: &str,
    section: &str,
    snapshot: Option<&Path>,
    chain: Option<Vec<String>>,
) -> Result<()> {
    let section: Section = section.parse()?;
    let chain = match (chain, snapshot) {
        (Some(keys), _) => ScopeChain::new(keys),
        (None, Some(path)) => LibrarySnapshot::load(path)?.scope_chain(item)?,
        (None, None) => {
            return Err(CliError::user(
                "either --snapshot or --chain is required to build the scope chain",
            ));
        }
    };
    if chain.is_empty() {
        return Err(CliError::user("scope chain is empty"));
    }

    let settings = Settings::load(config)?;
    let resolver = settings.resolver();
    tracing::debug!(
        section = %section,
        chain = ?chain.iter().collect::<Vec<_>>(),
        cascade = resolver.is_cascading(),
        "Resolving section"
    );

    let value = resolver.resolve(section, &chain)?;
    eprintln!(
        "{} {} for {} ({})",
        "Resolved".green(),
        section.as_str().bold(),
        chain.most_specific().unwrap_or(item).cyan(),
        if resolver.is_cascading() { "cascade" } else { "first match" }
    );
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
