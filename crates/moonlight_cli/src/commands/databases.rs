//! Collection catalog commands.

use super::{pretty, Context, Format};
use crate::error::CliResult;
use moonlight_core::{CoreError, SYSTEM_AUTHOR};

/// Creates and registers a collection.
pub fn create(ctx: &Context, name: &str, author: Option<&str>) -> CliResult<String> {
    let registry = ctx.registry()?;
    if let Some(existing) = registry.collection_by_name(name)? {
        return Err(CoreError::already_exists("collection", existing.name).into());
    }

    let store = ctx.open(name, author.unwrap_or(SYSTEM_AUTHOR))?;
    let id = registry
        .collection_by_name(store.name())?
        .map(|info| info.id)
        .ok_or_else(|| CoreError::unknown("collection", store.name()))?;
    Ok(format!("collection `{}` created with id {id}", store.name()))
}

/// Drops a registered collection and forgets it.
pub fn delete(ctx: &Context, name: &str) -> CliResult<String> {
    let registry = ctx.registry()?;
    let info = registry
        .collection_by_name(name)?
        .ok_or_else(|| CoreError::unknown("collection", name))?;

    ctx.open(&info.name, SYSTEM_AUTHOR)?.drop_collection()?;
    Ok(format!("collection `{}` deleted", info.name))
}

/// Lists registered collections.
pub fn list(ctx: &Context, format: Format) -> CliResult<String> {
    let databases = ctx.registry()?.collections()?;
    match format {
        Format::Json => pretty(&databases),
        Format::Text if databases.is_empty() => Ok("no collections".to_string()),
        Format::Text => {
            let width = databases.iter().map(|d| d.name.len()).max().unwrap_or(0);
            let lines: Vec<String> = databases
                .iter()
                .map(|d| {
                    format!(
                        "{:>14}  {:<width$}  {}  {}  {}",
                        d.id, d.name, d.author, d.created_at, d.path
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}
