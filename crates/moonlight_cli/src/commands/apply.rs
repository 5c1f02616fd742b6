//! `apply` command: parse a Moonfile and apply it.

use super::Context;
use crate::error::{CliError, CliResult};
use crate::moonfile::Moonfile;
use std::path::Path;

/// Runs the apply command.
///
/// Parse errors abort before anything is written, unless `force` is set,
/// in which case the offending lines are skipped.
pub fn run(ctx: &Context, path: &Path, force: bool) -> CliResult<String> {
    let moonfile = Moonfile::load(path)?;
    let mut lines: Vec<String> = moonfile.diagnostics.iter().map(ToString::to_string).collect();

    if moonfile.has_errors() && !force {
        lines.push(format!("{} not applied; fix the errors or pass --force", path.display()));
        return Err(CliError::InvalidArgument(lines.join("\n")));
    }

    let report = moonfile.compile(ctx)?;
    lines.extend(report.diagnostics.iter().map(ToString::to_string));
    if report.applied {
        lines.push(format!(
            "applied {}: {} user(s), {} collection(s) created",
            path.display(),
            report.users.len(),
            report.databases.len()
        ));
    }
    Ok(lines.join("\n"))
}
