//! `configure` command.

use super::{pretty, Context};
use crate::error::CliResult;
use moonlight_core::LogLevel;

/// Arguments of `configure`. Unset values keep their current setting.
#[derive(Debug, Clone, Default)]
pub struct ConfigureArgs {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
    /// Collection log levels. An empty list disables collection logs.
    pub loggers: Option<Vec<LogLevel>>,
    /// Reset everything to defaults first.
    pub reset: bool,
}

/// Runs the configure command and returns the resulting settings.
pub fn run(ctx: &Context, args: ConfigureArgs) -> CliResult<String> {
    let registry = ctx.registry()?;
    if args.reset {
        registry.reset()?;
    }

    registry.update(|config| {
        if let Some(host) = args.host {
            config.host = host;
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        if let Some(loggers) = args.loggers {
            config.need_logs = !loggers.is_empty();
            config.loggers = loggers;
        }
        Ok(())
    })?;

    let config = registry.snapshot()?;
    let levels: Vec<&str> = config.loggers.iter().map(LogLevel::label).collect();
    let logs = if config.need_logs {
        levels.join(", ")
    } else {
        "disabled".to_string()
    };
    tracing::info!(host = %config.host, port = config.port, "application configured");

    Ok(format!(
        "host: {}\nport: {}\nlogs: {logs}",
        config.host, config.port
    ))
}

/// Prints the current settings as JSON.
pub fn show(ctx: &Context) -> CliResult<String> {
    let config = ctx.registry()?.snapshot()?;
    pretty(&serde_json::json!({
        "host": config.host,
        "port": config.port,
        "need_logs": config.need_logs,
        "loggers": config.loggers,
        "users": config.users.len(),
        "databases": config.databases.len(),
    }))
}
