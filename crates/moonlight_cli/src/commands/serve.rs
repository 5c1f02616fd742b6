//! `serve` command.

use super::Context;
use crate::error::{CliError, CliResult};
use moonlight_core::Permission;
use moonlight_server::MoonlightServer;

/// Starts the HTTP server and blocks until Ctrl-C.
///
/// Refuses to start without an administrator.
pub fn run(ctx: &Context) -> CliResult<()> {
    let server = prepare(ctx)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(moonlight_server::serve(server))?;
    Ok(())
}

fn prepare(ctx: &Context) -> CliResult<MoonlightServer> {
    let registry = ctx.registry()?;
    let has_admin = registry
        .users()?
        .iter()
        .any(|u| u.permissions == Permission::Administrator);
    if !has_admin {
        return Err(CliError::NoAdministrator);
    }

    let store = ctx.store_config(&registry)?;
    let mut config = moonlight_server::ServerConfig::from_app(&registry.snapshot()?)?;
    if let Some(timeout) = store.lock_timeout {
        config = config.with_lock_timeout(timeout);
    }
    Ok(MoonlightServer::new(config, store, registry))
}
