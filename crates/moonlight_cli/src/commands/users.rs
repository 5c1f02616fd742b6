//! User management commands.

use super::{pretty, Context, Format};
use crate::error::CliResult;
use moonlight_core::Permission;
use serde_json::json;

/// Registers a user.
pub fn create(ctx: &Context, username: &str, password: &str, permissions: Permission) -> CliResult<String> {
    let user = ctx.registry()?.create_user(username, password, permissions)?;
    Ok(format!("user `{}` created ({})", user.username, user.permissions))
}

/// Removes a user.
pub fn delete(ctx: &Context, username: &str) -> CliResult<String> {
    ctx.registry()?.delete_user(username)?;
    Ok(format!("user `{username}` deleted"))
}

/// Lists users. Password hashes are never printed.
pub fn list(ctx: &Context, format: Format) -> CliResult<String> {
    let users = ctx.registry()?.users()?;
    match format {
        Format::Json => {
            let rows: Vec<_> = users
                .iter()
                .map(|u| json!({ "username": u.username, "permissions": u.permissions }))
                .collect();
            pretty(&rows)
        }
        Format::Text if users.is_empty() => Ok("no users".to_string()),
        Format::Text => {
            let width = users.iter().map(|u| u.username.len()).max().unwrap_or(0);
            let lines: Vec<String> = users
                .iter()
                .map(|u| format!("{:<width$}  {}", u.username, u.permissions))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn user_commands() {
        let temp = tempdir().unwrap();
        let ctx = Context::new(temp.path());
        assert_eq!(list(&ctx, Format::Text).unwrap(), "no users");

        create(&ctx, "root", "secret", Permission::Administrator).unwrap();
        create(&ctx, "ann", "pw", Permission::Viewer).unwrap();
        assert!(create(&ctx, "ann", "pw", Permission::Viewer).is_err());

        let text = list(&ctx, Format::Text).unwrap();
        assert!(text.contains("root  administrator"));
        assert!(!text.contains("secret"));

        let json = list(&ctx, Format::Json).unwrap();
        assert!(json.contains("\"viewer\""));
        assert!(!json.contains("password"));

        delete(&ctx, "ann").unwrap();
        assert!(delete(&ctx, "root").is_err());
    }
}
