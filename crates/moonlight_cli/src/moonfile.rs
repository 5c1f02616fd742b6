//! Moonfile: line-oriented application setup.
//!
//! ```text
//! ? comment
//! PURE
//! APP 0.0.0.0:8080
//! LOG info, error
//! CREATE_USER administrator root secret
//! DATABASE users @root
//! ```
//!
//! Each non-blank line is `COMMAND args...`; commands are case-insensitive.
//! Parsing never fails: problems are collected as [`Diagnostic`]s and the
//! offending line is skipped. [`Moonfile::compile`] applies what was parsed.

use crate::commands::Context;
use crate::error::CliResult;
use moonlight_core::{CoreError, LogLevel, Permission, DEFAULT_PORT, SYSTEM_AUTHOR};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Default file name.
pub const MOONFILE: &str = "Moonfile";

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The line was applied with a fallback.
    Warning,
    /// The line was skipped.
    Error,
}

/// A problem found while parsing or compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line number, 0 for compile-time problems.
    pub line: usize,
    /// Severity.
    pub severity: Severity,
    /// Description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        if self.line == 0 {
            write!(f, "{label}: {}", self.message)
        } else {
            write!(f, "{label} (line {}): {}", self.line, self.message)
        }
    }
}

/// A `CREATE_USER` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDecl {
    /// Login name.
    pub username: String,
    /// Plain password, hashed on compile.
    pub password: String,
    /// Access level.
    pub permissions: Permission,
}

/// A `DATABASE` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseDecl {
    /// Collection name.
    pub name: String,
    /// Recorded author.
    pub author: String,
}

/// Parsed Moonfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Moonfile {
    /// Reset the configuration before applying.
    pub pure: bool,
    /// Skip compilation entirely.
    pub ignore: bool,
    /// Host and port from `APP`.
    pub app: Option<(String, u16)>,
    /// Levels from `LOG`.
    pub loggers: Option<Vec<LogLevel>>,
    /// Declared users, in order.
    pub users: Vec<UserDecl>,
    /// Declared collections, in order.
    pub databases: Vec<DatabaseDecl>,
    /// Problems found while parsing.
    pub diagnostics: Vec<Diagnostic>,
}

/// What [`Moonfile::compile`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    /// False when `IGNORE` was set.
    pub applied: bool,
    /// Users created.
    pub users: Vec<String>,
    /// Collections created.
    pub databases: Vec<String>,
    /// Problems found while applying.
    pub diagnostics: Vec<Diagnostic>,
}

impl Moonfile {
    /// Reads and parses `path`.
    pub fn load(path: &Path) -> CliResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(&source))
    }

    /// Parses Moonfile source.
    pub fn parse(source: &str) -> Self {
        let mut file = Self::default();
        for (index, line) in source.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            file.parse_line(index + 1, &command.to_ascii_uppercase(), args);
        }
        file
    }

    fn parse_line(&mut self, line: usize, command: &str, args: &[&str]) {
        match command {
            "?" => {}
            "PURE" => self.pure = true,
            "IGNORE" => self.ignore = true,
            "APP" => self.parse_app(line, args),
            "LOG" => self.parse_log(line, args),
            "CREATE_USER" => self.parse_user(line, args),
            "DATABASE" => self.parse_database(line, args),
            "MQ" => self.warn(line, "message queues are not supported, line ignored"),
            other => self.warn(line, format!("unknown command `{other}`, line ignored")),
        }
    }

    fn parse_app(&mut self, line: usize, args: &[&str]) {
        let Some(address) = args.first() else {
            return self.error(line, format!("APP needs a host (port defaults to {DEFAULT_PORT})"));
        };

        let parts: Vec<&str> = address.split(':').filter(|p| !p.is_empty()).collect();
        let Some(host) = parts.first() else {
            return self.error(line, "APP needs a host");
        };

        let port = match parts.get(1) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => port,
                Err(_) => return self.error(line, format!("invalid port `{raw}`")),
            },
            None => {
                self.warn(line, format!("no port given, using {DEFAULT_PORT}"));
                DEFAULT_PORT
            }
        };
        self.app = Some(((*host).to_string(), port));
    }

    fn parse_log(&mut self, line: usize, args: &[&str]) {
        if args.is_empty() {
            return self.error(line, "LOG needs at least one level");
        }

        let mut levels = Vec::with_capacity(args.len());
        for arg in args {
            let name: String = arg.chars().filter(|c| c.is_alphabetic()).collect();
            match name.parse::<LogLevel>() {
                Ok(level) if !levels.contains(&level) => levels.push(level),
                Ok(_) => {}
                Err(_) => {
                    return self.error(
                        line,
                        format!("unknown log level `{name}` (expected info, success, warning, error)"),
                    )
                }
            }
        }
        self.loggers = Some(levels);
    }

    fn parse_user(&mut self, line: usize, args: &[&str]) {
        let [permissions, username, password, ..] = args else {
            return self.error(
                line,
                format!("CREATE_USER needs permissions, username and password, got {} argument(s)", args.len()),
            );
        };

        match permissions.parse::<Permission>() {
            Ok(permissions) => self.users.push(UserDecl {
                username: (*username).to_string(),
                password: (*password).to_string(),
                permissions,
            }),
            Err(e) => self.error(line, e),
        }
    }

    fn parse_database(&mut self, line: usize, args: &[&str]) {
        let Some((name, rest)) = args.split_first() else {
            return self.error(line, format!("DATABASE needs a name (author defaults to {SYSTEM_AUTHOR})"));
        };

        let author = match rest.first() {
            None => SYSTEM_AUTHOR.to_string(),
            Some(author) => match author.strip_prefix('@') {
                Some(user) if self.users.iter().any(|u| u.username == user) => user.to_string(),
                Some(user) => {
                    return self.error(line, format!("user `{user}` is not declared before this line"))
                }
                None => (*author).to_string(),
            },
        };

        self.databases.push(DatabaseDecl {
            name: (*name).to_string(),
            author,
        });
    }

    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            line,
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    fn error(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            line,
            severity: Severity::Error,
            message: message.into(),
        });
    }

    /// Returns true if any parse diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Applies the parsed settings: configuration first, then users, then
    /// collections.
    ///
    /// Existing users and collections are reported and skipped.
    pub fn compile(&self, ctx: &Context) -> CliResult<CompileReport> {
        let mut report = CompileReport::default();
        if self.ignore {
            report.diagnostics.push(Diagnostic {
                line: 0,
                severity: Severity::Warning,
                message: "IGNORE set, nothing applied".to_string(),
            });
            return Ok(report);
        }

        let registry = ctx.registry()?;
        if self.pure {
            registry.reset()?;
        }

        if self.app.is_some() || self.loggers.is_some() {
            registry.update(|config| {
                if let Some((host, port)) = &self.app {
                    config.host = host.clone();
                    config.port = *port;
                }
                if let Some(loggers) = &self.loggers {
                    config.need_logs = true;
                    config.loggers = loggers.clone();
                }
                Ok(())
            })?;
        }

        for user in &self.users {
            match registry.create_user(&user.username, &user.password, user.permissions) {
                Ok(_) => report.users.push(user.username.clone()),
                Err(e @ CoreError::AlreadyExists { .. }) => report.diagnostics.push(Diagnostic {
                    line: 0,
                    severity: Severity::Warning,
                    message: e.to_string(),
                }),
                Err(e) => return Err(e.into()),
            }
        }

        for database in &self.databases {
            if registry.collection_by_name(&database.name)?.is_some() {
                report.diagnostics.push(Diagnostic {
                    line: 0,
                    severity: Severity::Warning,
                    message: format!("collection already exists: {}", database.name),
                });
                continue;
            }
            let store = ctx.open(&database.name, &database.author)?;
            report.databases.push(store.name().to_string());
        }

        report.applied = true;
        for diagnostic in &report.diagnostics {
            warn!(%diagnostic, "moonfile");
        }
        info!(
            users = report.users.len(),
            databases = report.databases.len(),
            "moonfile applied"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
? demo setup
pure
APP 0.0.0.0:8080
LOG info, Error!
CREATE_USER admin root secret
CREATE_USER viewer ann pw
DATABASE users @root
DATABASE logs
";

    #[test]
    fn parses_sample() {
        let file = Moonfile::parse(SAMPLE);
        assert!(file.pure);
        assert!(!file.ignore);
        assert_eq!(file.app, Some(("0.0.0.0".to_string(), 8080)));
        assert_eq!(file.loggers, Some(vec![LogLevel::Info, LogLevel::Error]));
        assert_eq!(file.users.len(), 2);
        assert_eq!(file.users[0].permissions, Permission::Administrator);
        assert_eq!(file.databases[0].author, "root");
        assert_eq!(file.databases[1].author, SYSTEM_AUTHOR);
        assert!(file.diagnostics.is_empty());
    }

    #[test]
    fn reports_problems_per_line() {
        let file = Moonfile::parse("APP localhost\nLOG info trace\nCREATE_USER editor bob\nDATABASE x @ghost\nMQ jobs\nFROB\n");

        assert_eq!(file.app, Some(("localhost".to_string(), DEFAULT_PORT)));
        assert_eq!(file.loggers, None);
        assert!(file.users.is_empty());
        assert!(file.databases.is_empty());
        assert!(file.has_errors());

        let lines: Vec<(usize, Severity)> = file
            .diagnostics
            .iter()
            .map(|d| (d.line, d.severity))
            .collect();
        assert_eq!(
            lines,
            vec![
                (1, Severity::Warning),
                (2, Severity::Error),
                (3, Severity::Error),
                (4, Severity::Error),
                (5, Severity::Warning),
                (6, Severity::Warning),
            ]
        );
        assert!(file.diagnostics[5].to_string().contains("FROB"));
    }

    #[test]
    fn compiles_into_registry() {
        let temp = tempdir().unwrap();
        let ctx = Context::new(temp.path());

        let report = Moonfile::parse(SAMPLE).compile(&ctx).unwrap();
        assert!(report.applied);
        assert_eq!(report.users, vec!["root", "ann"]);
        assert_eq!(report.databases, vec!["users", "logs"]);

        let registry = ctx.registry().unwrap();
        let config = registry.snapshot().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.loggers, vec![LogLevel::Info, LogLevel::Error]);
        let users = registry.collection_by_name("users").unwrap().unwrap();
        assert_eq!(users.author, "root");

        // Re-applying without PURE skips what exists.
        let again = Moonfile::parse("CREATE_USER viewer ann pw\nDATABASE users\n")
            .compile(&ctx)
            .unwrap();
        assert!(again.users.is_empty());
        assert!(again.databases.is_empty());
        assert_eq!(again.diagnostics.len(), 2);
    }

    #[test]
    fn ignore_skips_compilation() {
        let temp = tempdir().unwrap();
        let ctx = Context::new(temp.path());

        let report = Moonfile::parse("IGNORE\nCREATE_USER admin root pw\n")
            .compile(&ctx)
            .unwrap();
        assert!(!report.applied);
        assert!(!temp.path().join("config.json").exists());
    }
}
