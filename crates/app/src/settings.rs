//! Settings for the application, read from `settings.toml` in the working
//! directory and overridden by `SPLITLEDGER__SECTION__KEY` environment
//! variables.
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [server]
//! port = 3000
//! jwt_secret = "change-me"
//! database = { sqlite = "splitledger.db" }
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

fn default_level() -> String {
    String::from("info")
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub jwt_secret: String,
    /// Upper bound on the membership lookup run when a socket connects.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("SPLITLEDGER").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn sqlite_database_and_defaults() {
        let settings = parse(
            r#"
            [server]
            port = 3000
            jwt_secret = "s"
            database = { sqlite = "ledger.db" }
            "#,
        )
        .unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.connect_timeout_ms, 5_000);
        assert!(matches!(settings.server.database, Database::Sqlite(ref p) if p == "ledger.db"));
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [app]
            level = "debug"
            [server]
            bind = "0.0.0.0"
            port = 8080
            jwt_secret = "s"
            database = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.bind.as_deref(), Some("0.0.0.0"));
        assert!(matches!(settings.server.database, Database::Memory));
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert!(
            parse(
                r#"
                [server]
                port = 3000
                database = "memory"
                "#
            )
            .is_err()
        );
    }
}
