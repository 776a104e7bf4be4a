//! Runtime settings.
//!
//! Layered as: built-in defaults, then an optional `config/trivia.{toml,yaml,json}`,
//! then `TRIVIA_*` environment variables (`TRIVIA_SERVER__PORT=5000`). A `.env` file
//! in the working directory is loaded into the environment first.

use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_sources(
            config::File::with_name("config/trivia").required(false),
            config::Environment::with_prefix("TRIVIA")
                .prefix_separator("_")
                .separator("__"),
        )
    }

    fn from_sources(
        file: impl config::Source + Send + Sync + 'static,
        env: impl config::Source + Send + Sync + 'static,
    ) -> anyhow::Result<Self> {
        config::Config::builder()
            .set_default("database.path", "trivia.db")?
            .set_default("database.max_connections", 5)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix("TRIVIA")
            .prefix_separator("_")
            .separator("__")
            .source(Some(source))
    }

    fn no_file() -> impl config::Source + Send + Sync + 'static {
        config::File::with_name("does/not/exist").required(false)
    }

    #[test]
    fn defaults_apply_without_sources() {
        let settings = Settings::from_sources(no_file(), env(&[])).unwrap();
        assert_eq!(settings.database.path, "trivia.db");
        assert_eq!(settings.database.max_connections, 5);
        assert_eq!(settings.server.port, 5000);
        assert_eq!(
            settings.server.addr().unwrap(),
            "127.0.0.1:5000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_sources(
            no_file(),
            env(&[
                ("TRIVIA_SERVER__PORT", "8080"),
                ("TRIVIA_DATABASE__PATH", "/tmp/quiz.db"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.path, "/tmp/quiz.db");
    }

    #[test]
    fn rejects_bad_host() {
        let settings =
            Settings::from_sources(no_file(), env(&[("TRIVIA_SERVER__HOST", "not a host")]))
                .unwrap();
        assert!(settings.server.addr().is_err());
    }
}
