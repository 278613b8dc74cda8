use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "CLIENTS_";

/// Runtime configuration.
///
/// Priority, lowest first: defaults, `config.toml`, `CLIENTS_*` env vars,
/// command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub loglevel: String,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: ":memory:".to_string(),
            listen_addr: "0.0.0.0:8080".to_string(),
            loglevel: "info".to_string(),
            seed_demo_data: true,
        }
    }
}

/// Command-line overrides. Unset flags leave lower layers untouched.
#[derive(Debug, Clone, Default, Parser, Serialize)]
#[command(version, about = "Client registry HTTP service")]
pub struct Cli {
    /// Database DSN, e.g. `:memory:` or `sqlite:clients.db`
    #[arg(long = "dsn")]
    #[serde(rename = "database_url", skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,

    /// HTTP server address
    #[arg(long)]
    #[serde(rename = "listen_addr", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self, RegistryError> {
        Self::figment(cli).extract().map_err(RegistryError::from)
    }

    pub fn figment(cli: &Cli) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(cli))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_overrides() {
        figment::Jail::expect_with(|_jail| {
            let cfg = Config::load(&Cli::default()).expect("load config");
            assert_eq!(cfg, Config::default());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE,
                r#"
                database_url = "sqlite:from_file.db"
                loglevel = "debug"
                "#,
            )?;
            jail.set_env("CLIENTS_DATABASE_URL", "sqlite:from_env.db");
            jail.set_env("CLIENTS_SEED_DEMO_DATA", "false");

            let cfg = Config::load(&Cli::default()).expect("load config");
            assert_eq!(cfg.database_url, "sqlite:from_env.db");
            assert_eq!(cfg.loglevel, "debug");
            assert!(!cfg.seed_demo_data);

            let cli = Cli {
                dsn: Some(":memory:".to_string()),
                address: Some("127.0.0.1:9000".to_string()),
            };
            let cfg = Config::load(&cli).expect("load config");
            assert_eq!(cfg.database_url, ":memory:");
            assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
            Ok(())
        });
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::parse_from(["client-registry", "--dsn", "sqlite:x.db", "--address", ":1"]);
        assert_eq!(cli.dsn.as_deref(), Some("sqlite:x.db"));
        assert_eq!(cli.address.as_deref(), Some(":1"));
    }
}
