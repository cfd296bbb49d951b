use std::time::Duration;

use config::{Environment, File, FileFormat};

const SERVER_ADDRESS: &str = "127.0.0.1:8080";
const REQUEST_TIMEOUT_SECS: u64 = 15;
const MAX_CONNECTIONS: usize = 1_000;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    pub server_address: String,
    pub request_timeout_secs: u64,
    pub max_connections: usize,
}

impl Config {
    /// Defaults, overridden by `contacts.toml` and then `CONTACTS_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        Self::builder()?
            .add_source(File::new("contacts", FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix("CONTACTS"))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    fn builder() -> anyhow::Result<::config::ConfigBuilder<::config::builder::DefaultState>> {
        Ok(::config::Config::builder()
            .set_default("server_address", SERVER_ADDRESS)?
            .set_default("request_timeout_secs", REQUEST_TIMEOUT_SECS)?
            .set_default("max_connections", MAX_CONNECTIONS as u64)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
