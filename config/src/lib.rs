mod app_config;
mod args;

pub use app_config::get_config_dir;
pub use args::Args;
use color_eyre::Result;
use eyre::eyre;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    net::{
        IpAddr,
        SocketAddr,
    },
    str::FromStr as _,
};

/// Exporter settings. Layered from the built-in defaults, a YAML config file, `SE_EXPORTER_*`
/// environment variables and the command line, later layers winning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, alias = "HOST")]
    pub host: Option<String>,
    #[serde(alias = "PORT")]
    pub port: u16,
    #[serde(default, alias = "TOKEN", skip_serializing)]
    pub token: Option<String>,
    #[serde(alias = "LISTEN_ADDR")]
    pub listen_addr: IpAddr,
    #[serde(alias = "LISTEN_PORT")]
    pub listen_port: u16,
    #[serde(alias = "LOGLEVEL")]
    pub loglevel: String,
    #[serde(alias = "RUN_ASYNC")]
    pub run_async: bool,
    pub metric_prefix: String,
    pub resources: Vec<String>,
    pub identity_fields: Vec<String>,
    pub excluded_fields: Vec<String>,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    pub fn new(args: &Args) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        builder = match &args.config {
            Some(path) => {
                builder.add_source(config::File::from(path.as_path()).format(config::FileFormat::Yaml).required(true))
            }
            None => builder.add_source(
                config::File::from(get_config_dir().join("config.yaml"))
                    .format(config::FileFormat::Yaml)
                    .required(false),
            ),
        };

        builder = builder
            .add_source(
                config::Environment::with_prefix("SE_EXPORTER")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("resources")
                    .with_list_parse_key("identity_fields")
                    .with_list_parse_key("excluded_fields"),
            )
            .add_source(args.clone());

        builder.build()?.try_deserialize()
    }

    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.listen_port)
    }

    /// The configured log level. `warning` is accepted as an alias for `warn`, case is ignored.
    pub fn log_level(&self) -> Result<tracing::Level> {
        let level = self.loglevel.trim().to_lowercase();
        let level = if level == "warning" { "warn" } else { level.as_str() };
        tracing::Level::from_str(level).map_err(|_| eyre!("Unknown log level {:?}", self.loglevel))
    }
}
