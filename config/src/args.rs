use clap::Parser;
use std::{
    net::IpAddr,
    path::PathBuf,
};

/// Prometheus exporter for Space Engineers Dedicated Server
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "se-exporter", author, version, about, long_about = None, disable_help_flag = true)]
pub struct Args {
    /// Space Engineers Server (API) host
    #[arg(short = 'h', long, value_name = "HOST")]
    pub host: Option<String>,

    /// SE Remote API port. Default: 8080
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// SE Remote API secret key
    #[arg(short, long, value_name = "KEY")]
    pub token: Option<String>,

    /// Address on which to expose metrics. Default: 0.0.0.0
    #[arg(long, value_name = "ADDR")]
    pub listen_addr: Option<IpAddr>,

    /// Port on which to expose metrics. Default: 9122
    #[arg(long, value_name = "PORT")]
    pub listen_port: Option<u16>,

    /// Path to the config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Collect metrics from all resources at once. It works much faster, but if your server
    /// doesn't have good performance don't use this feature.
    #[arg(short = 'a', long, action)]
    pub run_async: bool,

    /// Log level. Default: info
    #[arg(long, value_name = "debug/info/warning/error")]
    pub loglevel: Option<String>,

    /// Show this help message
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(host) = &self.host {
                cache.insert("host".to_string(), host.clone().into());
            }
            if let Some(port) = self.port {
                cache.insert("port".to_string(), (port as u64).into());
            }
            if let Some(token) = &self.token {
                cache.insert("token".to_string(), token.clone().into());
            }
            if let Some(listen_addr) = self.listen_addr {
                cache.insert("listen_addr".to_string(), listen_addr.to_string().into());
            }
            if let Some(listen_port) = self.listen_port {
                cache.insert("listen_port".to_string(), (listen_port as u64).into());
            }
            if let Some(loglevel) = &self.loglevel {
                cache.insert("loglevel".to_string(), loglevel.clone().into());
            }
            if self.run_async {
                cache.insert("run_async".to_string(), true.into());
            }
            Ok(cache)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use config::Source as _;

    #[test]
    fn short_h_is_host() {
        let args = Args::parse_from(["se-exporter", "-h", "10.0.0.5", "-p", "9000", "-t", "a2V5", "-a"]);
        assert_eq!(args.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.token.as_deref(), Some("a2V5"));
        assert!(args.run_async);
    }

    #[test]
    fn only_given_args_are_collected() {
        let args = Args::parse_from(["se-exporter", "--listen-port", "9200"]);
        let collected = args.collect().unwrap();
        assert_eq!(collected.len(), 1);
        assert!(collected.contains_key("listen_port"));
    }
}
