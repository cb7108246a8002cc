use crate::catalog::DemoCatalog;
use crate::router::{ChannelHub, DEFAULT_CHANNEL_CAPACITY, DEFAULT_CLUSTERING_DELAY};
use anyhow::{Context, Result};
use clap::Args;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Port the server listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 3030;

/// All interfaces on [`DEFAULT_PORT`]
pub fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT))
}

/// Runtime settings for the demo server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub clustering_delay: Duration,
    pub channel_capacity: usize,
    /// JSON demo catalog; the built-in catalog is used when unset
    pub catalog_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            bind: default_bind(),
            clustering_delay: DEFAULT_CLUSTERING_DELAY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            catalog_path: None,
        }
    }

    pub fn bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn clustering_delay(mut self, delay: Duration) -> Self {
        self.clustering_delay = delay;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn load_catalog(&self) -> Result<DemoCatalog> {
        match &self.catalog_path {
            Some(path) => DemoCatalog::from_path(path)
                .with_context(|| format!("Failed to load demo catalog from {}", path.display())),
            None => Ok(DemoCatalog::builtin()),
        }
    }

    /// Channel hub wired with this config's catalog and timings
    pub fn build_hub(&self) -> Result<ChannelHub> {
        let catalog = self.load_catalog()?;
        Ok(ChannelHub::new(Arc::new(catalog))
            .with_clustering_delay(self.clustering_delay)
            .with_capacity(self.channel_capacity))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Command-line / environment flags for `serve`
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "QUIZCAST_BIND", default_value_t = default_bind())]
    pub bind: SocketAddr,

    /// Pause before computing clusters so viewers see the processing state
    #[arg(long, env = "QUIZCAST_CLUSTERING_DELAY_MS", default_value_t = DEFAULT_CLUSTERING_DELAY.as_millis() as u64)]
    pub clustering_delay_ms: u64,

    /// Events buffered per subscriber before it has to resync
    #[arg(long, env = "QUIZCAST_CHANNEL_CAPACITY", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Demo catalog JSON file (array of demo definitions)
    #[arg(long, env = "QUIZCAST_CATALOG")]
    pub catalog: Option<PathBuf>,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        let mut config = ServerConfig::new()
            .bind(args.bind)
            .clustering_delay(Duration::from_millis(args.clustering_delay_ms))
            .channel_capacity(args.channel_capacity);
        if let Some(path) = args.catalog {
            config = config.catalog_path(path);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.port(), DEFAULT_PORT);
        assert_eq!(config.clustering_delay, DEFAULT_CLUSTERING_DELAY);
        assert!(config.catalog_path.is_none());
        assert_eq!(config.load_catalog().unwrap().len(), 1);
    }

    #[test]
    fn test_args_into_config() {
        let cli = TestCli::parse_from([
            "quizcast",
            "--bind",
            "127.0.0.1:9000",
            "--clustering-delay-ms",
            "0",
            "--channel-capacity",
            "8",
        ]);
        let config = ServerConfig::from(cli.serve);
        assert_eq!(config.bind, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.clustering_delay, Duration::ZERO);
        assert_eq!(config.channel_capacity, 8);
    }

    #[test]
    fn test_bind_flag_defaults_to_default_port() {
        let cli = TestCli::parse_from(["quizcast"]);
        assert_eq!(cli.serve.bind, default_bind());
        assert_eq!(ServerConfig::from(cli.serve).bind.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_capacity_floor() {
        assert_eq!(ServerConfig::new().channel_capacity(0).channel_capacity, 1);
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = ServerConfig::new().catalog_path("/no/such/catalog.json");
        let err = config.load_catalog().unwrap_err();
        assert!(format!("{:#}", err).contains("/no/such/catalog.json"));
    }
}
