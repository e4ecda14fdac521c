// src/config.rs
use crate::domain::errors::{AppError, AppResult};
use crate::exchange::bybit::BYBIT_BASE_URL;
use crate::exchange::client::ExchangeSettings;
use crate::exchange::gateio::GATEIO_BASE_URL;
use crate::exchange::okx::OKX_BASE_URL;
use clap::Parser;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP front door
    pub server: ServerConfig,

    /// Upstream exchange endpoints and pacing
    pub exchanges: ExchangesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0:8080"
    pub addr: SocketAddr,

    /// Deadline applied to every adapter call a request makes
    pub request_timeout_ms: u64,

    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangesConfig {
    pub okx_base_url: String,
    pub bybit_base_url: String,
    pub gateio_base_url: String,

    /// Minimum spacing between requests to the same exchange
    pub pacing_interval_ms: u64,

    /// Instrument list cache lifetime
    pub pairs_cache_ttl_secs: u64,

    /// Log every upstream response body at debug level
    pub debug_http: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "warn", "error")
    pub level: String,

    /// Append logs to this file instead of stderr
    pub file_path: Option<String>,
}

/// Command line overrides
#[derive(Parser, Debug, Default)]
#[command(name = "spot_gateway", version, about = "Uniform spot market data API over several exchanges")]
pub struct Cli {
    /// Server address to bind
    #[arg(long)]
    pub addr: Option<SocketAddr>,

    /// Path to log file
    #[arg(long = "log-file", alias = "logFile")]
    pub log_file: Option<String>,

    /// JSON config file; environment variables are used when absent
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn env_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let server = ServerConfig {
            addr: env_or("LISTEN_ADDR", defaults.server.addr)?,
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.server.request_timeout_ms)?,
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", defaults.server.shutdown_timeout_ms)?,
        };

        let exchanges = ExchangesConfig {
            okx_base_url: env::var("OKX_BASE_URL").unwrap_or(defaults.exchanges.okx_base_url),
            bybit_base_url: env::var("BYBIT_BASE_URL").unwrap_or(defaults.exchanges.bybit_base_url),
            gateio_base_url: env::var("GATEIO_BASE_URL").unwrap_or(defaults.exchanges.gateio_base_url),
            pacing_interval_ms: env_or("PACING_INTERVAL_MS", defaults.exchanges.pacing_interval_ms)?,
            pairs_cache_ttl_secs: env_or("PAIRS_CACHE_TTL_SECS", defaults.exchanges.pairs_cache_ttl_secs)?,
            debug_http: env_or("HTTP_DEBUG", defaults.exchanges.debug_http)?,
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or(defaults.logging.level),
            file_path: env::var("LOG_FILE_PATH").ok().filter(|p| !p.is_empty()),
        };

        Ok(Config {
            server,
            exchanges,
            logging,
        })
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let mut file = File::open(path).map_err(|e| {
            AppError::Config(format!("Failed to open config file: {}", e))
        })?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> AppResult<()> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            AppError::Config(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, contents).map_err(|e| {
            AppError::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Resolve the effective configuration for a command line.
    pub fn load(cli: &Cli) -> AppResult<Self> {
        let mut config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::from_env()?,
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(addr) = cli.addr {
            self.server.addr = addr;
        }
        if let Some(path) = &cli.log_file {
            self.logging.file_path = Some(path.clone());
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.server.request_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.server.shutdown_timeout_ms)
    }

    fn exchange_settings(&self, base_url: &str) -> ExchangeSettings {
        ExchangeSettings {
            base_url: base_url.to_string(),
            pacing_interval: Duration::from_millis(self.exchanges.pacing_interval_ms),
            pairs_ttl: Duration::from_secs(self.exchanges.pairs_cache_ttl_secs),
            debug: self.exchanges.debug_http,
        }
    }

    pub fn okx(&self) -> ExchangeSettings {
        self.exchange_settings(&self.exchanges.okx_base_url)
    }

    pub fn bybit(&self) -> ExchangeSettings {
        self.exchange_settings(&self.exchanges.bybit_base_url)
    }

    pub fn gateio(&self) -> ExchangeSettings {
        self.exchange_settings(&self.exchanges.gateio_base_url)
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> AppResult<()> {
        let mut builder = env_logger::Builder::new();

        // Set log level
        let log_level = match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        };

        builder.filter_level(log_level);
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        });

        // Configure output
        if let Some(file_path) = &self.logging.file_path {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)
                .map_err(|e| AppError::Config(format!("Failed to open log file {}: {}", file_path, e)))?;

            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        // Initialize the logger
        builder
            .try_init()
            .map_err(|e| AppError::Config(format!("Failed to initialize logger: {}", e)))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
                request_timeout_ms: 10_000,
                shutdown_timeout_ms: 5_000,
            },
            exchanges: ExchangesConfig {
                okx_base_url: OKX_BASE_URL.to_string(),
                bybit_base_url: BYBIT_BASE_URL.to_string(),
                gateio_base_url: GATEIO_BASE_URL.to_string(),
                pacing_interval_ms: 100,
                pairs_cache_ttl_secs: 300,
                debug_http: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_addr_and_log_file() {
        let cli = Cli::parse_from(["spot_gateway", "--addr", "127.0.0.1:9000", "--log-file", "/tmp/gw.log"]);
        let mut config = Config::default();

        config.apply_cli(&cli);

        assert_eq!(config.server.addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.logging.file_path.as_deref(), Some("/tmp/gw.log"));
    }

    #[test]
    fn legacy_log_file_flag_is_accepted() {
        let cli = Cli::parse_from(["spot_gateway", "--logFile", "app.log"]);
        assert_eq!(cli.log_file.as_deref(), Some("app.log"));
    }

    #[test]
    fn defaults_match_upstream_endpoints() {
        let config = Config::default();

        assert_eq!(config.okx().base_url, OKX_BASE_URL);
        assert_eq!(config.gateio().pairs_ttl, Duration::from_secs(300));
        assert_eq!(config.bybit().pacing_interval, Duration::from_millis(100));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn file_round_trip() {
        let path = env::temp_dir().join(format!("spot_gateway_config_{}.json", std::process::id()));
        let mut config = Config::default();
        config.exchanges.pacing_interval_ms = 250;

        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.exchanges.pacing_interval_ms, 250);
        assert_eq!(loaded.server.addr, config.server.addr);
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = Config::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
