use std::fs::read_to_string;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde::Deserialize;

use crate::server::Options;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Server {
    ///
    /// bind address
    ///
    #[serde(default = "Server::bind")]
    pub bind: IpAddr,
    ///
    /// listen port, `0` picks a free one
    ///
    #[serde(default = "Server::port")]
    pub port: u16,
    ///
    /// idle timeout in milliseconds
    ///
    /// A connection that sends nothing for this long is closed and
    /// announced as disconnected due to inactivity.
    ///
    #[serde(default = "Server::timeout")]
    pub timeout: u64,
    ///
    /// how long shutdown waits for connections, in milliseconds
    ///
    #[serde(default = "Server::shutdown_grace")]
    pub shutdown_grace: u64,
    ///
    /// directories served to plain http requests, searched in order
    ///
    #[serde(default = "Server::public_dirs")]
    pub public_dirs: Vec<PathBuf>,
}

impl Server {
    fn bind() -> IpAddr {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    }

    fn port() -> u16 {
        3210
    }

    fn timeout() -> u64 {
        30000
    }

    fn shutdown_grace() -> u64 {
        2000
    }

    fn public_dirs() -> Vec<PathBuf> {
        vec![PathBuf::from("public"), PathBuf::from("client/public")]
    }

    #[inline]
    pub fn listen(&self) -> SocketAddr { SocketAddr::new(self.bind, self.port) }
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: Self::bind(),
            port: Self::port(),
            timeout: Self::timeout(),
            shutdown_grace: Self::shutdown_grace(),
            public_dirs: Self::public_dirs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Journal {
    ///
    /// journal directory, no journal file is written when unset
    ///
    #[serde(default = "Journal::dir")]
    pub dir: Option<PathBuf>,
}

impl Journal {
    fn dir() -> Option<PathBuf> {
        Some(PathBuf::from("logs"))
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self { dir: Self::dir() }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => return Err(format!("unknown log level: {value}")),
        })
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_level_filter(&self) -> log::LevelFilter {
        match *self {
            Self::Error => log::LevelFilter::Error,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Log {
    ///
    /// log level
    ///
    /// `RUST_LOG` still applies on top of it.
    ///
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub journal: Journal,
    #[serde(default)]
    pub log: Log,
}

#[derive(Parser, Debug)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Cli {
    ///
    /// Specify the configuration file path
    ///
    /// Example: lightchat --config /etc/lightchat/config.toml
    ///
    /// Options given on the command line or through the environment
    /// override the file.
    ///
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listen port [default: 3210]
    #[arg(long, env = "LIGHTCHAT_PORT")]
    port: Option<u16>,

    /// Bind address [default: 0.0.0.0]
    #[arg(long, env = "LIGHTCHAT_BIND")]
    bind: Option<IpAddr>,

    /// Idle timeout in milliseconds [default: 30000]
    #[arg(long, env = "LIGHTCHAT_TIMEOUT")]
    timeout: Option<u64>,

    /// Shutdown grace period in milliseconds [default: 2000]
    #[arg(long)]
    shutdown_grace: Option<u64>,

    /// Journal directory [default: logs]
    #[arg(long, env = "LIGHTCHAT_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Do not write a journal file, wins over `--log-dir`
    #[arg(long)]
    no_journal: bool,

    /// Static file directories, repeat or separate with commas
    /// [default: public,client/public]
    #[arg(long, env = "LIGHTCHAT_PUBLIC", value_delimiter = ',')]
    public: Vec<PathBuf>,

    /// Log level: error, warn, info, debug or trace [default: info]
    #[arg(long)]
    log_level: Option<LogLevel>,
}

impl Config {
    ///
    /// Load configure from command line parameters and the environment.
    ///
    /// If a configuration file is specified it is read first, otherwise
    /// the default configuration is used. Explicit options are applied
    /// on top.
    ///
    pub fn load() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    /// Same as [`load`](Self::load), with explicit arguments.
    pub fn parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_cli(Cli::try_parse_from(args)?)
    }

    fn from_cli(cli: Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => toml::from_str::<Self>(&read_to_string(path)?)?,
            None => Self::default(),
        };

        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(bind) = cli.bind {
            config.server.bind = bind;
        }
        if let Some(timeout) = cli.timeout {
            config.server.timeout = timeout;
        }
        if let Some(grace) = cli.shutdown_grace {
            config.server.shutdown_grace = grace;
        }
        if !cli.public.is_empty() {
            config.server.public_dirs = cli.public;
        }
        if let Some(dir) = cli.log_dir {
            config.journal.dir = Some(dir);
        }
        if cli.no_journal {
            config.journal.dir = None;
        }
        if let Some(level) = cli.log_level {
            config.log.level = level;
        }

        Ok(config)
    }

    pub fn options(&self) -> Options {
        Options {
            idle_timeout: Duration::from_millis(self.server.timeout),
            shutdown_grace: Duration::from_millis(self.server.shutdown_grace),
            public_dirs: self.server.public_dirs.clone(),
        }
    }
}
