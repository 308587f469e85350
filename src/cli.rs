use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::io::DEFAULT_WINDOW_SIZE;

#[derive(Parser, Debug)]
#[command(name = "rarchive")]
#[command(version)]
#[command(about = "Browse and download files inside remote archives over HTTP", long_about = None)]
#[command(after_help = "Examples:\n  \
  rarchive                 listen on 0.0.0.0:8080\n  \
  rarchive -p 9000         listen on 0.0.0.0:9000\n  \
  RUST_LOG=debug rarchive  log resolved paths, formats and transfers")]
pub struct Cli {
    /// Port to listen on
    #[arg(short = 'p', long, default_value_t = 8080)]
    pub port: u16,
}

/// Runtime settings of the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Bytes fetched from the remote per ranged request.
    pub window_size: usize,
    /// Limit on each outbound request to an archive host.
    pub remote_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            window_size: DEFAULT_WINDOW_SIZE,
            remote_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Cli> for ServerConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, cli.port)),
            ..Self::default()
        }
    }
}
