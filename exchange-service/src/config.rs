use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Service settings. Every flag can also come from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "exchange-service")]
#[command(about = "Price-time priority matching service for a single instrument")]
pub struct Config {
    #[arg(long, env = "MATCHBOOK_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Journal file; without one the book lives in memory only
    #[arg(long, env = "MATCHBOOK_JOURNAL")]
    pub journal: Option<PathBuf>,

    #[arg(long, env = "MATCHBOOK_LOG", default_value = "info")]
    pub log_level: String,

    /// Pending matching requests the trigger queue holds before submitters wait
    #[arg(long, env = "MATCHBOOK_TRIGGER_QUEUE", default_value_t = 1024)]
    pub trigger_queue: usize,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
