//! Client configuration

use crate::connection::TcpConnector;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_RESEND_WORKERS: usize = 8;
pub const DEFAULT_OUTPUT: &str = "output.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Silence that ends a read loop
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Upper bound on concurrent resend connections
    pub max_resend_workers: usize,
    pub output: PathBuf,
}

impl ClientConfig {
    pub fn connector(&self) -> TcpConnector {
        TcpConnector::new(self.host.clone(), self.port)
            .with_connect_timeout(self.connect_timeout)
            .with_idle_timeout(self.idle_timeout)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_resend_workers: DEFAULT_MAX_RESEND_WORKERS,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}
