//! Connection capability
//!
//! The session and the resend workers never open sockets themselves; they ask
//! a `Connector` for a fresh stream. Connections close when dropped.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("cannot resolve {addr}: {reason}")]
    Resolve { addr: String, reason: String },

    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to configure socket: {0}")]
    Configure(#[source] io::Error),

    #[error("failed to send request: {0}")]
    Send(#[source] io::Error),

    #[error("failed to receive data: {0}")]
    Receive(#[source] io::Error),
}

/// Opens independent byte-stream connections to the feed server
pub trait Connector: Send + Sync {
    type Conn: Read + Write;

    fn connect(&self) -> Result<Self::Conn, TransportError>;
}

/// TCP connector with connect and idle-read timeouts
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
    idle_timeout: Duration,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        TcpConnector {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Silence longer than this ends a read loop
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>, TransportError> {
        let addr = self.addr();
        let addrs: Vec<SocketAddr> = addr
            .to_socket_addrs()
            .map_err(|e| TransportError::Resolve {
                addr: addr.clone(),
                reason: e.to_string(),
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                addr,
                reason: "no addresses".into(),
            });
        }
        Ok(addrs)
    }
}

impl Connector for TcpConnector {
    type Conn = TcpStream;

    fn connect(&self) -> Result<TcpStream, TransportError> {
        // Zero durations are rejected by the socket API
        let connect_timeout = self.connect_timeout.max(MIN_TIMEOUT);

        // Try every resolved address; a host may list ::1 before 127.0.0.1
        let mut last_err = None;
        let mut connected = None;
        for addr in self.resolve()? {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    connected = Some((addr, stream));
                    break;
                }
                Err(source) => {
                    debug!(%addr, error = %source, "connect attempt failed");
                    last_err = Some(TransportError::Connect {
                        addr: addr.to_string(),
                        source,
                    });
                }
            }
        }
        let (addr, stream) = match connected {
            Some(found) => found,
            // resolve() never returns an empty list
            None => {
                return Err(last_err.unwrap_or_else(|| TransportError::Resolve {
                    addr: self.addr(),
                    reason: "no addresses".into(),
                }))
            }
        };

        let idle = Some(self.idle_timeout.max(MIN_TIMEOUT));
        stream.set_read_timeout(idle).map_err(TransportError::Configure)?;
        stream.set_write_timeout(idle).map_err(TransportError::Configure)?;
        stream.set_nodelay(true).map_err(TransportError::Configure)?;

        debug!(%addr, "connected");
        Ok(stream)
    }
}
