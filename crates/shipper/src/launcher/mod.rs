//! Launcher: start the local metadata service before watching begins.
//!
//! The service runs on its own named thread with a private runtime. Launch is
//! fire-and-forget; an optional readiness wait polls the address so the first
//! parse does not race the bind.

pub mod port;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use port::{is_local_host, local_bind_ip, metadata_addr};

const CONNECT_TIMEOUT: Duration = Duration::from_millis(200);
const READY_RETRY: Duration = Duration::from_millis(25);

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Invalid metadata URL: {url}")]
    InvalidUrl { url: String },

    #[error("Local metadata URL has no port: {url} (expected http://host:port/...)")]
    MissingPort { url: String },

    #[error("Metadata URL port out of range in {url}: {value}")]
    InvalidPort { url: String, value: String },

    #[error("Failed to spawn metadata service thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Starts the metadata HTTP service on a dedicated thread.
#[derive(Debug, Clone)]
pub struct MetadataLauncher {
    ready_timeout: Duration,
}

impl MetadataLauncher {
    /// `ready_timeout` of zero skips the readiness wait.
    pub fn new(ready_timeout: Duration) -> Self {
        Self { ready_timeout }
    }

    pub fn ready_timeout(&self) -> Duration {
        self.ready_timeout
    }

    /// Spawn the service bound to `addr`, storing documents in `meta_dir`.
    /// A bind failure inside the thread is logged, not returned.
    pub fn launch(&self, addr: SocketAddr, meta_dir: &Path) -> Result<JoinHandle<()>, LaunchError> {
        let dir: PathBuf = meta_dir.to_path_buf();
        info!("Launching metadata service on {} (storage: {})", addr, dir.display());

        let handle = thread::Builder::new()
            .name("metadata-api".to_string())
            .spawn(move || {
                if let Err(e) = metadata::start_api(addr, dir) {
                    error!("Metadata service on {} stopped: {}", addr, e);
                }
            })
            .map_err(LaunchError::Spawn)?;

        if !self.ready_timeout.is_zero() {
            if self.wait_ready(addr) {
                info!("✓ Metadata service accepting connections on {}", addr);
            } else {
                warn!(
                    "Metadata service not reachable on {} after {}ms; continuing",
                    addr,
                    self.ready_timeout.as_millis()
                );
            }
        }

        Ok(handle)
    }

    /// Poll `addr` until a TCP connect succeeds or the timeout elapses. A
    /// wildcard bind is probed through the loopback of the same family.
    pub fn wait_ready(&self, addr: SocketAddr) -> bool {
        let addr = probe_addr(addr);
        let deadline = Instant::now() + self.ready_timeout;

        loop {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(_) => return true,
                Err(e) => debug!("Metadata service not ready on {}: {}", addr, e),
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(READY_RETRY);
        }
    }
}

fn probe_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::from((Ipv4Addr::LOCALHOST, addr.port())),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::from((Ipv6Addr::LOCALHOST, addr.port())),
        _ => addr,
    }
}

impl Default for MetadataLauncher {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}
