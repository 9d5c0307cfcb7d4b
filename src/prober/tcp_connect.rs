use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use super::{ProbeError, StatusCode};
use crate::util::{resolve_socket_addrs, split_host_port};

/// How long a connected peer must stay quiet before it counts as alive.
pub const LIVENESS_WINDOW: Duration = Duration::from_millis(50);

/// One-shot TCP reachability check against a `host:port` target.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Run the probe and classify its outcome. Never fails; every error becomes a status.
    pub async fn run(&self) -> StatusCode {
        let start = Instant::now();
        let status = match self.check().await {
            Ok(()) => StatusCode::Ok,
            Err(e) => {
                debug!(
                    addr = %self.addr,
                    stage = ?e.stage(),
                    timeout = e.is_timeout(),
                    error = %e,
                    "tcp probe failed"
                );
                StatusCode::from(&e)
            }
        };
        debug!(
            addr = %self.addr,
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tcp probe finished"
        );
        status
    }

    async fn check(&self) -> Result<(), ProbeError> {
        let stream = self.dial().await?;
        // dropped on return, closing the socket on every path
        self.liveness(&stream).await
    }

    /// Resolve and connect, sharing one deadline between both steps.
    async fn dial(&self) -> Result<TcpStream, ProbeError> {
        let deadline = Instant::now() + self.timeout;
        let (host, port) = split_host_port(&self.addr)?;
        let addrs = resolve_socket_addrs(&host, port, self.timeout, deadline).await?;

        match timeout_at(deadline, TcpStream::connect(&addrs[..])).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(ProbeError::Connect {
                addr: self.addr.clone(),
                source,
            }),
            Err(_elapsed) => Err(ProbeError::ConnectTimeout {
                addr: self.addr.clone(),
                timeout: self.timeout,
            }),
        }
    }

    /// Look for a hang-up the peer has already sent, without consuming payload.
    ///
    /// The read completes as soon as the peer sends data or closes, or once the peer has held
    /// the connection open quietly for [`LIVENESS_WINDOW`]. Only a read deadline that fires
    /// before any of those is a read timeout.
    async fn liveness(&self, stream: &TcpStream) -> Result<(), ProbeError> {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(addr = %self.addr, error = %e, "failed to set TCP_NODELAY");
        }

        let now = Instant::now();
        let deadline = now + self.timeout;
        let settled = now + LIVENESS_WINDOW;

        let mut buf = [0u8; 1];
        match timeout_at(deadline.min(settled), stream.peek(&mut buf)).await {
            Ok(Ok(0)) => Err(ProbeError::PeerClosed),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => match e.kind() {
                io::ErrorKind::TimedOut => Err(ProbeError::ReadTimeout(self.timeout)),
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    debug!(addr = %self.addr, error = %e, "peer reset the connection");
                    Err(ProbeError::PeerClosed)
                }
                _ => {
                    // the connection was up; anything else still counts as reachable
                    debug!(addr = %self.addr, error = %e, "liveness read failed");
                    Ok(())
                }
            },
            // silent peer holding the connection open
            Err(_elapsed) if settled < deadline => Ok(()),
            Err(_elapsed) => Err(ProbeError::ReadTimeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::task;

    async fn local_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local address");
        (listener, addr.to_string())
    }

    #[tokio::test]
    async fn test_ok_when_peer_greets() {
        let (listener, addr) = local_listener().await;
        let _handle = task::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let _ = stream.write_all(b"220 ready\r\n").await;
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        });

        let probe = TcpProbe::new(addr, Duration::from_secs(2));
        assert_eq!(probe.run().await, StatusCode::Ok);
    }

    #[tokio::test]
    async fn test_closed_when_peer_hangs_up() {
        let (listener, addr) = local_listener().await;
        let _handle = task::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let probe = TcpProbe::new(addr, Duration::from_secs(2));
        assert_eq!(probe.run().await, StatusCode::Closed);
    }

    async fn silent_listener() -> String {
        let (listener, addr) = local_listener().await;
        task::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_ok_when_peer_is_silent() {
        let addr = silent_listener().await;

        let probe = TcpProbe::new(addr, Duration::from_millis(1500));
        assert_eq!(probe.run().await, StatusCode::Ok);
    }

    #[tokio::test]
    async fn test_read_timeout_when_deadline_is_shorter_than_window() {
        let addr = silent_listener().await;

        let probe = TcpProbe::new(addr, LIVENESS_WINDOW / 5);
        assert_eq!(probe.run().await, StatusCode::ReadTimeout);
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn test_closed_when_peer_resets() {
        let (listener, addr) = local_listener().await;
        let _handle = task::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                // zero linger turns the close into an RST
                let _ = stream.set_linger(Some(Duration::ZERO));
                drop(stream);
            }
        });

        let probe = TcpProbe::new(addr, Duration::from_secs(2));
        assert_eq!(probe.run().await, StatusCode::Closed);
    }

    #[tokio::test]
    async fn test_connection_error_when_refused() {
        // Bind then drop so the port is known to be closed
        let (listener, addr) = local_listener().await;
        drop(listener);

        let probe = TcpProbe::new(addr, Duration::from_secs(1));
        assert_eq!(probe.run().await, StatusCode::ConnectionError);
    }

    #[tokio::test]
    async fn test_connection_error_for_malformed_address() {
        let probe = TcpProbe::new("127.0.0.1", Duration::from_secs(1));
        assert_eq!(probe.run().await, StatusCode::ConnectionError);
    }

    #[tokio::test]
    async fn test_repeated_probes_agree() {
        let (listener, addr) = local_listener().await;
        drop(listener);

        let probe = TcpProbe::new(addr, Duration::from_millis(200));
        let first = probe.run().await;
        for _ in 0..3 {
            assert_eq!(probe.run().await, first);
        }
    }

    #[tokio::test]
    #[ignore = "depends on the host's routing table"]
    async fn test_connect_timeout_on_unroutable_address() {
        // 10.255.255.1 is non-routable and should timeout
        let probe = TcpProbe::new("10.255.255.1:80", Duration::from_millis(50));
        assert_eq!(probe.run().await, StatusCode::ConnectTimeout);
    }

    #[tokio::test]
    #[ignore = "requires a reachable DNS server"]
    async fn test_dns_error_for_unknown_host() {
        let probe = TcpProbe::new("no-such-host.invalid:80", Duration::from_secs(3));
        assert_eq!(probe.run().await, StatusCode::DnsError);
    }
}
