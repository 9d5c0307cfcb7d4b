use std::fmt;

pub mod error;
pub mod tcp_connect;

pub use error::{ProbeError, Stage};

/// Outcome of a single probe. The set is closed: every probe resolves to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    ConnectionError,
    ConnectTimeout,
    ReadTimeout,
    Closed,
    DnsError,
    DnsTimeout,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::ConnectionError => 500,
            StatusCode::ConnectTimeout => 501,
            StatusCode::ReadTimeout => 502,
            StatusCode::Closed => 503,
            StatusCode::DnsError => 504,
            StatusCode::DnsTimeout => 505,
        }
    }

    /// Canonical short label reported next to the numeric code.
    pub fn label(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::ConnectionError => "ConnectionError",
            StatusCode::ConnectTimeout => "ConnectTimeout",
            StatusCode::ReadTimeout => "ReadTimeout",
            StatusCode::Closed => "Closed",
            StatusCode::DnsError => "DNSError",
            StatusCode::DnsTimeout => "DNSTimeout",
        }
    }
}

impl From<&ProbeError> for StatusCode {
    fn from(err: &ProbeError) -> Self {
        // resolution before connect before read; timeouts before the generic bucket
        match (err.stage(), err.is_timeout()) {
            (Stage::Resolve, true) => StatusCode::DnsTimeout,
            (Stage::Resolve, false) => StatusCode::DnsError,
            (Stage::Connect, true) => StatusCode::ConnectTimeout,
            (Stage::Connect, false) => StatusCode::ConnectionError,
            (Stage::Read, true) => StatusCode::ReadTimeout,
            (Stage::Read, false) => StatusCode::Closed,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.label())
    }
}
