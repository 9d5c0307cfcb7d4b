//! Typed failures of a single probe

use std::io;
use std::time::Duration;
use thiserror::Error;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::error::ProtoErrorKind;

/// Phase of the probe an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Connect,
    Read,
}

#[derive(Error, Debug)]
pub enum ProbeError {
    /// Address could not be split into host and port
    #[error("invalid address {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: &'static str },

    #[error("reading system resolver configuration: {0}")]
    ResolverConfig(#[source] ResolveError),

    #[error("lookup {host} timed out after {timeout:?}")]
    LookupTimeout { host: String, timeout: Duration },

    #[error("lookup {host}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: ResolveError,
    },

    #[error("lookup {host}: no addresses found")]
    NoAddresses { host: String },

    #[error("dial {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("dial {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    #[error("peer closed the connection")]
    PeerClosed,
}

impl ProbeError {
    pub fn stage(&self) -> Stage {
        match self {
            ProbeError::ResolverConfig(_)
            | ProbeError::LookupTimeout { .. }
            | ProbeError::Lookup { .. }
            | ProbeError::NoAddresses { .. } => Stage::Resolve,
            // a malformed address never reaches the resolver, it fails the dial
            ProbeError::InvalidAddress { .. }
            | ProbeError::ConnectTimeout { .. }
            | ProbeError::Connect { .. } => Stage::Connect,
            ProbeError::ReadTimeout(_) | ProbeError::PeerClosed => Stage::Read,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ProbeError::LookupTimeout { .. }
            | ProbeError::ConnectTimeout { .. }
            | ProbeError::ReadTimeout(_) => true,
            ProbeError::Lookup { source, .. } => resolve_timed_out(source),
            ProbeError::Connect { source, .. } => source.kind() == io::ErrorKind::TimedOut,
            ProbeError::InvalidAddress { .. }
            | ProbeError::ResolverConfig(_)
            | ProbeError::NoAddresses { .. }
            | ProbeError::PeerClosed => false,
        }
    }
}

fn resolve_timed_out(err: &ResolveError) -> bool {
    match err.kind() {
        ResolveErrorKind::Timeout => true,
        ResolveErrorKind::Io(io_err) => io_err.kind() == io::ErrorKind::TimedOut,
        ResolveErrorKind::Proto(proto) => matches!(proto.kind(), ProtoErrorKind::Timeout),
        _ => false,
    }
}
