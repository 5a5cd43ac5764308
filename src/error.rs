use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while decoding, encoding or relaying DNS messages
#[derive(Error, Debug)]
pub enum DnsError {
    #[error("Buffer too small for {0}")]
    Truncated(&'static str),

    #[error("Reserved label type 0x{0:02x} in domain name")]
    InvalidLabelType(u8),

    #[error("Compression pointer at offset {offset} targets {target}, which does not precede the name it belongs to")]
    ForwardPointer { offset: usize, target: usize },

    #[error("Invalid UTF-8 in domain label")]
    InvalidLabel,

    #[error("Label too long: {0}")]
    LabelTooLong(String),

    #[error("Domain name too long: {0} bytes encoded")]
    NameTooLong(usize),

    #[error("RDATA of type {0} does not match its length")]
    InvalidRdata(u16),

    #[error("RDATA too long: {0} bytes")]
    RdataTooLong(usize),

    #[error("Invalid socket address: {0}")]
    InvalidAddress(String),

    #[error("Resolver timeout must be at least 1ms")]
    ZeroTimeout,

    #[error("Resolver {0} did not answer in time")]
    ResolverTimeout(SocketAddr),

    #[error("Resolver replied with id {actual}, expected {expected}")]
    IdMismatch { expected: u16, actual: u16 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
