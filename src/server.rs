use std::net::{SocketAddr, UdpSocket};

use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::dns_header::{DnsHeader, ResponseCode};
use crate::dns_message::DnsMessage;
use crate::error::DnsError;
use crate::forwarder::{Forwarder, MAX_UDP_MESSAGE};

/// DNS Server that handles incoming DNS requests
pub struct DnsServer {
    socket: UdpSocket,
    forwarder: Option<Forwarder>,
}

impl DnsServer {
    /// Create a new DNS server bound to the configured address
    /// Queries are forwarded when the configuration names a resolver
    pub fn new(config: &ServerConfig) -> Result<Self, DnsError> {
        let socket = UdpSocket::bind(config.bind_addr)?;
        let forwarder = config
            .resolver
            .map(|resolver| Forwarder::new(resolver, config.resolver_timeout));

        Ok(Self { socket, forwarder })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DnsError> {
        Ok(self.socket.local_addr()?)
    }

    /// Run the DNS server main loop
    /// Listens for incoming requests and sends responses. A failing request
    /// is answered with an error status or dropped; the loop never stops.
    pub fn run(&self) {
        let mut buf = [0u8; MAX_UDP_MESSAGE];

        if let Some(forwarder) = &self.forwarder {
            info!(resolver = %forwarder.resolver(), "forwarding queries upstream");
        }

        loop {
            let (size, source) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) => {
                    error!("Error receiving data: {}", e);
                    continue;
                }
            };

            debug!("Received {} bytes from {}", size, source);

            let Some(response) = self.handle_request(&buf[..size], source) else {
                continue;
            };

            if let Err(e) = self.socket.send_to(&response, source) {
                error!("Failed to send response to {}: {}", source, e);
            }
        }
    }

    /// Handle a DNS request: parse, resolve, and build response
    /// Returns `None` when nothing sensible can be sent back
    fn handle_request(&self, buf: &[u8], source: SocketAddr) -> Option<Vec<u8>> {
        let response = match DnsMessage::from_bytes(buf) {
            Ok(query) => self.resolve(&query, source),
            Err(e) => {
                warn!("Malformed query from {}: {}", source, e);
                // Without a readable header there is no id to answer to
                let header = DnsHeader::from_bytes(buf).ok()?;
                DnsMessage {
                    header,
                    questions: Vec::new(),
                    answers: Vec::new(),
                }
                .error_response(ResponseCode::FormatError)
            }
        };

        match response.to_bytes() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Failed to encode response for {}: {}", source, e);
                None
            }
        }
    }

    /// Get answers - either from upstream resolver or generate locally
    fn resolve(&self, query: &DnsMessage, source: SocketAddr) -> DnsMessage {
        for question in &query.questions {
            debug!(id = query.header.id, %source, %question, "query");
        }

        let response = match &self.forwarder {
            Some(forwarder) => query.forward(forwarder).unwrap_or_else(|e| {
                error!("Forwarding query {} failed: {}", query.header.id, e);
                query.error_response(ResponseCode::ServerFailure)
            }),
            None => query.respond(),
        };

        for answer in &response.answers {
            debug!(id = response.header.id, %source, %answer, "answer");
        }
        debug!(
            id = response.header.id,
            rcode = ?response.header.flags.response_code(),
            answers = response.answers.len(),
            "responding"
        );

        response
    }
}
