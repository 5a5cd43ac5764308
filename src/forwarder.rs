use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::debug;

use crate::dns_header::DnsHeader;
use crate::dns_message::DnsMessage;
use crate::dns_question_and_answer::{DnsAnswer, DnsQuestion};
use crate::error::DnsError;

/// Largest reply we read from the resolver; anything longer is cut off
pub const MAX_UDP_MESSAGE: usize = 512;

/// Relays single questions to an upstream resolver over UDP
#[derive(Debug, Clone)]
pub struct Forwarder {
    resolver: SocketAddr,
    timeout: Duration,
}

impl Forwarder {
    /// `timeout` bounds the wait for each reply and must be non-zero
    pub fn new(resolver: SocketAddr, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    pub fn resolver(&self) -> SocketAddr {
        self.resolver
    }

    /// Ask the resolver about one question and return its answers.
    /// The query reuses the client's id and flags. A fresh socket is used
    /// for every call and nothing is retried.
    pub fn forward(
        &self,
        header: &DnsHeader,
        question: &DnsQuestion,
    ) -> Result<Vec<DnsAnswer>, DnsError> {
        let query = build_single_question_query(header, question);

        let bind_addr: SocketAddr = if self.resolver.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        // Connecting filters out datagrams from anyone but the resolver
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(self.resolver)?;
        socket.set_read_timeout(Some(self.timeout))?;

        debug!(resolver = %self.resolver, %question, "forwarding question");
        socket.send(&query.to_bytes()?)?;

        let mut response_buf = [0u8; MAX_UDP_MESSAGE];
        let response_size = socket.recv(&mut response_buf).map_err(|e| match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                DnsError::ResolverTimeout(self.resolver)
            }
            _ => DnsError::Io(e),
        })?;

        let reply = DnsMessage::from_bytes(&response_buf[..response_size])?;
        if reply.header.id != header.id {
            return Err(DnsError::IdMismatch {
                expected: header.id,
                actual: reply.header.id,
            });
        }

        debug!(
            resolver = %self.resolver,
            answers = reply.answers.len(),
            rcode = reply.header.flags.rcode,
            "resolver replied"
        );

        Ok(reply.answers)
    }
}

/// Build a DNS query with a single question to send to upstream resolver
fn build_single_question_query(header: &DnsHeader, question: &DnsQuestion) -> DnsMessage {
    DnsMessage {
        header: DnsHeader {
            question_count: 1, // Single question
            answer_count: 0,
            authority_count: 0,
            additional_count: 0,
            ..*header
        },
        questions: vec![question.clone()],
        answers: Vec::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dns_header::DnsFlags;
    use crate::dns_question_and_answer::{RecordClass, RecordType};
    use std::thread::{self, JoinHandle};

    /// Resolver on loopback answering `replies` queries. Each query gets one
    /// A record per entry of `answer(name)`, written with a compression
    /// pointer back to the question name. Joining yields the names asked.
    pub(crate) fn stub_resolver(
        replies: usize,
        answer: fn(&str) -> Vec<[u8; 4]>,
    ) -> (SocketAddr, JoinHandle<Vec<String>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut asked = Vec::new();
            let mut buf = [0u8; MAX_UDP_MESSAGE];

            for _ in 0..replies {
                let (size, source) = socket.recv_from(&mut buf).unwrap();
                let query = DnsMessage::from_bytes(&buf[..size]).unwrap();
                assert_eq!(query.header.question_count, 1);
                assert_eq!(query.questions.len(), 1);

                let name = query.questions[0].name.clone();
                let addrs = answer(&name);

                let mut reply = DnsMessage {
                    header: query.header.respond(),
                    questions: query.questions.clone(),
                    answers: Vec::new(),
                }
                .to_bytes()
                .unwrap();
                reply[6..8].copy_from_slice(&(addrs.len() as u16).to_be_bytes());
                for octets in addrs {
                    reply.extend_from_slice(&[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 1, 0x2C, 0, 4]);
                    reply.extend_from_slice(&octets);
                }

                socket.send_to(&reply, source).unwrap();
                asked.push(name);
            }

            asked
        });

        (addr, handle)
    }

    pub(crate) fn a_question(name: &str) -> DnsQuestion {
        DnsQuestion {
            name: name.to_string(),
            qtype: RecordType::A.to_u16(),
            qclass: RecordClass::IN.to_u16(),
        }
    }

    fn client_header(id: u16) -> DnsHeader {
        DnsHeader {
            id,
            flags: DnsFlags {
                rd: true,
                ..DnsFlags::default()
            },
            question_count: 2,
            answer_count: 0,
            authority_count: 0,
            additional_count: 0,
        }
    }

    #[test]
    fn test_single_question_query_keeps_id_and_flags() {
        let query = build_single_question_query(&client_header(77), &a_question("example.com"));

        assert_eq!(query.header.id, 77);
        assert!(query.header.flags.rd);
        assert_eq!(query.header.question_count, 1);
        assert_eq!(query.questions, vec![a_question("example.com")]);
    }

    #[test]
    fn test_forward_collects_answers() {
        let (addr, resolver) = stub_resolver(1, |_| vec![[1, 2, 3, 4], [5, 6, 7, 8]]);
        let forwarder = Forwarder::new(addr, Duration::from_secs(5));

        let answers = forwarder
            .forward(&client_header(0x4242), &a_question("example.com"))
            .unwrap();

        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].name, "example.com");
        assert_eq!(answers[0].ttl, 300);
        assert_eq!(answers[0].rdata, vec![1, 2, 3, 4]);
        assert_eq!(answers[1].rdata, vec![5, 6, 7, 8]);
        assert_eq!(resolver.join().unwrap(), vec!["example.com".to_string()]);
    }

    #[test]
    fn test_forward_times_out() {
        // Bound but never read, so the query goes unanswered
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let forwarder = Forwarder::new(silent.local_addr().unwrap(), Duration::from_millis(50));

        let err = forwarder
            .forward(&client_header(1), &a_question("example.com"))
            .unwrap_err();
        assert!(matches!(err, DnsError::ResolverTimeout(addr) if addr == forwarder.resolver()));
    }

    #[test]
    fn test_forward_rejects_mismatched_id() {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        let resolver = thread::spawn(move || {
            let mut buf = [0u8; MAX_UDP_MESSAGE];
            let (size, source) = socket.recv_from(&mut buf).unwrap();
            let mut reply = DnsMessage::from_bytes(&buf[..size]).unwrap();
            reply.header.id = reply.header.id.wrapping_add(1);
            socket.send_to(&reply.to_bytes().unwrap(), source).unwrap();
        });

        let forwarder = Forwarder::new(addr, Duration::from_secs(5));
        let err = forwarder
            .forward(&client_header(10), &a_question("example.com"))
            .unwrap_err();

        assert!(matches!(
            err,
            DnsError::IdMismatch {
                expected: 10,
                actual: 11
            }
        ));
        resolver.join().unwrap();
    }
}
