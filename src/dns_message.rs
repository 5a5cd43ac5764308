use bytes::{BufMut, BytesMut};

use crate::dns_header::{DnsHeader, ResponseCode, HEADER_LEN};
use crate::dns_question_and_answer::{DnsAnswer, DnsQuestion};
use crate::error::DnsError;
use crate::forwarder::Forwarder;
use crate::local::answer_locally;

/// A DNS message as far as this server cares: header, questions, answers.
/// Authority and additional sections are neither decoded nor produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsAnswer>,
}

impl DnsMessage {
    /// Parse a DNS message from the buffer
    /// Takes an immutable borrow of the buffer, returns owned structures
    pub fn from_bytes(buf: &[u8]) -> Result<Self, DnsError> {
        let header = DnsHeader::from_bytes(buf)?;

        let (questions, mut offset) =
            DnsQuestion::parse_section(buf, HEADER_LEN, header.question_count)?;

        let mut answers = Vec::new();
        for _ in 0..header.answer_count {
            match DnsAnswer::from_bytes(buf, offset)? {
                Some((answer, new_offset)) => {
                    answers.push(answer);
                    offset = new_offset;
                }
                None => break,
            }
        }

        Ok(DnsMessage {
            header,
            questions,
            answers,
        })
    }

    /// Build the complete DNS message: header, questions, answers, in that order
    pub fn to_bytes(&self) -> Result<Vec<u8>, DnsError> {
        let mut buf = BytesMut::with_capacity(512);

        buf.put_slice(&self.header.to_bytes());

        for question in &self.questions {
            question.write_to(&mut buf)?;
        }

        for answer in &self.answers {
            answer.write_to(&mut buf)?;
        }

        Ok(buf.to_vec())
    }

    /// Answer every question locally with a placeholder A record
    pub fn respond(&self) -> DnsMessage {
        let answers: Vec<DnsAnswer> = self.questions.iter().map(answer_locally).collect();

        DnsMessage {
            header: self.reply_header(answers.len()),
            questions: self.questions.clone(),
            answers,
        }
    }

    /// Ask the upstream resolver about each question separately and merge
    /// the answers in question order
    pub fn forward(&self, forwarder: &Forwarder) -> Result<DnsMessage, DnsError> {
        let mut answers = Vec::new();

        // Public resolvers often like single question, so we split them
        for question in &self.questions {
            answers.extend(forwarder.forward(&self.header, question)?);
        }

        Ok(DnsMessage {
            header: self.reply_header(answers.len()),
            questions: self.questions.clone(),
            answers,
        })
    }

    /// A reply carrying only the echoed questions and the given status
    pub fn error_response(&self, rcode: ResponseCode) -> DnsMessage {
        let mut header = self.reply_header(0);
        header.flags.rcode = rcode.to_u8();

        DnsMessage {
            header,
            questions: self.questions.clone(),
            answers: Vec::new(),
        }
    }

    /// Reply header whose counts match the sections actually sent back
    fn reply_header(&self, answer_count: usize) -> DnsHeader {
        let mut header = self.header.respond();
        header.question_count = self.questions.len() as u16;
        header.answer_count = answer_count as u16;
        header
    }
}
