use std::fmt;

use bytes::{Buf, BufMut, BytesMut};

use crate::dns_name::{encode_domain_name, parse_domain_name};
use crate::error::DnsError;

/// Fewer bytes than this left in the buffer means the answer section is over
pub const MIN_RECORD_LEN: usize = 14;

/// DNS Question Section
/// Format: QNAME + QTYPE (2 bytes) + QCLASS (2 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuestion {
    pub name: String, // Domain name (e.g., "example.com")
    pub qtype: u16,   // Query type (A, AAAA, CNAME, etc.)
    pub qclass: u16,  // Query class (usually IN for Internet)
}

/// DNS Answer/Resource Record Section
/// Format: NAME + TYPE (2 bytes) + CLASS (2 bytes) + TTL (4 bytes) + RDLENGTH (2 bytes) + RDATA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub name: String,   // Domain name
    pub rtype: u16,     // Record type (A, AAAA, CNAME, etc.)
    pub rclass: u16,    // Record class (usually IN for Internet)
    pub ttl: u32,       // Time to live in seconds
    pub rdlength: u16,  // Length of RDATA field
    pub rdata: Vec<u8>, // Resource data (format depends on record type)
}

/// Common DNS record types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A = 1,     // IPv4 address
    NS = 2,    // Name server
    CNAME = 5, // Canonical name
    SOA = 6,   // Start of authority
    PTR = 12,  // Pointer record
    MX = 15,   // Mail exchange
    TXT = 16,  // Text record
    AAAA = 28, // IPv6 address
}

impl RecordType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(RecordType::A),
            2 => Some(RecordType::NS),
            5 => Some(RecordType::CNAME),
            6 => Some(RecordType::SOA),
            12 => Some(RecordType::PTR),
            15 => Some(RecordType::MX),
            16 => Some(RecordType::TXT),
            28 => Some(RecordType::AAAA),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

/// Common DNS classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    IN = 1, // Internet
    CH = 3, // CHAOS
    HS = 4, // Hesiod
}

impl RecordClass {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(RecordClass::IN),
            3 => Some(RecordClass::CH),
            4 => Some(RecordClass::HS),
            _ => None,
        }
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

/// Writes a type or class as its mnemonic when known, `TYPE<n>` otherwise
struct Mnemonic<T>(Option<T>, &'static str, u16);

impl<T: fmt::Debug> fmt::Display for Mnemonic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(known) => write!(f, "{known:?}"),
            None => write!(f, "{}{}", self.1, self.2),
        }
    }
}

impl DnsQuestion {
    /// Parse a DNS question from bytes starting at the given offset
    /// Returns the question and the new offset after parsing
    pub fn from_bytes(bytes: &[u8], offset: usize) -> Result<(Self, usize), DnsError> {
        let (name, new_offset) = parse_domain_name(bytes, offset)?;

        let mut fixed = bytes
            .get(new_offset..new_offset + 4)
            .ok_or(DnsError::Truncated("question type and class"))?;

        let qtype = fixed.get_u16();
        let qclass = fixed.get_u16();

        Ok((
            DnsQuestion {
                name,
                qtype,
                qclass,
            },
            new_offset + 4,
        ))
    }

    /// Parse `count` consecutive questions starting at `offset`
    /// Returns the questions and the offset of the section that follows
    pub fn parse_section(
        bytes: &[u8],
        mut offset: usize,
        count: u16,
    ) -> Result<(Vec<Self>, usize), DnsError> {
        let mut questions = Vec::new();

        for _ in 0..count {
            let (question, new_offset) = DnsQuestion::from_bytes(bytes, offset)?;
            questions.push(question);
            offset = new_offset;
        }

        Ok((questions, offset))
    }

    /// Append the wire form of the question to `buf`
    pub fn write_to(&self, buf: &mut BytesMut) -> Result<(), DnsError> {
        encode_domain_name(&self.name, buf)?;

        buf.put_u16(self.qtype);
        buf.put_u16(self.qclass);

        Ok(())
    }
}

impl fmt::Display for DnsQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            Mnemonic(RecordClass::from_u16(self.qclass), "CLASS", self.qclass),
            Mnemonic(RecordType::from_u16(self.qtype), "TYPE", self.qtype),
        )
    }
}

impl DnsAnswer {
    /// Parse a DNS answer/resource record from bytes starting at the given offset
    /// Returns the answer and the new offset after parsing, or `None` when
    /// too few bytes remain for another record
    pub fn from_bytes(bytes: &[u8], offset: usize) -> Result<Option<(Self, usize)>, DnsError> {
        if bytes.len().saturating_sub(offset) < MIN_RECORD_LEN {
            return Ok(None);
        }

        let (name, new_offset) = parse_domain_name(bytes, offset)?;

        let mut fixed = bytes
            .get(new_offset..new_offset + 10)
            .ok_or(DnsError::Truncated("answer fields"))?;

        let rtype = fixed.get_u16();
        let rclass = fixed.get_u16();
        let ttl = fixed.get_u32();
        let rdlength = fixed.get_u16();

        let data_offset = new_offset + 10;
        let data_end = data_offset + rdlength as usize;
        if data_end > bytes.len() {
            return Err(DnsError::Truncated("RDATA"));
        }

        // Names inside RDATA may point elsewhere in this message, so they are
        // stored uncompressed and the record can be copied into another one
        let rdata = expand_rdata(bytes, rtype, data_offset, data_end)?;

        Ok(Some((DnsAnswer::new(name, rtype, rclass, ttl, rdata)?, data_end)))
    }

    /// Append the wire form of the record to `buf`
    pub fn write_to(&self, buf: &mut BytesMut) -> Result<(), DnsError> {
        encode_domain_name(&self.name, buf)?;

        // Add type, class, TTL, and data length
        buf.put_u16(self.rtype);
        buf.put_u16(self.rclass);
        buf.put_u32(self.ttl);
        buf.put_u16(self.rdlength);

        // Add resource data
        buf.put_slice(&self.rdata);

        Ok(())
    }

    /// Create a new DNS answer with the given parameters
    pub fn new(
        name: String,
        rtype: u16,
        rclass: u16,
        ttl: u32,
        rdata: Vec<u8>,
    ) -> Result<Self, DnsError> {
        let rdlength =
            u16::try_from(rdata.len()).map_err(|_| DnsError::RdataTooLong(rdata.len()))?;
        Ok(DnsAnswer {
            name,
            rtype,
            rclass,
            ttl,
            rdlength,
            rdata,
        })
    }

    /// Create an A record (IPv4 address) answer
    pub fn new_a_record(name: String, ttl: u32, ip: [u8; 4]) -> Self {
        DnsAnswer {
            name,
            rtype: RecordType::A.to_u16(),
            rclass: RecordClass::IN.to_u16(),
            ttl,
            rdlength: 4,
            rdata: ip.to_vec(),
        }
    }
}

/// Copy the RDATA in `bytes[start..end]`, rewriting any embedded domain
/// names without compression. Types without names are copied verbatim.
fn expand_rdata(bytes: &[u8], rtype: u16, start: usize, end: usize) -> Result<Vec<u8>, DnsError> {
    // (fixed bytes before the names, number of names, fixed bytes after)
    let (prefix, names, suffix) = match RecordType::from_u16(rtype) {
        Some(RecordType::NS | RecordType::CNAME | RecordType::PTR) => (0, 1, 0),
        Some(RecordType::MX) => (2, 1, 0), // preference, exchange
        Some(RecordType::SOA) => (0, 2, 20), // mname, rname, five u32 fields
        _ => return Ok(bytes[start..end].to_vec()),
    };

    if end - start < prefix {
        return Err(DnsError::InvalidRdata(rtype));
    }

    let mut rdata = BytesMut::new();
    rdata.put_slice(&bytes[start..start + prefix]);

    let mut offset = start + prefix;
    for _ in 0..names {
        let (name, next) = parse_domain_name(bytes, offset)?;
        if next > end {
            return Err(DnsError::InvalidRdata(rtype));
        }
        encode_domain_name(&name, &mut rdata)?;
        offset = next;
    }

    if end - offset != suffix {
        return Err(DnsError::InvalidRdata(rtype));
    }
    rdata.put_slice(&bytes[offset..end]);

    Ok(rdata.to_vec())
}

impl fmt::Display for DnsAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ",
            self.name,
            self.ttl,
            Mnemonic(RecordClass::from_u16(self.rclass), "CLASS", self.rclass),
            Mnemonic(RecordType::from_u16(self.rtype), "TYPE", self.rtype),
        )?;

        match <[u8; 4]>::try_from(self.rdata.as_slice()) {
            Ok(octets) if self.rtype == RecordType::A.to_u16() => {
                write!(f, "{}", std::net::Ipv4Addr::from(octets))
            }
            _ => write!(f, "({} bytes)", self.rdata.len()),
        }
    }
}
