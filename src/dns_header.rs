use bytes::{Buf, BufMut};

use crate::error::DnsError;

/// Size of the fixed DNS header in bytes
pub const HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: DnsFlags,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DnsFlags {
    pub qr: bool,              // Query/Response (false = query, true = response)
    pub opcode: u8,            // Operation code (0 = standard query)
    pub aa: bool,              // Authoritative Answer
    pub tc: bool,              // Truncation
    pub rd: bool,              // Recursion Desired
    pub ra: bool,              // Recursion Available
    pub z: u8,                 // Reserved (must be 0)
    pub rcode: u8,             // Response code, see ResponseCode
}

/// Response codes we emit in the RCODE field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError = 0,
    FormatError = 1,
    ServerFailure = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,
}

impl ResponseCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ResponseCode::NoError),
            1 => Some(ResponseCode::FormatError),
            2 => Some(ResponseCode::ServerFailure),
            3 => Some(ResponseCode::NameError),
            4 => Some(ResponseCode::NotImplemented),
            5 => Some(ResponseCode::Refused),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl DnsFlags {
    pub fn to_u16(&self) -> u16 {
        let mut flags: u16 = 0;

        if self.qr { flags |= 1 << 15; }           // QR at bit 15
        flags |= (self.opcode as u16 & 0xF) << 11; // OPCODE at bits 11-14
        if self.aa { flags |= 1 << 10; }           // AA at bit 10
        if self.tc { flags |= 1 << 9; }            // TC at bit 9
        if self.rd { flags |= 1 << 8; }            // RD at bit 8
        if self.ra { flags |= 1 << 7; }            // RA at bit 7
        flags |= (self.z as u16 & 0x7) << 4;       // Z at bits 4-6 (reserved)
        flags |= self.rcode as u16 & 0xF;          // RCODE at bits 0-3

        flags
    }

    pub fn from_u16(flags: u16) -> Self {
        DnsFlags {
            qr: (flags & (1 << 15)) != 0,
            opcode: ((flags >> 11) & 0xF) as u8,
            aa: (flags & (1 << 10)) != 0,
            tc: (flags & (1 << 9)) != 0,
            rd: (flags & (1 << 8)) != 0,
            ra: (flags & (1 << 7)) != 0,
            z: ((flags >> 4) & 0x7) as u8,
            rcode: (flags & 0xF) as u8,
        }
    }

    pub fn response_code(&self) -> Option<ResponseCode> {
        ResponseCode::from_u8(self.rcode)
    }
}

impl DnsHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DnsError> {
        if bytes.len() < HEADER_LEN {
            return Err(DnsError::Truncated("DNS header"));
        }

        let mut buf = &bytes[..HEADER_LEN];
        Ok(DnsHeader {
            id: buf.get_u16(),
            flags: DnsFlags::from_u16(buf.get_u16()),
            question_count: buf.get_u16(),
            answer_count: buf.get_u16(),
            authority_count: buf.get_u16(),
            additional_count: buf.get_u16(),
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];

        let mut out = &mut bytes[..];
        out.put_u16(self.id);
        out.put_u16(self.flags.to_u16());
        out.put_u16(self.question_count);
        out.put_u16(self.answer_count);
        out.put_u16(self.authority_count);
        out.put_u16(self.additional_count);

        bytes
    }

    /// Build the reply header for this request header.
    /// One answer is announced per question; callers that produce a
    /// different number of answers overwrite `answer_count`.
    pub fn respond(&self) -> DnsHeader {
        let rcode = if self.flags.opcode == 0 {
            ResponseCode::NoError
        } else {
            ResponseCode::NotImplemented
        };

        let flags = DnsFlags {
            qr: true,                     // This is a response
            opcode: self.flags.opcode,    // Echo opcode
            aa: false,                    // Not authoritative
            tc: false,                    // Not truncated
            rd: self.flags.rd,            // Echo recursion desired
            ra: false,                    // Recursion not available
            z: 0,                         // Reserved
            rcode: rcode.to_u8(),
        };

        DnsHeader {
            id: self.id,                          // Echo request ID
            flags,
            question_count: self.question_count,  // Echo question count
            answer_count: self.question_count,    // One answer per question
            authority_count: 0,
            additional_count: 0,
        }
    }
}
