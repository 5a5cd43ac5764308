//! Domain name wire format: length-prefixed labels and compression pointers.
//!
//! Every offset here is absolute, counted from the first byte of the
//! message header, and `bytes` is always the whole message. Compression
//! pointers carry absolute offsets too, so no adjustment is needed when
//! following them.

use bytes::{BufMut, BytesMut};

use crate::error::DnsError;

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

const LABEL_TYPE_MASK: u8 = 0xC0;
const POINTER_TAG: u8 = 0xC0;

/// One step of a wire-format name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelToken<'a> {
    /// Zero length byte, end of the name
    End,
    /// Literal label bytes
    Label(&'a [u8]),
    /// Compression pointer to an absolute message offset. Always the last
    /// token of a name.
    Pointer(u16),
}

impl<'a> LabelToken<'a> {
    /// Read the token at `offset`, returning it with the offset that follows it
    pub fn read(bytes: &'a [u8], offset: usize) -> Result<(Self, usize), DnsError> {
        let &length = bytes
            .get(offset)
            .ok_or(DnsError::Truncated("domain name"))?;

        match length & LABEL_TYPE_MASK {
            POINTER_TAG => {
                let &low = bytes
                    .get(offset + 1)
                    .ok_or(DnsError::Truncated("compression pointer"))?;
                let pointer = u16::from_be_bytes([length & !LABEL_TYPE_MASK, low]);
                Ok((LabelToken::Pointer(pointer), offset + 2))
            }
            0 if length == 0 => Ok((LabelToken::End, offset + 1)),
            0 => {
                let start = offset + 1;
                let end = start + length as usize;
                let label = bytes
                    .get(start..end)
                    .ok_or(DnsError::Truncated("domain label"))?;
                Ok((LabelToken::Label(label), end))
            }
            _ => Err(DnsError::InvalidLabelType(length)),
        }
    }
}

/// Parse a domain name from DNS message format
/// Supports DNS name compression (pointers)
/// Returns the parsed domain name and the offset just past the name as it
/// appears at `offset` (a pointer counts as two bytes, not its target)
pub fn parse_domain_name(bytes: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    let mut labels = Vec::new();
    let next = collect_labels(bytes, offset, offset, &mut labels)?;

    let encoded_len: usize = labels.iter().map(|label| label.len() + 1).sum::<usize>() + 1;
    if encoded_len > MAX_NAME_LEN {
        return Err(DnsError::NameTooLong(encoded_len));
    }

    let domain_name = if labels.is_empty() {
        ".".to_string() // Root domain
    } else {
        labels.join(".")
    };

    Ok((domain_name, next))
}

/// Append the labels found at `offset` to `labels`.
/// `limit` is where the current chain started: a pointer must land strictly
/// before it, and the target becomes the new limit, so every jump moves
/// further back and the recursion ends.
fn collect_labels(
    bytes: &[u8],
    mut offset: usize,
    limit: usize,
    labels: &mut Vec<String>,
) -> Result<usize, DnsError> {
    loop {
        let (token, next) = LabelToken::read(bytes, offset)?;

        match token {
            LabelToken::End => return Ok(next),
            LabelToken::Label(raw) => {
                // A dot inside a label could not be told apart from a separator
                if raw.contains(&b'.') {
                    return Err(DnsError::InvalidLabel);
                }
                let label = std::str::from_utf8(raw).map_err(|_| DnsError::InvalidLabel)?;
                labels.push(label.to_string());
                offset = next;
            }
            LabelToken::Pointer(target) => {
                let target = target as usize;
                if target >= limit {
                    return Err(DnsError::ForwardPointer { offset, target });
                }
                collect_labels(bytes, target, target, labels)?;
                return Ok(next);
            }
        }
    }
}

/// Encode a domain name to DNS message format
/// Format: length-prefixed labels terminated with a null byte
/// Example: "example.com" -> [7]example[3]com[0]
pub fn encode_domain_name(name: &str, buf: &mut BytesMut) -> Result<(), DnsError> {
    let start = buf.len();

    // Empty labels cover the root domain and a trailing dot
    for label in name.split('.').filter(|label| !label.is_empty()) {
        let label_bytes = label.as_bytes();
        if label_bytes.len() > MAX_LABEL_LEN {
            return Err(DnsError::LabelTooLong(label.to_string()));
        }

        buf.put_u8(label_bytes.len() as u8);
        buf.put_slice(label_bytes);
    }

    // Null terminator
    buf.put_u8(0);

    let encoded_len = buf.len() - start;
    if encoded_len > MAX_NAME_LEN {
        return Err(DnsError::NameTooLong(encoded_len));
    }

    Ok(())
}
