//! Minimal DER reader/writer used by the OCSP and certificate codecs.
//!
//! Only definite-length encodings are accepted, which is all DER allows.

use crate::error::CodecError;

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_BIT_STRING: u8 = 0x03;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_NULL: u8 = 0x05;
pub const TAG_OID: u8 = 0x06;
pub const TAG_ENUMERATED: u8 = 0x0A;
pub const TAG_GENERALIZED_TIME: u8 = 0x18;
pub const TAG_SEQUENCE: u8 = 0x30;

/// A single decoded tag-length-value element borrowing from its input.
#[derive(Debug, Clone, Copy)]
pub struct Tlv<'a> {
    pub tag: u8,
    /// Content octets.
    pub value: &'a [u8],
    /// Full encoding including tag and length.
    pub raw: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Context-specific tag number when the class bits are `0b10`.
    pub fn context_tag(&self) -> Option<u8> {
        if self.tag & 0xC0 == 0x80 {
            Some(self.tag & 0x1F)
        } else {
            None
        }
    }

    pub fn expect_tag(self, tag: u8, what: &str) -> Result<Self, CodecError> {
        if self.tag == tag {
            Ok(self)
        } else {
            Err(CodecError::Malformed(format!(
                "{} has tag 0x{:02x}, expected 0x{:02x}",
                what, self.tag, tag
            )))
        }
    }

    /// Iterate over the children of a constructed element.
    pub fn children(&self) -> Reader<'a> {
        Reader::new(self.value)
    }
}

/// Sequential reader over concatenated TLVs.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.input.first().copied()
    }

    /// Read the next element, failing with a message naming `what`.
    pub fn next_tlv(&mut self, what: &str) -> Result<Tlv<'a>, CodecError> {
        let (tlv, rest) = read_tlv(self.input)
            .map_err(|e| CodecError::Malformed(format!("{}: {}", what, e)))?;
        self.input = rest;
        Ok(tlv)
    }

    /// Read the next element only when it carries `tag`.
    pub fn next_if(&mut self, tag: u8) -> Result<Option<Tlv<'a>>, CodecError> {
        if self.peek_tag() == Some(tag) {
            self.next_tlv("optional element").map(Some)
        } else {
            Ok(None)
        }
    }
}

fn read_tlv(input: &[u8]) -> Result<(Tlv<'_>, &[u8]), String> {
    let (&tag, rest) = input.split_first().ok_or("unexpected end of input")?;
    if tag & 0x1F == 0x1F {
        return Err("high tag numbers are not supported".into());
    }
    let (&first, mut rest) = rest.split_first().ok_or("missing length")?;
    let len = if first < 0x80 {
        first as usize
    } else {
        let count = (first & 0x7F) as usize;
        if count == 0 || count > 4 {
            return Err(format!("unsupported length encoding 0x{:02x}", first));
        }
        if rest.len() < count {
            return Err("truncated length".into());
        }
        let len = rest[..count]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        rest = &rest[count..];
        len
    };
    if rest.len() < len {
        return Err(format!("content of {} bytes truncated to {}", len, rest.len()));
    }
    let header_len = input.len() - rest.len();
    let tlv = Tlv {
        tag,
        value: &rest[..len],
        raw: &input[..header_len + len],
    };
    Ok((tlv, &rest[len..]))
}

/// Decode a single element that must span all of `input`.
pub fn parse_single<'a>(input: &'a [u8], what: &str) -> Result<Tlv<'a>, CodecError> {
    let mut reader = Reader::new(input);
    let tlv = reader.next_tlv(what)?;
    if !reader.is_empty() {
        return Err(CodecError::Malformed(format!("trailing data after {}", what)));
    }
    Ok(tlv)
}

/// Render an OBJECT IDENTIFIER value in dotted form.
pub fn oid_to_string(value: &[u8]) -> Result<String, CodecError> {
    let (&first, rest) = value
        .split_first()
        .ok_or_else(|| CodecError::Malformed("empty OID".into()))?;
    let mut arcs = vec![u64::from(first / 40).min(2), 0];
    arcs[1] = u64::from(first) - arcs[0] * 40;
    let mut acc: u64 = 0;
    for b in rest {
        acc = (acc << 7) | u64::from(b & 0x7F);
        if b & 0x80 == 0 {
            arcs.push(acc);
            acc = 0;
        }
    }
    if rest.last().is_some_and(|b| b & 0x80 != 0) {
        return Err(CodecError::Malformed("truncated OID".into()));
    }
    Ok(arcs
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("."))
}

// ============================================================================
// Encoding
// ============================================================================

pub fn sequence(contents: &[u8]) -> Vec<u8> {
    tlv(TAG_SEQUENCE, contents)
}

pub fn octet_string(contents: &[u8]) -> Vec<u8> {
    tlv(TAG_OCTET_STRING, contents)
}

/// Encode an unsigned big-endian INTEGER, padding when the high bit is set.
#[cfg(test)]
pub(crate) fn integer(value: &[u8]) -> Vec<u8> {
    let mut int_value = value.to_vec();
    if int_value.first().is_some_and(|b| b & 0x80 != 0) || int_value.is_empty() {
        int_value.insert(0, 0x00);
    }
    tlv(TAG_INTEGER, &int_value)
}

pub fn null() -> Vec<u8> {
    vec![TAG_NULL, 0x00]
}

/// Encode a dotted OID string such as `1.3.14.3.2.26`.
pub fn oid(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u64> = dotted.split('.').filter_map(|s| s.parse().ok()).collect();
    let mut encoded = Vec::new();
    if arcs.len() >= 2 {
        encoded.extend(base128(40 * arcs[0] + arcs[1]));
        for arc in &arcs[2..] {
            encoded.extend(base128(*arc));
        }
    }
    tlv(TAG_OID, &encoded)
}

/// Context-specific constructed (EXPLICIT) tag.
#[cfg(test)]
pub(crate) fn explicit(tag: u8, contents: &[u8]) -> Vec<u8> {
    tlv(0xA0 | tag, contents)
}

pub fn tlv(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(length(contents.len()));
    out.extend_from_slice(contents);
    out
}

fn length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes: Vec<u8> = len
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|b| *b == 0)
        .collect();
    let mut out = vec![0x80 | bytes.len() as u8];
    out.extend(bytes);
    out
}

fn base128(mut value: u64) -> Vec<u8> {
    let mut out = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        out.insert(0, (value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    out
}
