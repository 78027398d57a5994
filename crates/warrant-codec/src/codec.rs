//! Encoding and decoding of [`Values`].

use crate::error::CodecError;
use crate::value::{Kind, Tag, Value, Values};

/// Default maximum nesting depth accepted by [`Values::decode`].
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Default maximum input size accepted by [`Values::decode`].
pub const DEFAULT_MAX_SIZE: usize = 64 * 1024;

/// Varints never need more than 10 bytes for a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Resource limits enforced while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of nested levels below the top-level structure.
    pub max_depth: usize,
    /// Maximum total input length in bytes.
    pub max_size: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl Values {
    /// Encode into a fresh buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Append the encoding of this structure to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        for (tag, value) in self {
            write_varint(out, u64::from(*tag));
            out.push(value.kind() as u8);
            match value {
                Value::String(s) => write_payload(out, s.as_bytes()),
                Value::Bytes(b) => write_payload(out, b),
                Value::UInt(n) => write_payload(out, &n.to_be_bytes()),
                Value::Bool(b) => write_payload(out, &[u8::from(*b)]),
                Value::Nested(nested) => write_payload(out, &nested.encode()),
            }
        }
    }

    /// Decode with [`DecodeLimits::default`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::decode_with(bytes, DecodeLimits::default())
    }

    /// Decode, enforcing the given resource limits.
    pub fn decode_with(bytes: &[u8], limits: DecodeLimits) -> Result<Self, CodecError> {
        if bytes.len() > limits.max_size {
            return Err(CodecError::TooLarge {
                size: bytes.len(),
                max: limits.max_size,
            });
        }
        decode_entries(bytes, 0, 0, &limits)
    }
}

fn write_payload(out: &mut Vec<u8>, payload: &[u8]) {
    write_varint(out, payload.len() as u64);
    out.extend_from_slice(payload);
}

fn write_varint(out: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        out.push((n as u8 & 0x7f) | 0x80);
        n >>= 7;
    }
    out.push(n as u8);
}

/// Decode the entries of one structure level.
///
/// `base` is the absolute offset of `buf` within the top-level input and is
/// only used for error reporting.
fn decode_entries(
    buf: &[u8],
    base: usize,
    depth: usize,
    limits: &DecodeLimits,
) -> Result<Values, CodecError> {
    if depth > limits.max_depth {
        return Err(CodecError::DepthExceeded {
            max: limits.max_depth,
        });
    }

    let mut reader = Reader { buf, pos: 0, base };
    let mut values = Values::new();
    let mut previous: Option<Tag> = None;

    while !reader.is_empty() {
        let entry_offset = reader.offset();
        let tag = reader.varint("tag")?;
        let tag = Tag::try_from(tag)
            .map_err(|_| CodecError::malformed(entry_offset, format!("tag {tag} out of range")))?;
        if let Some(previous) = previous {
            if tag <= previous {
                return Err(CodecError::malformed(
                    entry_offset,
                    format!("tag {tag} follows tag {previous}"),
                ));
            }
        }

        let kind_offset = reader.offset();
        let kind = Kind::from_byte(reader.byte("kind")?, kind_offset)?;

        let len = reader.varint("length")?;
        let payload_offset = reader.offset();
        let payload = reader.take(len, "payload")?;

        let value = match kind {
            Kind::String => {
                let s = std::str::from_utf8(payload).map_err(|e| {
                    CodecError::malformed(payload_offset, format!("invalid UTF-8: {e}"))
                })?;
                Value::String(s.to_string())
            }
            Kind::Bytes => Value::Bytes(payload.to_vec()),
            Kind::UInt => {
                let raw: [u8; 8] = payload.try_into().map_err(|_| {
                    CodecError::malformed(
                        payload_offset,
                        format!("uint64 payload is {} bytes", payload.len()),
                    )
                })?;
                Value::UInt(u64::from_be_bytes(raw))
            }
            Kind::Bool => match payload {
                [0] => Value::Bool(false),
                [1] => Value::Bool(true),
                _ => {
                    return Err(CodecError::malformed(payload_offset, "invalid bool payload"));
                }
            },
            Kind::Nested => {
                Value::Nested(decode_entries(payload, payload_offset, depth + 1, limits)?)
            }
        };

        values.insert(tag, value);
        previous = Some(tag);
    }

    Ok(values)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn byte(&mut self, what: &str) -> Result<u8, CodecError> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| CodecError::malformed(self.offset(), format!("truncated {what}")))?;
        self.pos += 1;
        Ok(b)
    }

    fn varint(&mut self, what: &str) -> Result<u64, CodecError> {
        let start = self.offset();
        let mut n: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let b = self.byte(what)?;
            let bits = u64::from(b & 0x7f);
            if i == MAX_VARINT_LEN - 1 && bits > 1 {
                return Err(CodecError::malformed(start, format!("{what} overflows u64")));
            }
            n |= bits << (7 * i);
            if b & 0x80 == 0 {
                if i > 0 && b == 0 {
                    return Err(CodecError::malformed(start, format!("non-minimal {what}")));
                }
                return Ok(n);
            }
        }
        Err(CodecError::malformed(start, format!("{what} overflows u64")))
    }

    fn take(&mut self, len: u64, what: &str) -> Result<&'a [u8], CodecError> {
        let remaining = self.buf.len() - self.pos;
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= remaining)
            .ok_or_else(|| {
                CodecError::malformed(
                    self.offset(),
                    format!("truncated {what}: need {len} bytes, have {remaining}"),
                )
            })?;
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Values {
        Values::new()
            .with(1, "AAECAwQFBgc")
            .with(2, "client-1")
            .with(3, 1_700_000_000u64)
            .with(4, 1_700_086_400u64)
            .with(5, Values::new().with(1, true))
    }

    #[test]
    fn test_roundtrip_nested_claims() {
        let values = claims();
        let decoded = Values::decode(&values.encode()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_roundtrip_edge_values() {
        let values = Values::new()
            .with(0, "")
            .with(1, Vec::<u8>::new())
            .with(2, u64::MAX)
            .with(3, 0u64)
            .with(200, Values::new())
            .with(Tag::MAX, "ünïcödé");
        assert_eq!(Values::decode(&values.encode()).unwrap(), values);
    }

    #[test]
    fn test_encoding_layout() {
        let values = Values::new().with(1, "ab").with(2, true);
        assert_eq!(
            values.encode(),
            vec![0x01, 0x01, 0x02, b'a', b'b', 0x02, 0x04, 0x01, 0x01]
        );
    }

    #[test]
    fn test_multibyte_varint_tag() {
        let values = Values::new().with(300, 1u64);
        let bytes = values.encode();
        assert_eq!(&bytes[..2], &[0xac, 0x02]);
        assert_eq!(Values::decode(&bytes).unwrap(), values);
    }

    #[test]
    fn test_unknown_tags_survive_roundtrip() {
        // Entry 99 is not a claim this version knows about.
        let bytes = claims().with(99, "from-the-future").encode();
        let decoded = Values::decode(&bytes).unwrap();
        assert_eq!(decoded.get_str(99), Some("from-the-future"));
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = claims().encode();
        let mut head = claims();
        head.remove(5);
        let last_entry = head.encode().len();

        // Every cut inside the final (nested) entry must be rejected.
        for cut in last_entry + 1..bytes.len() {
            let err = Values::decode(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, CodecError::MalformedEncoding { .. }),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn test_truncated_length() {
        // tag 1, kind string, length varint with continuation bit and no more bytes
        let err = Values::decode(&[0x01, 0x01, 0x80]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding { .. }));
    }

    #[test]
    fn test_unknown_kind() {
        let err = Values::decode(&[0x01, 0x09, 0x00]).unwrap_err();
        assert_eq!(err, CodecError::UnknownKind { kind: 9, offset: 1 });
    }

    #[test]
    fn test_out_of_order_and_duplicate_tags() {
        let dup = [0x01, 0x04, 0x01, 0x01, 0x01, 0x04, 0x01, 0x00];
        assert!(matches!(
            Values::decode(&dup),
            Err(CodecError::MalformedEncoding { .. })
        ));

        let unordered = [0x02, 0x04, 0x01, 0x01, 0x01, 0x04, 0x01, 0x00];
        assert!(matches!(
            Values::decode(&unordered),
            Err(CodecError::MalformedEncoding { .. })
        ));
    }

    #[test]
    fn test_non_minimal_varint_rejected() {
        // tag 1 encoded as 0x81 0x00
        let err = Values::decode(&[0x81, 0x00, 0x04, 0x01, 0x01]).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEncoding { .. }));
    }

    #[test]
    fn test_invalid_scalar_payloads() {
        let bad_bool = [0x01, 0x04, 0x01, 0x02];
        assert!(Values::decode(&bad_bool).is_err());

        let short_uint = [0x01, 0x03, 0x02, 0x00, 0x01];
        assert!(Values::decode(&short_uint).is_err());

        let bad_utf8 = [0x01, 0x01, 0x02, 0xc3, 0x28];
        assert!(Values::decode(&bad_utf8).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut values = Values::new().with(1, true);
        for _ in 0..5 {
            values = Values::new().with(1, values);
        }
        let bytes = values.encode();

        let limits = DecodeLimits {
            max_depth: 4,
            ..DecodeLimits::default()
        };
        assert_eq!(
            Values::decode_with(&bytes, limits),
            Err(CodecError::DepthExceeded { max: 4 })
        );

        let limits = DecodeLimits {
            max_depth: 5,
            ..DecodeLimits::default()
        };
        assert_eq!(Values::decode_with(&bytes, limits).unwrap(), values);
    }

    #[test]
    fn test_size_limit() {
        let values = Values::new().with(1, vec![0u8; 128]);
        let bytes = values.encode();
        let limits = DecodeLimits {
            max_size: 64,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            Values::decode_with(&bytes, limits),
            Err(CodecError::TooLarge { max: 64, .. })
        ));
    }

    #[test]
    fn test_empty_input_is_empty_structure() {
        assert!(Values::decode(&[]).unwrap().is_empty());
    }
}
