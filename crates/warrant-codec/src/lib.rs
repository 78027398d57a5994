//! # warrant-codec
//!
//! Self-describing binary encoding for Warrant token payloads.
//!
//! A [`Values`] structure maps small integer tags to typed [`Value`]s. Each
//! encoded entry carries its own tag, a one-byte kind discriminator, a
//! length, and the payload:
//!
//! | Field | Encoding |
//! |-------|----------|
//! | tag | LEB128 varint (`u32` range) |
//! | kind | one byte, see [`Kind`] |
//! | length | LEB128 varint |
//! | payload | `length` bytes |
//!
//! Entries are written in strictly ascending tag order and varints are
//! minimal, so every structure has exactly one encoding. Decoding rejects
//! anything that is not in that canonical form, which means
//! `encode(decode(bytes)) == bytes` for every accepted input.
//!
//! Tags this version does not know about decode like any other entry and
//! survive a round-trip untouched; only an unrecognized *kind* is an error.
//!
//! ```
//! use warrant_codec::{Value, Values};
//!
//! let claims = Values::new()
//!     .with(1, "tenant")
//!     .with(3, 1_700_000_000u64)
//!     .with(5, Values::new().with(1, true));
//!
//! let bytes = claims.encode();
//! assert_eq!(Values::decode(&bytes).unwrap(), claims);
//! assert_eq!(claims.get(5).and_then(Value::as_nested).and_then(|s| s.get_bool(1)), Some(true));
//! ```

pub mod codec;
pub mod error;
pub mod value;

pub use codec::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE, DecodeLimits};
pub use error::CodecError;
pub use value::{Kind, Tag, Value, Values};
