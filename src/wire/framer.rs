// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! Fixed 9-byte PDU header framing: `magic | protobufLength:u32be |
//! valueLength:u32be`, followed by the protobuf command envelope and an
//! opaque value payload.
//!
//! Mirrors the split the teacher crate draws between a fixed
//! Basic-Header-Segment and a variable-length Data-Segment
//! (`models::common::{HEADER_LEN, BasicHeaderSegment}`), but for the much
//! simpler Kinetic header: no AHS, no digests, just the three fixed fields.

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, U32, byteorder::big_endian};

/// First byte of every PDU header.
pub const MAGIC: u8 = b'F';
/// Kinetic's cap on the value payload.
pub const MAX_VALUE: usize = 1 << 20;
/// Kinetic's cap on the protobuf command envelope.
pub const MAX_PROTO: usize = 1 << 20;
/// `magic(1) + protobufLength(4) + valueLength(4)`.
pub const HEADER_LEN: usize = 9;

type U32Be = U32<big_endian::BigEndian>;

#[derive(Debug, Clone, Copy, KnownLayout, Immutable, IntoBytes, FromBytes)]
#[repr(C)]
struct RawHeader {
    magic: u8,
    protobuf_length: U32Be,
    value_length: U32Be,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum FrameError {
    #[error("bad magic byte: expected 0x{MAGIC:02x}, got 0x{0:02x}")]
    BadMagic(u8),
    #[error("protobufLength {0} exceeds MAX_PROTO ({MAX_PROTO})")]
    ProtoTooLarge(u32),
    #[error("valueLength {0} exceeds MAX_VALUE ({MAX_VALUE})")]
    ValueTooLarge(u32),
    #[error("short header: need {HEADER_LEN} bytes, got {0}")]
    ShortHeader(usize),
    #[error("short body: need {need} bytes, got {got}")]
    ShortBody { need: usize, got: usize },
}

/// A decoded PDU body: the serialized command envelope plus its value
/// payload. The fixed header is not retained once decoding has validated
/// it — callers only ever need the lengths to size their reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub protobuf: Bytes,
    pub value: Bytes,
}

/// Lengths extracted from a validated 9-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub protobuf_len: u32,
    pub value_len: u32,
}

/// Validate and parse a 9-byte header already read off the wire.
pub fn decode_header(buf: &[u8]) -> Result<FrameHeader, FrameError> {
    if buf.len() != HEADER_LEN {
        return Err(FrameError::ShortHeader(buf.len()));
    }
    let raw = RawHeader::read_from_bytes(buf).map_err(|_| FrameError::ShortHeader(buf.len()))?;
    if raw.magic != MAGIC {
        return Err(FrameError::BadMagic(raw.magic));
    }
    let protobuf_len = raw.protobuf_length.get();
    if protobuf_len as usize > MAX_PROTO {
        return Err(FrameError::ProtoTooLarge(protobuf_len));
    }
    let value_len = raw.value_length.get();
    if value_len as usize > MAX_VALUE {
        return Err(FrameError::ValueTooLarge(value_len));
    }
    Ok(FrameHeader {
        protobuf_len,
        value_len,
    })
}

/// Build the 9-byte header for a frame carrying `protobuf_len` bytes of
/// command envelope and `value_len` bytes of value.
pub fn encode_header(protobuf_len: u32, value_len: u32) -> Result<[u8; HEADER_LEN], FrameError> {
    if protobuf_len as usize > MAX_PROTO {
        return Err(FrameError::ProtoTooLarge(protobuf_len));
    }
    if value_len as usize > MAX_VALUE {
        return Err(FrameError::ValueTooLarge(value_len));
    }
    let raw = RawHeader {
        magic: MAGIC,
        protobuf_length: U32Be::new(protobuf_len),
        value_length: U32Be::new(value_len),
    };
    let mut out = [0u8; HEADER_LEN];
    out.copy_from_slice(raw.as_bytes());
    Ok(out)
}

/// Encode a complete, self-contained frame: header + protobuf + value, in
/// one contiguous buffer. Used by callers that don't need vectored writes
/// (tests, and anyone framing a PDU before handing it to a transport that
/// wants a single buffer).
pub fn encode(protobuf: &[u8], value: &[u8]) -> Result<Bytes, FrameError> {
    let header = encode_header(protobuf.len() as u32, value.len() as u32)?;
    let mut buf = BytesMut::with_capacity(HEADER_LEN + protobuf.len() + value.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(protobuf);
    buf.extend_from_slice(value);
    Ok(buf.freeze())
}

/// Decode a complete, self-contained frame produced by [`encode`].
pub fn decode(buf: &[u8]) -> Result<Pdu, FrameError> {
    if buf.len() < HEADER_LEN {
        return Err(FrameError::ShortHeader(buf.len()));
    }
    let header = decode_header(&buf[..HEADER_LEN])?;
    let protobuf_len = header.protobuf_len as usize;
    let value_len = header.value_len as usize;
    let need = HEADER_LEN + protobuf_len + value_len;
    if buf.len() < need {
        return Err(FrameError::ShortBody {
            need,
            got: buf.len(),
        });
    }
    let protobuf = Bytes::copy_from_slice(&buf[HEADER_LEN..HEADER_LEN + protobuf_len]);
    let value = Bytes::copy_from_slice(&buf[HEADER_LEN + protobuf_len..need]);
    Ok(Pdu { protobuf, value })
}
