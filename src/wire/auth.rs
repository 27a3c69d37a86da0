// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2026 Andrei Maltsev

//! HMAC-SHA1 authentication over the serialized `Command` bytes.
//!
//! Per the wire protocol, the digest covers exactly the bytes carried in
//! `Message::command_bytes` — the *serialized* `Command` submessage, not a
//! re-serialization of it and not the enclosing envelope. HMAC-SHA1 is the
//! only algorithm the core supports; other `AuthType` values (`PINAUTH`,
//! plain `NOAUTH`) are a future extension point, not implemented here.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// Computes the HMAC-SHA1 digest of `command_bytes` under `key`.
///
/// `Hmac::new_from_slice` accepts a key of any length (it's hashed down if
/// longer than the block size), so this never fails.
pub fn sign(key: &[u8], command_bytes: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha1::new_from_slice(key).expect("HMAC-SHA1 accepts a key of any length");
    mac.update(command_bytes);
    mac.finalize().into_bytes().to_vec()
}

/// Recomputes the digest over `command_bytes` and compares it against
/// `declared` in constant time.
///
/// A length mismatch is not constant-time (there is nothing secret left to
/// protect once the lengths differ), but the byte-wise comparison itself
/// is.
pub fn verify(key: &[u8], command_bytes: &[u8], declared: &[u8]) -> bool {
    let expected = sign(key, command_bytes);
    if expected.len() != declared.len() {
        return false;
    }
    bool::from(expected.ct_eq(declared))
}
