//! The eexec stream cipher used by encrypted program sections.
//!
//! The ciphertext between `eexec` and `cleartomark` is ASCII-hex; decoding
//! it and running the cipher with the standard seed yields cleartext
//! PostScript, of which the first four (random) bytes are discarded.

use crate::error::{PostScriptError, PsResult};

const C1: u16 = 52845;
const C2: u16 = 22719;

pub const EEXEC_SEED: u16 = 4330;

/// Number of leading random bytes in the cleartext
pub const LEAD_BYTES: usize = 4;

pub fn decrypt(cipher: &[u8], seed: u16) -> Vec<u8> {
    let mut r = seed;
    let mut plain = Vec::with_capacity(cipher.len());

    for &c in cipher {
        plain.push(c ^ (r >> 8) as u8);
        r = u16::from(c).wrapping_add(r).wrapping_mul(C1).wrapping_add(C2);
    }

    plain
}

pub fn encrypt(plain: &[u8], seed: u16) -> Vec<u8> {
    let mut r = seed;
    let mut cipher = Vec::with_capacity(plain.len());

    for &p in plain {
        let c = p ^ (r >> 8) as u8;
        cipher.push(c);
        r = u16::from(c).wrapping_add(r).wrapping_mul(C1).wrapping_add(C2);
    }

    cipher
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// ASCII-hex decode, skipping whitespace; an odd trailing nibble is padded
/// with zero
pub fn decode_hex(span: &[u8]) -> PsResult<Vec<u8>> {
    let mut out = Vec::with_capacity(span.len() / 2);
    let mut high: Option<u8> = None;

    for &b in span {
        if b.is_ascii_whitespace() || b == b'\0' {
            continue;
        }

        let nibble = match hex_value(b) {
            Some(n) => n,
            None => anyhow::bail!(PostScriptError::SyntaxError),
        };

        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }

    if let Some(h) = high {
        out.push(h << 4);
    }

    Ok(out)
}

/// Decode an encrypted span into cleartext source: hex decode, decrypt with
/// the standard seed, drop the lead bytes. Type 1 programs pad the encrypted
/// section with a long run of ASCII zeros before `cleartomark`; those are
/// not ciphertext and are trimmed first.
pub fn decode_section(span: &[u8]) -> PsResult<Vec<u8>> {
    let mut end = span.len();
    loop {
        while end > 0 && (span[end - 1].is_ascii_whitespace() || span[end - 1] == b'\0') {
            end -= 1;
        }

        let mut zeros = end;
        while zeros > 0 && span[zeros - 1] == b'0' {
            zeros -= 1;
        }

        // a line of padding zeros; anything shorter is ciphertext
        if end - zeros >= 32 {
            end = zeros;
        } else {
            break;
        }
    }

    let cipher = decode_hex(&span[..end])?;
    let mut plain = decrypt(&cipher, EEXEC_SEED);

    if plain.len() < LEAD_BYTES {
        anyhow::bail!(PostScriptError::SyntaxError);
    }

    plain.drain(..LEAD_BYTES);

    Ok(plain)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decrypt_then_encrypt_is_identity() {
        let cipher: Vec<u8> = (0..=255).collect();

        let plain = decrypt(&cipher, EEXEC_SEED);
        assert_eq!(encrypt(&plain, EEXEC_SEED), cipher);
    }

    #[test]
    fn encrypt_then_decrypt_is_identity() {
        let plain = b"/x 42 def x =";

        let cipher = encrypt(plain, EEXEC_SEED);
        assert_eq!(decrypt(&cipher, EEXEC_SEED), plain);
    }

    #[test]
    fn hex_decode_skips_whitespace_and_pads() {
        assert_eq!(decode_hex(b"48 65\n6c6C6f").unwrap(), b"Hello");
        assert_eq!(decode_hex(b"ABC").unwrap(), [0xab, 0xc0]);
        assert!(decode_hex(b"4g").is_err());
    }

    #[test]
    fn section_round_trip() {
        let source = b"/hidden 7 def ";

        let mut plain = b"ABCD".to_vec();
        plain.extend_from_slice(source);

        let cipher = encrypt(&plain, EEXEC_SEED);

        let mut hex = Vec::new();
        for b in cipher {
            hex.extend_from_slice(format!("{:02x}", b).as_bytes());
        }
        // trailing zero padding the way font programs write it
        for _ in 0..4 {
            hex.push(b'\n');
            hex.extend_from_slice(&[b'0'; 64]);
        }

        assert_eq!(decode_section(&hex).unwrap(), source);
    }
}
