//! Fixed-width integer encodings.
//!
//! Two byte orders meet in this crate. Curve25519 (RFC 7748) encodes scalars and u-coordinates as
//! 32-byte *little-endian* strings, while the token's APDU interface transfers every integer as a
//! 32-byte *big-endian* string, most significant byte first. All decoding functions insist on
//! exactly 32 bytes of input: a short or long buffer is reported as
//! [`Card25519Error::IncorrectSliceLength`], never silently truncated or padded.
//!
//! # Examples
//! ```rust
//! use card25519::encode;
//!
//! let mut bytes = [0u8; 32];
//! bytes[31] = 0x09;
//! let n = encode::decode_be(&bytes).unwrap();
//! assert_eq!(encode::encode_le(&n)[0], 0x09);
//!
//! assert!(encode::decode_le(&bytes[..31]).is_err());
//! ```

use crate::Card25519Error;
use crypto_bigint::{Encoding, U256};

/// The length of an encoded integer, in bytes.
pub const ENCODED_LENGTH: usize = 32;

fn fixed_width(bytes: &[u8]) -> Result<[u8; ENCODED_LENGTH], Card25519Error> {
    bytes
        .try_into()
        .map_err(|_| Card25519Error::IncorrectSliceLength(ENCODED_LENGTH, bytes.len()))
}

/// Decode a 32-byte little-endian integer.
pub fn decode_le(bytes: &[u8]) -> Result<U256, Card25519Error> {
    Ok(U256::from_le_bytes(fixed_width(bytes)?))
}

/// Encode `n` as a 32-byte little-endian integer.
pub fn encode_le(n: &U256) -> [u8; ENCODED_LENGTH] {
    n.to_le_bytes()
}

/// Decode a 32-byte big-endian integer.
pub fn decode_be(bytes: &[u8]) -> Result<U256, Card25519Error> {
    Ok(U256::from_be_bytes(fixed_width(bytes)?))
}

/// Encode `n` as a 32-byte big-endian integer.
pub fn encode_be(n: &U256) -> [u8; ENCODED_LENGTH] {
    n.to_be_bytes()
}

/// Clamp a little-endian scalar encoding in place.
///
/// Clears bits 0, 1, 2 and 255, and sets bit 254.
pub(crate) fn clamp_le_bytes(bytes: &mut [u8; ENCODED_LENGTH]) {
    bytes[0] &= 0b1111_1000;
    bytes[31] &= 0b0111_1111;
    bytes[31] |= 0b0100_0000;
}

/// Clamp a scalar in the manner required by Curve25519.
///
/// The result is a multiple of 8 (the curve's cofactor) in the range `[2^254, 2^255)`, so every
/// clamped scalar has the same bit-length. Clamping is idempotent.
pub fn clamp(n: &U256) -> U256 {
    let mut bytes = n.to_le_bytes();
    clamp_le_bytes(&mut bytes);
    U256::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::{clamp, decode_be, decode_le, encode_be, encode_le};
    use crate::{random, Card25519Error};
    use crypto_bigint::U256;

    #[test]
    fn byte_orders() -> Result<(), Card25519Error> {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }

        let le = decode_le(&bytes)?;
        let be = decode_be(&bytes)?;
        assert_eq!(
            le,
            U256::from_be_hex("1f1e1d1c1b1a191817161514131211100f0e0d0c0b0a09080706050403020100")
        );
        assert_eq!(
            be,
            U256::from_be_hex("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f")
        );

        let mut reversed = bytes;
        reversed.reverse();
        assert_eq!(encode_be(&le), reversed);
        assert_eq!(encode_le(&be), reversed);

        Ok(())
    }

    #[test]
    fn encodings_invert_decodings() -> Result<(), Card25519Error> {
        for _ in 0..100 {
            let mut bytes = [0u8; 32];
            random::fill_random(&mut bytes)?;
            assert_eq!(encode_be(&decode_be(&bytes)?), bytes);
            assert_eq!(encode_le(&decode_le(&bytes)?), bytes);
        }

        Ok(())
    }

    #[test]
    fn wrong_lengths_rejected() {
        for len in [0, 1, 31, 33, 64] {
            let bytes = vec![0u8; len];
            assert_eq!(
                decode_le(&bytes),
                Err(Card25519Error::IncorrectSliceLength(32, len))
            );
            assert_eq!(
                decode_be(&bytes),
                Err(Card25519Error::IncorrectSliceLength(32, len))
            );
        }
    }

    #[test]
    fn clamp_vector() -> Result<(), Card25519Error> {
        let scalar = decode_le(&[
            0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2,
            0x66, 0x45, 0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5,
            0x1d, 0xb9, 0x2c, 0x2a,
        ])?;
        let clamped = encode_le(&clamp(&scalar));

        assert_eq!(clamped[0], 0x70);
        assert_eq!(clamped[31], 0x6a);
        assert_eq!(&clamped[1..31], &encode_le(&scalar)[1..31]);

        assert_eq!(clamp(&U256::ZERO), U256::ONE.shl_vartime(254));
        assert_eq!(clamp(&U256::MAX), U256::MAX.shr_vartime(1).wrapping_sub(&U256::from_u8(7)));

        Ok(())
    }

    #[test]
    fn clamp_is_idempotent() -> Result<(), Card25519Error> {
        for _ in 0..100 {
            let mut bytes = [0u8; 32];
            random::fill_random(&mut bytes)?;
            let once = clamp(&decode_le(&bytes)?);
            assert_eq!(clamp(&once), once);
        }

        Ok(())
    }
}
