//! Secret scalars for the Montgomery ladder.

use super::{CurveError, COFACTOR};
use crate::{encode, Card25519Error};
use crypto_bigint::{Encoding, U256};
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

/// The length of an encoded scalar, in bytes.
pub const SCALAR_LENGTH: usize = encode::ENCODED_LENGTH;

/// A 256-bit unsigned integer by which a point can be multiplied.
///
/// Unlike an element of a scalar field, a `Scalar` is not reduced modulo anything: X25519 and the
/// token both operate on the raw integer. The value is wiped from memory when it is dropped, and
/// its `Debug` output does not include it. Comparison is constant-time.
#[derive(Clone)]
pub struct Scalar(U256);

impl Scalar {
    /// Create a scalar from a small integer.
    pub const fn from_u64(n: u64) -> Self {
        Self(U256::from_u64(n))
    }

    /// Create a scalar from a 256-bit integer.
    pub fn from_uint(n: &U256) -> Self {
        Self(*n)
    }

    /// Decode a 32-byte little-endian scalar, the Curve25519 convention.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, Card25519Error> {
        encode::decode_le(bytes).map(Self)
    }

    /// Decode a 32-byte big-endian scalar, the token's convention.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, Card25519Error> {
        encode::decode_be(bytes).map(Self)
    }

    /// Generate a uniformly random 256-bit scalar.
    ///
    /// The result must be [clamped](Self::clamp) before it is used as an X25519 private key.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = Zeroizing::new([0u8; SCALAR_LENGTH]);
        rng.fill_bytes(&mut bytes[..]);
        Self(U256::from_le_bytes(*bytes))
    }

    /// Little-endian encoding of this scalar, wiped when dropped.
    pub fn to_le_bytes(&self) -> Zeroizing<[u8; SCALAR_LENGTH]> {
        Zeroizing::new(self.0.to_le_bytes())
    }

    /// Big-endian encoding of this scalar, wiped when dropped.
    pub fn to_be_bytes(&self) -> Zeroizing<[u8; SCALAR_LENGTH]> {
        Zeroizing::new(self.0.to_be_bytes())
    }

    /// Clamp this scalar, as X25519 does with every private key.
    pub fn clamp(&self) -> ClampedScalar {
        ClampedScalar(Self(encode::clamp(&self.0)))
    }

    /// Whether clamping this scalar would leave it unchanged.
    pub fn is_clamped(&self) -> bool {
        bool::from(encode::clamp(&self.0).ct_eq(&self.0))
    }

    /// Multiply this scalar by the cofactor 8, discarding the bits shifted out at the top.
    pub fn mul_by_cofactor(&self) -> Self {
        Self(self.0.shl_vartime(COFACTOR.trailing_zeros() as usize))
    }
}

impl Drop for Scalar {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Scalar(U256)")
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Scalar {}

/// A scalar in clamped form: bits 0, 1, 2 and 255 clear, bit 254 set.
///
/// Every clamped scalar is a multiple of the cofactor, so it can be handed to the token as
/// `s / 8` without loss. A `ClampedScalar` can only be produced by [`Scalar::clamp`], or by
/// checked conversion from a [`Scalar`] which is already clamped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClampedScalar(Scalar);

impl ClampedScalar {
    /// Borrow the underlying scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// Divide this scalar by the cofactor 8.
    ///
    /// This is the form in which the token stores a private key: `s / 8` lies in
    /// `[2^251, 2^252)`, below the order of the prime-order subgroup.
    pub fn div_by_cofactor(&self) -> Scalar {
        Scalar((self.0).0.shr_vartime(COFACTOR.trailing_zeros() as usize))
    }

    /// Little-endian encoding of this scalar, wiped when dropped.
    pub fn to_le_bytes(&self) -> Zeroizing<[u8; SCALAR_LENGTH]> {
        self.0.to_le_bytes()
    }
}

impl TryFrom<Scalar> for ClampedScalar {
    type Error = Card25519Error;

    fn try_from(scalar: Scalar) -> Result<Self, Self::Error> {
        if !scalar.is_clamped() {
            return Err(CurveError::ScalarNotClamped.into());
        }

        Ok(Self(scalar))
    }
}
