//! The Montgomery ladder on Curve25519.

use super::{ClampedScalar, Scalar, COFACTOR, MONTGOMERY_A, MONTGOMERY_BASE_U};
use crate::field::FieldElement;
use crate::{encode, Card25519Error};
use crypto_bigint::{Encoding, U256};
use subtle::{Choice, ConditionallySelectable};
use zeroize::Zeroizing;

/// The length of an encoded u-coordinate, in bytes.
pub const POINT_LENGTH: usize = 32;

const A: FieldElement = FieldElement::from_u64(MONTGOMERY_A);
const FOUR: FieldElement = FieldElement::from_u64(4);

/// A point on Curve25519, represented by its u-coordinate, encoded little-endian as in RFC 7748.
///
/// The v-coordinate is never needed: the ladder works on u alone, and so does X25519.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "use-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MontgomeryPoint(pub [u8; POINT_LENGTH]);

impl MontgomeryPoint {
    /// The standard base point, `u = 9`.
    pub const BASE_POINT: Self = {
        let mut u = [0u8; POINT_LENGTH];
        u[0] = MONTGOMERY_BASE_U as u8;
        Self(u)
    };

    /// Encode a field element as a point.
    pub fn from_field(u: &FieldElement) -> Self {
        Self(u.to_le_bytes())
    }

    /// Decode this point's u-coordinate.
    ///
    /// As required by RFC 7748, the most significant bit is ignored and non-canonical values are
    /// reduced modulo `p`.
    pub fn to_field(&self) -> FieldElement {
        let mut u = self.0;
        u[31] &= 0b0111_1111;
        FieldElement::from_uint(&U256::from_le_bytes(u))
    }

    /// Create a point from a slice, which must be exactly [`POINT_LENGTH`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Card25519Error> {
        let u = bytes
            .try_into()
            .map_err(|_| Card25519Error::IncorrectSliceLength(POINT_LENGTH, bytes.len()))?;
        Ok(Self(u))
    }

    /// Multiply this point by a clamped scalar. This is the X25519 function.
    pub fn scalar_mult(&self, n: &ClampedScalar) -> Self {
        self.scalar_mult_no_clamp(n.as_scalar())
    }

    /// Multiply this point by an arbitrary scalar, without clamping it.
    pub fn scalar_mult_no_clamp(&self, n: &Scalar) -> Self {
        Self::from_field(&scalar_multiply(n, &self.to_field()))
    }

    /// Multiply this point by the cofactor, 8.
    ///
    /// The token computes on the prime-order subgroup with `s / 8` in place of the clamped
    /// scalar `s`; multiplying its results by 8 recovers what X25519 with `s` yields.
    pub fn mul_by_cofactor(&self) -> Self {
        self.scalar_mult_no_clamp(&Scalar::from_u64(COFACTOR))
    }
}

/// A point in projective `(X : Z)` form, with affine `u = X / Z`.
#[derive(Clone, Copy, Debug)]
struct ProjectivePoint {
    x: FieldElement,
    z: FieldElement,
}

impl ProjectivePoint {
    /// The point at infinity.
    const IDENTITY: Self = Self {
        x: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    fn double(&self) -> Self {
        let xx = self.x.square();
        let zz = self.z.square();
        let xz = self.x * self.z;

        Self {
            x: (xx - zz).square(),
            z: FOUR * xz * (xx + A * xz + zz),
        }
    }

    /// Compute `self + other`, given `diff = other - self`.
    fn differential_add(&self, other: &Self, diff: &Self) -> Self {
        let u = other.x * self.x - other.z * self.z;
        let v = other.x * self.z - other.z * self.x;

        Self {
            x: FOUR * u.square() * diff.z,
            z: FOUR * v.square() * diff.x,
        }
    }

    /// The affine u-coordinate. The point at infinity maps to 0.
    fn to_affine(self) -> FieldElement {
        self.x * self.z.invert()
    }
}

impl ConditionallySelectable for ProjectivePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

/// Compute the u-coordinate of `n * P`, where `u` is the u-coordinate of `P`.
///
/// The ladder walks all 256 bits of `n` from the top, performing one differential addition and one
/// doubling per bit, with the two running points exchanged by constant-time conditional swap. The
/// sequence of field operations is therefore independent of `n`. If `n * P` is the point at
/// infinity, 0 is returned, as in RFC 7748.
pub fn scalar_multiply(n: &Scalar, u: &FieldElement) -> FieldElement {
    let bits = n.to_le_bytes();
    let base = ProjectivePoint {
        x: *u,
        z: FieldElement::ONE,
    };

    let mut r0 = ProjectivePoint::IDENTITY;
    let mut r1 = base;
    let mut swapped = Choice::from(0);

    for i in (0..POINT_LENGTH * 8).rev() {
        let bit = Choice::from((bits[i >> 3] >> (i & 7)) & 1);
        ProjectivePoint::conditional_swap(&mut r0, &mut r1, swapped ^ bit);
        swapped = bit;

        r1 = r0.differential_add(&r1, &base);
        r0 = r0.double();
    }
    ProjectivePoint::conditional_swap(&mut r0, &mut r1, swapped);

    r0.to_affine()
}

/// The X25519 function from RFC 7748.
///
/// `k` is clamped, and the top bit of `u` masked, before multiplying.
pub fn x25519(k: &[u8; POINT_LENGTH], u: &[u8; POINT_LENGTH]) -> [u8; POINT_LENGTH] {
    let mut k_bytes = Zeroizing::new(*k);
    encode::clamp_le_bytes(&mut k_bytes);
    let k = Scalar::from_uint(&U256::from_le_bytes(*k_bytes));

    MontgomeryPoint(*u).scalar_mult_no_clamp(&k).0
}
