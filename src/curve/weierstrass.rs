//! Conversion between Curve25519 and the short Weierstrass curve Wei25519.
//!
//! Substituting `x = u + A/3` in the Montgomery equation `v^2 = u^3 + Au^2 + u` gives the short
//! Weierstrass form `y^2 = x^3 + ax + b`, with `a = (3 - A^2) / 3` and `b = (2A^3 - 9A) / 27`.
//! Since `B = 1` for Curve25519, `y = v` and the x-coordinates differ only by the constant `A/3`.
//! This is a group isomorphism, so scalar multiplication on one curve can be carried out on the
//! other and mapped back.

use super::{MontgomeryPoint, CURVE};
use crate::field::{FieldElement, MODULUS};
use crate::{encode, Card25519Error};
use crypto_bigint::{Encoding, U256};

/// The length of an encoded Weierstrass coordinate, in bytes.
pub const COORDINATE_LENGTH: usize = encode::ENCODED_LENGTH;

/// The length of an encoded affine Weierstrass point, in bytes.
pub const POINT_LENGTH: usize = 2 * COORDINATE_LENGTH;

/// An affine point on Wei25519, encoded as the big-endian `x` coordinate followed by the
/// big-endian `y` coordinate.
///
/// This is the layout in which the token accepts a peer's public key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "use-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeierstrassPoint(
    #[cfg_attr(feature = "use-serde", serde(with = "serde_big_array::BigArray"))]
    pub  [u8; POINT_LENGTH],
);

impl WeierstrassPoint {
    /// Encode the affine point `(x, y)`.
    pub fn from_coordinates(x: &FieldElement, y: &FieldElement) -> Self {
        let mut point = [0u8; POINT_LENGTH];
        point[..COORDINATE_LENGTH].copy_from_slice(&x.to_be_bytes());
        point[COORDINATE_LENGTH..].copy_from_slice(&y.to_be_bytes());
        Self(point)
    }

    /// Create a point from a slice, which must be exactly [`POINT_LENGTH`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Card25519Error> {
        let point = bytes
            .try_into()
            .map_err(|_| Card25519Error::IncorrectSliceLength(POINT_LENGTH, bytes.len()))?;
        Ok(Self(point))
    }

    fn coordinate(&self, index: usize) -> U256 {
        let mut bytes = [0u8; COORDINATE_LENGTH];
        bytes.copy_from_slice(&self.0[index * COORDINATE_LENGTH..(index + 1) * COORDINATE_LENGTH]);
        U256::from_be_bytes(bytes)
    }

    /// The x-coordinate, reduced modulo `p`.
    pub fn x(&self) -> FieldElement {
        FieldElement::from_uint(&self.coordinate(0))
    }

    /// The y-coordinate, reduced modulo `p`.
    pub fn y(&self) -> FieldElement {
        FieldElement::from_uint(&self.coordinate(1))
    }

    /// Whether both coordinates are canonical and satisfy `y^2 = x^3 + ax + b`.
    pub fn is_on_curve(&self) -> bool {
        if self.coordinate(0) >= MODULUS || self.coordinate(1) >= MODULUS {
            return false;
        }

        let x = self.x();
        self.y().square() == weierstrass_rhs(&x)
    }

    /// The Curve25519 point corresponding to this point.
    pub fn to_montgomery(&self) -> MontgomeryPoint {
        MontgomeryPoint::from_field(&weierstrass_to_montgomery(&self.x()))
    }
}

impl MontgomeryPoint {
    /// The Wei25519 point corresponding to this point.
    ///
    /// See [`montgomery_to_weierstrass`].
    pub fn to_weierstrass(&self) -> Result<WeierstrassPoint, Card25519Error> {
        montgomery_to_weierstrass(&self.to_field())
    }
}

fn weierstrass_rhs(x: &FieldElement) -> FieldElement {
    x.square() * *x + CURVE.a_w * *x + CURVE.b_w
}

/// Map a Wei25519 x-coordinate to the corresponding Curve25519 u-coordinate, `u = Bx - A/3`.
pub fn weierstrass_to_montgomery(x: &FieldElement) -> FieldElement {
    CURVE.b_m * *x - CURVE.a_m_over_three
}

/// Map a Curve25519 u-coordinate to the corresponding Wei25519 x-coordinate, `x = u + A/3`.
///
/// Unlike [`montgomery_to_weierstrass`], this does not check that the point lies on the curve.
pub fn montgomery_to_weierstrass_x(u: &FieldElement) -> FieldElement {
    *u + CURVE.a_m_over_three
}

/// Map a Curve25519 u-coordinate to an affine Wei25519 point.
///
/// The y-coordinate is recovered by square root; either of the two roots may be returned, and no
/// particular sign is enforced. If `u` is not the u-coordinate of a point on Curve25519 (for
/// example, a point on the quadratic twin), there is no square root, and
/// [`FieldError::NoSquareRoot`](crate::field::FieldError::NoSquareRoot) is returned.
pub fn montgomery_to_weierstrass(u: &FieldElement) -> Result<WeierstrassPoint, Card25519Error> {
    let x = montgomery_to_weierstrass_x(u);
    let y = weierstrass_rhs(&x).sqrt()?;

    Ok(WeierstrassPoint::from_coordinates(&x, &y))
}

#[cfg(test)]
mod tests {
    use super::{
        montgomery_to_weierstrass, montgomery_to_weierstrass_x, weierstrass_to_montgomery,
        WeierstrassPoint, POINT_LENGTH,
    };
    use crate::curve::{MontgomeryPoint, Scalar, CURVE, MONTGOMERY_A};
    use crate::field::{FieldElement, FieldError, Legendre};
    use crate::random::SodiumRng;
    use crate::Card25519Error;

    #[test]
    fn base_point_maps_to_generator() -> Result<(), Card25519Error> {
        let generator = MontgomeryPoint::BASE_POINT.to_weierstrass()?;

        assert_eq!(generator.x(), CURVE.generator_x);
        assert!(generator.y() == CURVE.generator_y || generator.y() == -CURVE.generator_y);
        assert!(generator.is_on_curve());
        assert_eq!(generator.to_montgomery(), MontgomeryPoint::BASE_POINT);

        Ok(())
    }

    #[test]
    fn round_trip() -> Result<(), Card25519Error> {
        for _ in 0..20 {
            let point = MontgomeryPoint::BASE_POINT
                .scalar_mult(&Scalar::generate(&mut SodiumRng).clamp());

            let w = point.to_weierstrass()?;
            assert!(w.is_on_curve());
            assert_eq!(w.to_montgomery(), point);

            let x_w = w.x();
            assert_eq!(
                montgomery_to_weierstrass_x(&weierstrass_to_montgomery(&x_w)),
                x_w
            );

            // the negated point has the same x-coordinate
            let negated = WeierstrassPoint::from_coordinates(&x_w, &-w.y());
            assert!(negated.is_on_curve());
            assert_eq!(negated.to_montgomery(), point);
        }

        Ok(())
    }

    #[test]
    fn twist_points_have_no_root() {
        let a = FieldElement::from_u64(MONTGOMERY_A);
        let mut found = 0;

        for n in 2..200 {
            let u = FieldElement::from_u64(n);
            let rhs = u.square() * u + a * u.square() + u;
            if rhs.legendre() == Legendre::NonResidue {
                assert_eq!(
                    montgomery_to_weierstrass(&u),
                    Err(FieldError::NoSquareRoot.into())
                );
                found += 1;
            } else {
                assert!(montgomery_to_weierstrass(&u).is_ok());
            }
        }

        assert!(found > 0);
    }

    #[test]
    fn rejects_off_curve_encodings() -> Result<(), Card25519Error> {
        let generator = MontgomeryPoint::BASE_POINT.to_weierstrass()?;

        let mut tweaked = generator;
        tweaked.0[POINT_LENGTH - 1] ^= 1;
        assert!(!tweaked.is_on_curve());

        let mut non_canonical = [0xffu8; POINT_LENGTH];
        non_canonical[0] = 0x7f;
        assert!(!WeierstrassPoint(non_canonical).is_on_curve());

        assert_eq!(
            WeierstrassPoint::from_slice(&generator.0[..32]),
            Err(Card25519Error::IncorrectSliceLength(64, 32))
        );

        Ok(())
    }
}
