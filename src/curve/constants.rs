//! Curve parameters for Curve25519 and its short Weierstrass twin, Wei25519.

use crate::field::FieldElement;
use crypto_bigint::U256;
use lazy_static::lazy_static;

/// The Montgomery coefficient `A` in `By^2 = x^3 + Ax^2 + x`.
pub const MONTGOMERY_A: u64 = 486662;

/// The Montgomery coefficient `B` in `By^2 = x^3 + Ax^2 + x`.
pub const MONTGOMERY_B: u64 = 1;

/// The u-coordinate of the Curve25519 base point.
pub const MONTGOMERY_BASE_U: u64 = 9;

/// The coefficient `a` in the Wei25519 equation `y^2 = x^3 + ax + b`, equal to `(3 - A^2) / 3`.
pub const WEIERSTRASS_A: U256 =
    U256::from_be_hex("2aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa984914a144");

/// The coefficient `b` in the Wei25519 equation `y^2 = x^3 + ax + b`, equal to `(2A^3 - 9A) / 27`.
pub const WEIERSTRASS_B: U256 =
    U256::from_be_hex("7b425ed097b425ed097b425ed097b425ed097b425ed097b4260b5e9c7710c864");

/// The x-coordinate of the Wei25519 generator, the image of the Curve25519 base point.
pub const GENERATOR_X: U256 =
    U256::from_be_hex("2aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaad245a");

/// The y-coordinate of the Wei25519 generator.
pub const GENERATOR_Y: U256 =
    U256::from_be_hex("20ae19a1b8a086b4e01edd2c7748d14c923d4d7e6d7c61b229e9c5a27eced3d9");

/// The order of the prime-order subgroup generated by the base point,
/// `2^252 + 27742317777372353535851937790883648493`.
pub const ORDER: U256 =
    U256::from_be_hex("1000000000000000000000000000000014def9dea2f79cd65812631a5cf5d3ed");

/// The number of points on the curve is `COFACTOR * ORDER`.
pub const COFACTOR: u64 = 8;

/// Field-element forms of the curve coefficients, and values derived from them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CurveParameters {
    /// Montgomery `A`.
    pub a_m: FieldElement,
    /// Montgomery `B`.
    pub b_m: FieldElement,
    /// Weierstrass `a`.
    pub a_w: FieldElement,
    /// Weierstrass `b`.
    pub b_w: FieldElement,
    /// `A / 3 mod p`, the x-offset between the two models.
    pub a_m_over_three: FieldElement,
    /// Wei25519 generator, x-coordinate.
    pub generator_x: FieldElement,
    /// Wei25519 generator, y-coordinate.
    pub generator_y: FieldElement,
}

lazy_static! {
    /// The parameters of Curve25519 and Wei25519, computed once on first use.
    pub static ref CURVE: CurveParameters = {
        let a_m = FieldElement::from_u64(MONTGOMERY_A);

        CurveParameters {
            a_m,
            b_m: FieldElement::from_u64(MONTGOMERY_B),
            a_w: FieldElement::from_uint(&WEIERSTRASS_A),
            b_w: FieldElement::from_uint(&WEIERSTRASS_B),
            a_m_over_three: a_m * FieldElement::from_u64(3).invert(),
            generator_x: FieldElement::from_uint(&GENERATOR_X),
            generator_y: FieldElement::from_uint(&GENERATOR_Y),
        }
    };
}
