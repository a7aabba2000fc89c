//! Arithmetic over the prime field of order `p = 2^255 - 19`.
//!
//! Both curve models used by this crate, the Montgomery curve Curve25519 and its short Weierstrass
//! twin, are defined over this field. [`FieldElement`] is an integer kept in canonical form, i.e.
//! in `[0, p)`: every operation reduces its result, so no non-canonical value ever escapes.
//! Multiplication and exponentiation run in Montgomery residue form, and none of the operations on
//! [`FieldElement`] branch on the values involved.
//!
//! The module also exposes the generic number-theoretic helpers the curve conversion is built on:
//! [`power_mod`], [`legendre_symbol`] and [`sqrt_mod`], which accept any (odd prime, where
//! relevant) modulus. Those helpers are used on public curve coordinates only.

mod sqrt;

pub use sqrt::sqrt_mod;

use crate::{encode, Card25519Error};
use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{Encoding, NonZero, U256};
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq};
use thiserror::Error;

/// Error type returned if something went wrong in the field module.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum FieldError {
    /// The value is not a quadratic residue, so it has no square root.
    ///
    /// When recovering a Weierstrass `y` coordinate, this means the supplied x-coordinate is not
    /// on the curve (it lies on the quadratic twin), which usually indicates corrupted input.
    #[error("value has no square root modulo p")]
    NoSquareRoot,

    /// Tried to invert zero, which has no multiplicative inverse.
    #[error("zero has no multiplicative inverse")]
    NotInvertible,

    /// The modulus is unsuitable for the requested operation.
    ///
    /// [`power_mod`] rejects a zero modulus; [`legendre_symbol`] and [`sqrt_mod`] require an odd
    /// prime, and report this error if they detect otherwise.
    #[error("invalid modulus")]
    InvalidModulus,
}

/// The field prime, `p = 2^255 - 19`.
pub const MODULUS: U256 =
    U256::from_be_hex("7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffed");

/// `p - 2`, the Fermat inversion exponent.
const INVERSION_EXPONENT: U256 = MODULUS.wrapping_sub(&U256::from_u8(2));

/// `(p - 1) / 2`, the Euler criterion exponent.
const EULER_EXPONENT: U256 = MODULUS.shr_vartime(1);

const FIELD: DynResidueParams<{ U256::LIMBS }> = DynResidueParams::new(&MODULUS);

/// The value of a Legendre symbol `(a | q)`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Legendre {
    /// `a` is a non-zero quadratic residue modulo `q`: `(a | q) = 1`.
    Residue,
    /// `a` is divisible by `q`: `(a | q) = 0`.
    Zero,
    /// `a` is a quadratic non-residue modulo `q`: `(a | q) = -1`.
    NonResidue,
}

impl From<Legendre> for i8 {
    fn from(symbol: Legendre) -> i8 {
        match symbol {
            Legendre::Residue => 1,
            Legendre::Zero => 0,
            Legendre::NonResidue => -1,
        }
    }
}

/// An element of the field of integers modulo `p = 2^255 - 19`, stored in canonical form.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FieldElement(U256);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: Self = Self(U256::ZERO);

    /// The multiplicative identity.
    pub const ONE: Self = Self(U256::ONE);

    /// Create a field element from a small integer.
    ///
    /// Every `u64` is already below `p`, so no reduction is required.
    pub const fn from_u64(n: u64) -> Self {
        Self(U256::from_u64(n))
    }

    /// Create a field element from an arbitrary 256-bit integer, reducing it modulo `p`.
    pub fn from_uint(n: &U256) -> Self {
        // Montgomery conversion and reduction brings any input below 2^256 into [0, p).
        Self(DynResidue::new(n, FIELD).retrieve())
    }

    /// Decode a 32-byte little-endian integer, reducing it modulo `p`.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, Card25519Error> {
        Ok(Self::from_uint(&encode::decode_le(bytes)?))
    }

    /// Decode a 32-byte big-endian integer, reducing it modulo `p`.
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, Card25519Error> {
        Ok(Self::from_uint(&encode::decode_be(bytes)?))
    }

    /// The canonical integer representative of this element, in `[0, p)`.
    pub fn to_uint(&self) -> U256 {
        self.0
    }

    /// The canonical 32-byte little-endian encoding of this element.
    pub fn to_le_bytes(&self) -> [u8; encode::ENCODED_LENGTH] {
        self.0.to_le_bytes()
    }

    /// The canonical 32-byte big-endian encoding of this element.
    pub fn to_be_bytes(&self) -> [u8; encode::ENCODED_LENGTH] {
        self.0.to_be_bytes()
    }

    fn residue(&self) -> DynResidue<{ U256::LIMBS }> {
        DynResidue::new(&self.0, FIELD)
    }

    /// Returns `Choice(1)` if this element is zero.
    pub fn is_zero(&self) -> Choice {
        self.0.ct_eq(&U256::ZERO)
    }

    /// Compute `self^2`.
    pub fn square(&self) -> Self {
        Self(self.residue().square().retrieve())
    }

    /// Compute `self^exponent`, in time independent of both values.
    pub fn pow(&self, exponent: &U256) -> Self {
        Self(self.residue().pow(exponent).retrieve())
    }

    /// Compute the multiplicative inverse `self^(p - 2)`.
    ///
    /// Zero has no inverse; this function maps it to zero rather than failing, which keeps it
    /// branch-free for use on secret values. Callers which must detect that case should use
    /// [`inverse`] instead.
    pub fn invert(&self) -> Self {
        self.pow(&INVERSION_EXPONENT)
    }

    /// Compute the Legendre symbol `(self | p)` using Euler's criterion.
    pub fn legendre(&self) -> Legendre {
        let euler = self.pow(&EULER_EXPONENT);
        if euler == Self::ONE {
            Legendre::Residue
        } else if euler == Self::ZERO {
            Legendre::Zero
        } else {
            Legendre::NonResidue
        }
    }

    /// Compute a square root of this element.
    ///
    /// Either root `r` or `p - r` may be returned. Returns [`FieldError::NoSquareRoot`] if this
    /// element is not a quadratic residue. The root of zero is zero.
    pub fn sqrt(&self) -> Result<Self, Card25519Error> {
        sqrt_mod(&self.0, &MODULUS).map(Self)
    }
}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(U256::conditional_select(&a.0, &b.0, choice))
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl std::ops::Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.add_mod(&rhs.0, &MODULUS))
    }
}

impl std::ops::Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.sub_mod(&rhs.0, &MODULUS))
    }
}

impl std::ops::Mul for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.residue().mul(&rhs.residue()).retrieve())
    }
}

impl std::ops::Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.neg_mod(&MODULUS))
    }
}

/// Compute the multiplicative inverse of `x`, or fail with [`FieldError::NotInvertible`] if `x` is
/// zero.
pub fn inverse(x: &FieldElement) -> Result<FieldElement, Card25519Error> {
    if bool::from(x.is_zero()) {
        return Err(FieldError::NotInvertible.into());
    }

    Ok(x.invert())
}

fn non_zero(modulus: &U256) -> Result<NonZero<U256>, Card25519Error> {
    Option::from(NonZero::new(*modulus)).ok_or(FieldError::InvalidModulus.into())
}

pub(crate) fn is_odd(n: &U256) -> bool {
    n.to_le_bytes()[0] & 1 == 1
}

fn bit(le_bytes: &[u8; 32], i: usize) -> Choice {
    Choice::from((le_bytes[i >> 3] >> (i & 7)) & 1)
}

/// Compute `a * b mod modulus` for `a, b < modulus` by double-and-add.
///
/// Used for even moduli, where Montgomery multiplication is unavailable. The sequence of
/// operations does not depend on `a` or `b`.
fn mul_mod_any(a: &U256, b: &U256, modulus: &U256) -> U256 {
    let b = b.to_le_bytes();
    let mut acc = U256::ZERO;

    for i in (0..U256::BITS).rev() {
        acc = acc.add_mod(&acc, modulus);
        let sum = acc.add_mod(a, modulus);
        acc = U256::conditional_select(&acc, &sum, bit(&b, i));
    }

    acc
}

/// Compute `base^exponent mod modulus`.
///
/// Any non-zero modulus is accepted. For odd moduli the computation uses Montgomery residues,
/// otherwise it falls back to square-and-multiply over a double-and-add multiplication. In both
/// cases all 256 bits of the exponent are processed, whatever their values. A zero modulus is
/// reported as [`FieldError::InvalidModulus`].
pub fn power_mod(base: &U256, exponent: &U256, modulus: &U256) -> Result<U256, Card25519Error> {
    let nz_modulus = non_zero(modulus)?;
    if *modulus == U256::ONE {
        return Ok(U256::ZERO);
    }

    let base = base.rem(&nz_modulus);

    if is_odd(modulus) {
        let params = DynResidueParams::new(modulus);
        return Ok(DynResidue::new(&base, params).pow(exponent).retrieve());
    }

    let exponent = exponent.to_le_bytes();
    let mut result = U256::ONE;
    for i in (0..U256::BITS).rev() {
        result = mul_mod_any(&result, &result, modulus);
        let product = mul_mod_any(&result, &base, modulus);
        result = U256::conditional_select(&result, &product, bit(&exponent, i));
    }

    Ok(result)
}

/// Check that `q` could be an odd prime, i.e. that it is odd and at least 3.
fn odd_prime_params(q: &U256) -> Result<DynResidueParams<{ U256::LIMBS }>, Card25519Error> {
    if !is_odd(q) || *q == U256::ONE {
        return Err(FieldError::InvalidModulus.into());
    }

    Ok(DynResidueParams::new(q))
}

/// Compute the Legendre symbol `(a | q)` using Euler's criterion, `a^((q - 1) / 2) mod q`.
///
/// `q` must be an odd prime. If the criterion yields anything other than `0`, `1` or `q - 1`, `q`
/// cannot be prime, and [`FieldError::InvalidModulus`] is returned.
pub fn legendre_symbol(a: &U256, q: &U256) -> Result<Legendre, Card25519Error> {
    let params = odd_prime_params(q)?;
    let a = a.rem(&non_zero(q)?);
    let euler = DynResidue::new(&a, params).pow(&q.shr_vartime(1)).retrieve();

    if euler == U256::ONE {
        Ok(Legendre::Residue)
    } else if euler == U256::ZERO {
        Ok(Legendre::Zero)
    } else if euler == q.wrapping_sub(&U256::ONE) {
        Ok(Legendre::NonResidue)
    } else {
        Err(FieldError::InvalidModulus.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        inverse, legendre_symbol, power_mod, FieldElement, FieldError, Legendre, MODULUS,
    };
    use crate::{random, Card25519Error};
    use crypto_bigint::U256;

    fn random_element() -> Result<FieldElement, Card25519Error> {
        let mut bytes = [0u8; 32];
        random::fill_random(&mut bytes)?;
        FieldElement::from_le_bytes(&bytes)
    }

    #[test]
    fn reduction_is_canonical() {
        assert_eq!(FieldElement::from_uint(&MODULUS), FieldElement::ZERO);
        assert_eq!(
            FieldElement::from_uint(&MODULUS.wrapping_add(&U256::from_u8(5))),
            FieldElement::from_u64(5)
        );
        // 2^256 - 1 = 2p + 37
        assert_eq!(
            FieldElement::from_uint(&U256::MAX),
            FieldElement::from_u64(37)
        );
    }

    #[test]
    fn arithmetic_identities() -> Result<(), Card25519Error> {
        for _ in 0..50 {
            let a = random_element()?;
            let b = random_element()?;

            assert_eq!(a + b - b, a);
            assert_eq!(a - a, FieldElement::ZERO);
            assert_eq!(a + -a, FieldElement::ZERO);
            assert_eq!(a * b, b * a);
            assert_eq!(a * FieldElement::ONE, a);
            assert_eq!(a.square(), a * a);
            assert_eq!(a.pow(&U256::from_u8(3)), a * a * a);
            assert!(a.to_uint() < MODULUS);
        }

        let minus_one = FieldElement::ZERO - FieldElement::ONE;
        assert_eq!(minus_one.to_uint(), MODULUS.wrapping_sub(&U256::ONE));
        assert_eq!(minus_one * minus_one, FieldElement::ONE);

        Ok(())
    }

    #[test]
    fn inverse_properties() -> Result<(), Card25519Error> {
        for _ in 0..50 {
            let x = random_element()?;
            if bool::from(x.is_zero()) {
                continue;
            }

            let x_inv = inverse(&x)?;
            assert_eq!(x * x_inv, FieldElement::ONE);
            assert_eq!(inverse(&x_inv)?, x);
        }

        assert_eq!(
            inverse(&FieldElement::ZERO),
            Err(FieldError::NotInvertible.into())
        );
        assert_eq!(FieldElement::ZERO.invert(), FieldElement::ZERO);
        assert_eq!(
            FieldElement::from_u64(3) * FieldElement::from_u64(3).invert(),
            FieldElement::ONE
        );

        Ok(())
    }

    #[test]
    fn power_mod_small_values() -> Result<(), Card25519Error> {
        let n = U256::from_u64;

        assert_eq!(power_mod(&n(4), &n(13), &n(497))?, n(445));
        assert_eq!(power_mod(&n(3), &n(200), &n(1000))?, n(1));
        assert_eq!(power_mod(&n(2), &n(10), &n(1000))?, n(24));
        assert_eq!(power_mod(&n(7), &n(0), &n(10))?, n(1));
        assert_eq!(power_mod(&n(7), &n(0), &n(1))?, n(0));
        assert_eq!(power_mod(&n(1234), &n(5), &n(2))?, n(0));
        assert_eq!(power_mod(&n(0), &n(5), &n(13))?, n(0));
        assert_eq!(
            power_mod(&n(2), &n(5), &U256::ZERO),
            Err(FieldError::InvalidModulus.into())
        );

        Ok(())
    }

    #[test]
    fn power_mod_large_exponents() -> Result<(), Card25519Error> {
        let p_minus_one = MODULUS.wrapping_sub(&U256::ONE);

        for _ in 0..10 {
            let a = random_element()?;
            if bool::from(a.is_zero()) {
                continue;
            }

            // Fermat's little theorem
            assert_eq!(power_mod(&a.to_uint(), &p_minus_one, &MODULUS)?, U256::ONE);
            assert_eq!(
                power_mod(&a.to_uint(), &U256::from_u8(2), &MODULUS)?,
                a.square().to_uint()
            );
        }

        // 2^255 mod 2^64 = 0, and 3^(2^62) mod 2^64 = 1 (the group of units has exponent 2^62)
        let two_64 = U256::ONE.shl_vartime(64);
        assert_eq!(
            power_mod(&U256::from_u8(2), &U256::from_u8(255), &two_64)?,
            U256::ZERO
        );
        assert_eq!(
            power_mod(&U256::from_u8(3), &U256::ONE.shl_vartime(62), &two_64)?,
            U256::ONE
        );

        Ok(())
    }

    #[test]
    fn legendre_small_primes() -> Result<(), Card25519Error> {
        let n = U256::from_u64;

        // squares mod 7: 1, 2, 4
        assert_eq!(legendre_symbol(&n(2), &n(7))?, Legendre::Residue);
        assert_eq!(legendre_symbol(&n(3), &n(7))?, Legendre::NonResidue);
        assert_eq!(legendre_symbol(&n(0), &n(7))?, Legendre::Zero);
        assert_eq!(legendre_symbol(&n(14), &n(7))?, Legendre::Zero);
        assert_eq!(legendre_symbol(&n(11), &n(7))?, Legendre::Residue);
        assert_eq!(i8::from(legendre_symbol(&n(5), &n(7))?), -1);

        assert_eq!(
            legendre_symbol(&n(3), &n(8)),
            Err(FieldError::InvalidModulus.into())
        );
        assert_eq!(
            legendre_symbol(&n(3), &n(1)),
            Err(FieldError::InvalidModulus.into())
        );
        // 2^((15 - 1) / 2) mod 15 = 8, exposing 15 as composite
        assert_eq!(
            legendre_symbol(&n(2), &n(15)),
            Err(FieldError::InvalidModulus.into())
        );

        Ok(())
    }

    #[test]
    fn legendre_agrees_with_field() -> Result<(), Card25519Error> {
        for _ in 0..20 {
            let a = random_element()?;
            assert_eq!(legendre_symbol(&a.to_uint(), &MODULUS)?, a.legendre());
            if !bool::from(a.is_zero()) {
                assert_eq!(a.square().legendre(), Legendre::Residue);
            }
        }

        // p = 5 mod 8, so 2 is a non-residue
        assert_eq!(FieldElement::from_u64(2).legendre(), Legendre::NonResidue);
        assert_eq!(FieldElement::ZERO.legendre(), Legendre::Zero);

        Ok(())
    }
}
