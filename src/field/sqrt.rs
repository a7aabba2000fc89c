//! Modular square roots via the Tonelli-Shanks algorithm.

use super::{legendre_symbol, non_zero, odd_prime_params, FieldError, Legendre};
use crate::Card25519Error;
use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{Encoding, U256};

type Residue = DynResidue<{ U256::LIMBS }>;

fn is_one(x: &Residue) -> bool {
    x.retrieve() == U256::ONE
}

/// Find the smallest quadratic non-residue modulo `p`, starting from 2.
fn find_non_residue(p: &U256) -> Result<U256, Card25519Error> {
    let mut n = U256::from_u8(2);
    while legendre_symbol(&n, p)? != Legendre::NonResidue {
        n = n.wrapping_add(&U256::ONE);
        if n >= *p {
            return Err(FieldError::InvalidModulus.into());
        }
    }

    Ok(n)
}

/// Compute a square root of `a` modulo the odd prime `p`.
///
/// Returns some `r` with `r^2 = a (mod p)`; the other root is `p - r`, and no preference is given
/// to either. The root of any multiple of `p` is zero. If `a` is a quadratic non-residue,
/// [`FieldError::NoSquareRoot`] is returned. Moduli which are even or less than 3 are rejected
/// with [`FieldError::InvalidModulus`], as are composite moduli detected along the way.
///
/// Primes with `p = 3 (mod 4)` take the closed form `a^((p + 1) / 4)`. All others, including
/// `2^255 - 19`, go through the general Tonelli-Shanks iteration.
///
/// This function is variable time and must only be used on public values.
pub fn sqrt_mod(a: &U256, p: &U256) -> Result<U256, Card25519Error> {
    let params: DynResidueParams<{ U256::LIMBS }> = odd_prime_params(p)?;
    let a = a.rem(&non_zero(p)?);

    match legendre_symbol(&a, p)? {
        Legendre::Zero => return Ok(U256::ZERO),
        Legendre::NonResidue => return Err(FieldError::NoSquareRoot.into()),
        Legendre::Residue => (),
    }

    let a_r = DynResidue::new(&a, params);

    if p.to_le_bytes()[0] & 3 == 3 {
        let root = a_r.pow(&p.shr_vartime(2).wrapping_add(&U256::ONE));
        if root.square().retrieve() != a {
            return Err(FieldError::InvalidModulus.into());
        }
        return Ok(root.retrieve());
    }

    // p - 1 = s * 2^e, with s odd
    let mut s = p.wrapping_sub(&U256::ONE);
    let mut e = 0usize;
    while !super::is_odd(&s) {
        s = s.shr_vartime(1);
        e += 1;
    }

    let n = find_non_residue(p)?;

    let mut x = a_r.pow(&s.shr_vartime(1).wrapping_add(&U256::ONE));
    let mut b = a_r.pow(&s);
    let mut g = DynResidue::new(&n, params).pow(&s);
    let mut r = e;

    loop {
        // least m such that b^(2^m) = 1
        let mut t = b;
        let mut m = 0;
        while m < r && !is_one(&t) {
            t = t.square();
            m += 1;
        }

        if m == 0 {
            return Ok(x.retrieve());
        }
        if m == r {
            return Err(FieldError::NoSquareRoot.into());
        }

        let mut gs = g;
        for _ in 0..(r - m - 1) {
            gs = gs.square();
        }
        g = gs.square();
        x = x.mul(&gs);
        b = b.mul(&g);
        r = m;
    }
}

#[cfg(test)]
mod tests {
    use super::sqrt_mod;
    use crate::field::{legendre_symbol, FieldElement, FieldError, Legendre, MODULUS};
    use crate::{random, Card25519Error};
    use crypto_bigint::U256;

    fn check_every_value(p: u64) -> Result<(), Card25519Error> {
        let modulus = U256::from_u64(p);

        for a in 0..p {
            let value = U256::from_u64(a);
            match legendre_symbol(&value, &modulus)? {
                Legendre::NonResidue => {
                    assert_eq!(
                        sqrt_mod(&value, &modulus),
                        Err(FieldError::NoSquareRoot.into())
                    );
                }
                _ => {
                    let root = sqrt_mod(&value, &modulus)?;
                    assert!(root < modulus);
                    let root = root.as_words()[0] as u64;
                    assert_eq!((root * root) % p, a);
                }
            }
        }

        Ok(())
    }

    #[test]
    fn small_primes_three_mod_four() -> Result<(), Card25519Error> {
        for p in [3, 7, 11, 23, 103] {
            check_every_value(p)?;
        }

        Ok(())
    }

    #[test]
    fn small_primes_one_mod_four() -> Result<(), Card25519Error> {
        // 7681 - 1 = 15 * 2^9, which exercises several rounds of the main loop
        for p in [5, 13, 17, 41, 97, 7681] {
            check_every_value(p)?;
        }

        Ok(())
    }

    #[test]
    fn known_roots() -> Result<(), Card25519Error> {
        let n = U256::from_u64;

        let root = sqrt_mod(&n(10), &n(13))?;
        assert!(root == n(6) || root == n(7));
        let root = sqrt_mod(&n(2), &n(7))?;
        assert!(root == n(3) || root == n(4));
        assert_eq!(sqrt_mod(&n(0), &n(13))?, n(0));
        assert_eq!(sqrt_mod(&n(26), &n(13))?, n(0));
        assert_eq!(sqrt_mod(&n(5), &n(13)), Err(FieldError::NoSquareRoot.into()));

        Ok(())
    }

    #[test]
    fn rejects_invalid_moduli() {
        let n = U256::from_u64;

        assert_eq!(sqrt_mod(&n(1), &n(2)), Err(FieldError::InvalidModulus.into()));
        assert_eq!(sqrt_mod(&n(1), &n(1)), Err(FieldError::InvalidModulus.into()));
        assert_eq!(sqrt_mod(&n(1), &n(0)), Err(FieldError::InvalidModulus.into()));
        assert_eq!(sqrt_mod(&n(4), &n(15)), Err(FieldError::InvalidModulus.into()));
    }

    #[test]
    fn curve25519_field_roots() -> Result<(), Card25519Error> {
        for _ in 0..20 {
            let mut bytes = [0u8; 32];
            random::fill_random(&mut bytes)?;
            let x = FieldElement::from_le_bytes(&bytes)?;
            let square = x.square();

            let root = square.sqrt()?;
            assert_eq!(root.square(), square);
            assert!(root == x || root == -x);
        }

        // p = 5 mod 8: 2 is a non-residue, -1 is a residue
        assert_eq!(
            FieldElement::from_u64(2).sqrt(),
            Err(FieldError::NoSquareRoot.into())
        );
        let minus_one = -FieldElement::ONE;
        assert_eq!(minus_one.sqrt()?.square(), minus_one);
        assert_eq!(sqrt_mod(&MODULUS, &MODULUS)?, U256::ZERO);

        Ok(())
    }
}
