//! Curve25519, its short Weierstrass twin, and the maps between them.
//!
//! [Curve25519](https://cr.yp.to/ecdh.html) is the Montgomery curve `v^2 = u^3 + 486662u^2 + u`
//! over the prime field of order `2^255 - 19`. It is birationally equivalent to the short
//! Weierstrass curve Wei25519, `y^2 = x^3 + ax + b`, which is the only form many smartcards
//! support. This module provides:
//!
//! * [`Scalar`] and [`ClampedScalar`], secret multipliers which are wiped on drop.
//! * [`MontgomeryPoint`] and [`scalar_multiply`], a constant-time Montgomery ladder over
//!   u-coordinates, and [`x25519`], the RFC 7748 function built on it.
//! * [`WeierstrassPoint`] and the maps [`weierstrass_to_montgomery`] and
//!   [`montgomery_to_weierstrass`] between the two models.
//!
//! Curve25519 is not of prime order: it has `8 * ORDER` points. X25519 clamps every private scalar
//! to a multiple of 8, so multiplying any point by it lands in the prime-order subgroup. The token
//! works in that subgroup directly, with scalars divided by 8, and
//! [`MontgomeryPoint::mul_by_cofactor`] closes the gap.
//!
//! # Examples
//! ```rust
//! use card25519::curve::{MontgomeryPoint, Scalar};
//! use card25519::random::SodiumRng;
//!
//! let alice = Scalar::generate(&mut SodiumRng).clamp();
//! let bob = Scalar::generate(&mut SodiumRng).clamp();
//!
//! let alice_pub = MontgomeryPoint::BASE_POINT.scalar_mult(&alice);
//! let bob_pub = MontgomeryPoint::BASE_POINT.scalar_mult(&bob);
//!
//! // The same exchange, with Bob's key passed through the Weierstrass model and back
//! let bob_pub_w = bob_pub.to_weierstrass().unwrap();
//! assert!(bob_pub_w.is_on_curve());
//!
//! assert_eq!(
//!     bob_pub_w.to_montgomery().scalar_mult(&alice),
//!     alice_pub.scalar_mult(&bob)
//! );
//! ```

mod constants;
pub mod montgomery;
mod scalar;
pub mod weierstrass;

pub use constants::{
    CurveParameters, COFACTOR, CURVE, GENERATOR_X, GENERATOR_Y, MONTGOMERY_A, MONTGOMERY_B,
    MONTGOMERY_BASE_U, ORDER, WEIERSTRASS_A, WEIERSTRASS_B,
};
pub use montgomery::{scalar_multiply, x25519, MontgomeryPoint};
pub use scalar::{ClampedScalar, Scalar, SCALAR_LENGTH};
pub use weierstrass::{
    montgomery_to_weierstrass, montgomery_to_weierstrass_x, weierstrass_to_montgomery,
    WeierstrassPoint,
};

use thiserror::Error;

/// Error type returned if something went wrong in the `curve` module.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum CurveError {
    /// A scalar required to be in clamped form is not.
    ///
    /// Clamped scalars have bits 0, 1, 2 and 255 clear, and bit 254 set. Only clamped scalars are
    /// multiples of the cofactor, and so can be handed to the token as `s / 8`.
    #[error("scalar is not clamped")]
    ScalarNotClamped,

    /// The result of a scalar multiplication is the point at infinity.
    ///
    /// For a shared secret, this indicates the peer's public key is of low order. The result is
    /// then predictable, and must not be used as a key.
    #[error("scalar multiplication produced the point at infinity")]
    ScalarMultUnacceptable,
}
