//! Curve25519 key agreement for smartcards which only speak short Weierstrass ECDH.
//!
//! Many deployed smartcards (JavaCard tokens in particular) expose elliptic-curve Diffie-Hellman
//! only for curves in short Weierstrass form, `y^2 = x^3 + ax + b`. Curve25519 is a Montgomery
//! curve, `y^2 = x^3 + 486662x^2 + x`, but the two forms are birationally equivalent: every point
//! on Curve25519 has a twin on the Weierstrass curve "Wei25519", and scalar multiplication commutes
//! with the mapping. This crate does the host-side work which lets such a card take part in a
//! standard [X25519](https://cr.yp.to/ecdh.html) exchange:
//!
//! * [`field`] implements arithmetic modulo `p = 2^255 - 19`, modular exponentiation, the
//!   Legendre symbol, and a Tonelli-Shanks square root solver.
//! * [`curve`] maps x-coordinates between the Montgomery and Weierstrass models, and provides a
//!   constant-time Montgomery ladder used both as the X25519 reference implementation and to
//!   clear the cofactor from values returned by the card.
//! * [`encode`] converts between 32-byte big/little-endian encodings and integers, and clamps
//!   scalars.
//! * [`token`] drives the card itself: it builds APDUs, sends them through a caller-supplied
//!   [`token::Transport`], and converts every response back to the Curve25519 format.
//! * [`selftest`] checks the whole pipeline against the published RFC 7748 test vectors.
//!
//! # Why Cofactor Clearing?
//! The card stores `s / 8` rather than the clamped scalar `s` (clamping guarantees `s` is a
//! multiple of 8), because it performs the scalar multiplication over the prime-order subgroup
//! generated by its base point. The host multiplies every point it receives by 8 to finish the
//! computation, which yields exactly the value a standard X25519 implementation would produce.
//!
//! # Secret Data
//! Private scalars returned to the caller are stored in hardened buffers, allocated using
//! Sodium's [secure memory utilities](https://doc.libsodium.org/memory_management): they are kept
//! in locked memory, guarded against overflows, and zeroed on drop. Intermediate [`curve::Scalar`]
//! values are zeroed on drop too.

use libsodium_sys as sodium;
use thiserror::Error;

pub mod curve;
pub mod encode;
pub mod field;
mod mem;
pub mod random;
pub mod selftest;
pub mod token;

/// General error type used in card25519.
///
/// This type is returned by functions which can possibly fail throughout card25519.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum Card25519Error {
    /// Failed to initialise Sodium.
    ///
    /// This corresponds to a call to `sodium_init` returning -1, indicating initialisation
    /// failure. In such a case, Sodium is unsafe to use.
    #[error("failed to initialise libsodium")]
    SodiumInitFailed,

    /// Memory management error.
    ///
    /// Sodium's guarded allocator failed to provide memory for a hardened buffer.
    #[error("memory management error")]
    MemoryManagement,

    /// Tried to decode an integer, point, or key from an incorrectly sized slice.
    ///
    /// The 0th item is the expected length, the 1st item is the actual length of the slice.
    #[error("incorrect slice length: expected {0}, found {1}")]
    IncorrectSliceLength(usize, usize),

    /// An error occurred in the [`field`] module.
    #[error("field arithmetic error: {0}")]
    FieldError(#[from] field::FieldError),

    /// An error occurred in the [`curve`] module.
    #[error("curve error: {0}")]
    CurveError(#[from] curve::CurveError),

    /// An error occurred communicating with the token.
    #[error("token error: {0}")]
    TokenError(#[from] token::TokenError),

    /// A known-answer test in the [`selftest`] module produced the wrong value.
    #[error("self-test failed: {0:?}")]
    SelfTestFailed(selftest::Stage),
}

/// Attempt to initialise Sodium.
///
/// This function should be called in any scenario where a function from Sodium will be used
/// internally. Returns `Ok(0)` if Sodium was initialised successfully, `Ok(1)` if Sodium has
/// already been initialised, or [`Card25519Error::SodiumInitFailed`] if the initialisation was
/// unsuccessful.
fn require_init() -> Result<libc::c_int, Card25519Error> {
    let init_status = unsafe {
        // SAFETY: This function can safely be called multiple times from multiple threads. Once it
        // has been called, all other Sodium functions are also thread-safe.
        sodium::sodium_init()
    };

    // sodium_init() returns -1 on init failure, 0 on success, or 1 if Sodium is already
    // initialised
    if init_status < 0 {
        return Err(Card25519Error::SodiumInitFailed);
    }

    Ok(init_status)
}
