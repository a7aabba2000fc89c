//! Random data suitable for cryptographic use.
//!
//! This module is a wrapper around the [`randombytes`
//! API](https://doc.libsodium.org/generating_random_data) from Sodium. It is used to generate
//! private scalars (see [`Scalar::generate`](crate::curve::Scalar::generate)) and drives the
//! on-card key generation of the [`SimulatedToken`](crate::token::SimulatedToken).
//!
//! # Examples
//! ```rust
//! use card25519::curve::Scalar;
//! use card25519::random::SodiumRng;
//!
//! let secret = Scalar::generate(&mut SodiumRng).clamp();
//! ```

use crate::{require_init, Card25519Error};
use libsodium_sys as sodium;
use rand_core::{impls, CryptoRng, Error as RandError, RngCore};

/// [rand](https://rust-random.github.io/book)-compatible CSPRNG backed by Sodium.
///
/// Anything in this crate which needs randomness accepts an `RngCore + CryptoRng`, so tests can
/// swap in a seeded generator; this is the default.
#[derive(Clone, Copy, Debug, Default)]
pub struct SodiumRng;

impl RngCore for SodiumRng {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // `fill_random` can only fail if Sodium cannot be initialised, in which case no secure
        // source of randomness exists at all.
        if let Err(e) = fill_random(dest) {
            panic!("secure random number generation unavailable: {}", e);
        }
    }

    #[cfg(feature = "std")]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        fill_random(dest).map_err(RandError::new)
    }

    #[cfg(not(feature = "std"))]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        fill_random(dest).map_err(|_| {
            core::num::NonZeroU32::new(RandError::CUSTOM_START)
                .map(RandError::from)
                .unwrap_or_else(|| RandError::from(core::num::NonZeroU32::MIN))
        })
    }
}

impl CryptoRng for SodiumRng {}

/// Fill `buf` with random data suitable for cryptographic use.
///
/// Returns an error if Sodium could not be correctly initialised.
pub fn fill_random(buf: &mut [u8]) -> Result<(), Card25519Error> {
    require_init()?;

    unsafe {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes, which is the length we pass.
        sodium::randombytes_buf(buf.as_mut_ptr() as *mut libc::c_void, buf.len());
    }

    Ok(())
}
