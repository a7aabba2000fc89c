//! Known-answer tests for the conversion pipeline.
//!
//! [`verify_reference_vector`] checks the host-side arithmetic alone against the Curve25519 test
//! vector from RFC 7748. [`verify_token`] runs the same vectors through a token, covering key
//! generation, key installation and key agreement, and so checks the token and the conversion
//! between the two curve models together. Each passed stage is logged at `info` level.
//!
//! # Examples
//! ```rust
//! use card25519::selftest;
//! use card25519::token::{KeyAgreementSession, SimulatedToken};
//!
//! selftest::verify_reference_vector().unwrap();
//!
//! let mut session = KeyAgreementSession::new(SimulatedToken::new());
//! session.connect().unwrap();
//! selftest::verify_token(&mut session).unwrap();
//! ```

use crate::curve::{MontgomeryPoint, Scalar};
use crate::token::{KeyAgreementSession, Transport};
use crate::{mem, Card25519Error};
use log::info;

/// Alice's private key from RFC 7748, section 6.1.
pub const ALICE_PRIVATE_KEY: [u8; 32] = [
    0x77, 0x07, 0x6d, 0x0a, 0x73, 0x18, 0xa5, 0x7d, 0x3c, 0x16, 0xc1, 0x72, 0x51, 0xb2, 0x66, 0x45,
    0xdf, 0x4c, 0x2f, 0x87, 0xeb, 0xc0, 0x99, 0x2a, 0xb1, 0x77, 0xfb, 0xa5, 0x1d, 0xb9, 0x2c, 0x2a,
];

/// Alice's public key from RFC 7748, section 6.1.
pub const ALICE_PUBLIC_KEY: [u8; 32] = [
    0x85, 0x20, 0xf0, 0x09, 0x89, 0x30, 0xa7, 0x54, 0x74, 0x8b, 0x7d, 0xdc, 0xb4, 0x3e, 0xf7, 0x5a,
    0x0d, 0xbf, 0x3a, 0x0d, 0x26, 0x38, 0x1a, 0xf4, 0xeb, 0xa4, 0xa9, 0x8e, 0xaa, 0x9b, 0x4e, 0x6a,
];

/// Bob's public key from RFC 7748, section 6.1.
pub const BOB_PUBLIC_KEY: [u8; 32] = [
    0xde, 0x9e, 0xdb, 0x7d, 0x7b, 0x7d, 0xc1, 0xb4, 0xd3, 0x5b, 0x61, 0xc2, 0xec, 0xe4, 0x35, 0x37,
    0x3f, 0x83, 0x43, 0xc8, 0x5b, 0x78, 0x67, 0x4d, 0xad, 0xfc, 0x7e, 0x14, 0x6f, 0x88, 0x2b, 0x4f,
];

/// The shared secret of Alice and Bob from RFC 7748, section 6.1.
pub const SHARED_SECRET: [u8; 32] = [
    0x4a, 0x5d, 0x9d, 0x5b, 0xa4, 0xce, 0x2d, 0xe1, 0x72, 0x8e, 0x3b, 0xf4, 0x80, 0x35, 0x0f, 0x25,
    0xe0, 0x7e, 0x21, 0xc9, 0x47, 0xd1, 0x9e, 0x33, 0x76, 0xf0, 0x9b, 0x3c, 0x1e, 0x16, 0x17, 0x42,
];

/// A stage of the self-test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// Clamping and the Montgomery ladder, on the host.
    ReferenceVector,
    /// The public key of a keypair generated on the token.
    KeypairGeneration,
    /// The public key returned when installing a known private key.
    PrivateKeyInstallation,
    /// A shared secret computed by the token.
    SharedSecret,
}

fn check(stage: Stage, actual: &[u8], expected: &[u8]) -> Result<(), Card25519Error> {
    if !mem::eq(actual, expected)? {
        return Err(Card25519Error::SelfTestFailed(stage));
    }

    info!("self-test passed: {:?}", stage);
    Ok(())
}

/// Check that clamping and scalar multiplication reproduce Alice's public key from RFC 7748.
pub fn verify_reference_vector() -> Result<(), Card25519Error> {
    let private_key = Scalar::from_le_bytes(&ALICE_PRIVATE_KEY)?.clamp();
    let public_key = MontgomeryPoint::BASE_POINT.scalar_mult(&private_key);

    check(Stage::ReferenceVector, &public_key.0, &ALICE_PUBLIC_KEY)
}

/// Run the token through key generation, key installation and key agreement.
///
/// The public key of a generated keypair must match its private key; installing Alice's private
/// key from RFC 7748 must give her public key; and agreement with Bob's public key must give the
/// RFC's shared secret. This overwrites any private key held by the token.
pub fn verify_token<T: Transport>(
    session: &mut KeyAgreementSession<T>,
) -> Result<(), Card25519Error> {
    let (private_key, public_key) = session.generate_keypair()?;
    check(
        Stage::KeypairGeneration,
        &public_key.0,
        &private_key.public_key()?.0,
    )?;

    let alice = Scalar::from_le_bytes(&ALICE_PRIVATE_KEY)?.clamp();
    let public_key = session.set_private_key(&alice)?;
    check(
        Stage::PrivateKeyInstallation,
        &public_key.0,
        &ALICE_PUBLIC_KEY,
    )?;

    let shared = session.generate_shared_secret(&MontgomeryPoint(BOB_PUBLIC_KEY))?;
    check(Stage::SharedSecret, &shared[..], &SHARED_SECRET)
}
