//! End-to-end key agreement between a token-held key and ordinary X25519 keys.

use anyhow::Result;
use card25519::curve::{x25519, MontgomeryPoint, Scalar};
use card25519::encode;
use card25519::token::{KeyAgreementSession, SimulatedToken};
use card25519::{selftest, Card25519Error};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

fn session(seed: u64) -> Result<KeyAgreementSession<SimulatedToken<StdRng>>> {
    let mut session = KeyAgreementSession::new(SimulatedToken::with_rng(StdRng::seed_from_u64(seed)));
    session.connect()?;
    Ok(session)
}

#[test]
fn generated_key_matches_standard_derivation() -> Result<()> {
    let mut session = session(1)?;

    for _ in 0..4 {
        let (private_key, public_key) = session.generate_keypair()?;

        let mut k = [0u8; 32];
        k.copy_from_slice(&private_key[..]);
        assert_eq!(public_key.0, x25519(&k, &MontgomeryPoint::BASE_POINT.0));
    }

    Ok(())
}

#[test]
fn agreement_with_software_peer() -> Result<()> {
    let mut session = session(2)?;
    let mut rng = StdRng::seed_from_u64(3);

    let (_, token_public) = session.generate_keypair()?;

    for _ in 0..4 {
        let mut peer_private = [0u8; 32];
        rng.fill_bytes(&mut peer_private);
        let peer_public = x25519(&peer_private, &MontgomeryPoint::BASE_POINT.0);

        let from_token = session.generate_shared_secret(&MontgomeryPoint(peer_public))?;
        let from_peer = x25519(&peer_private, &token_public.0);
        assert_eq!(*from_token, from_peer);
    }

    Ok(())
}

#[test]
fn installed_key_survives_round_trip() -> Result<()> {
    let mut session = session(4)?;
    let mut rng = StdRng::seed_from_u64(5);

    let alice = Scalar::generate(&mut rng).clamp();
    let bob = Scalar::generate(&mut rng).clamp();

    let alice_public = session.set_private_key(&alice)?;
    assert_eq!(alice_public, MontgomeryPoint::BASE_POINT.scalar_mult(&alice));

    let bob_public = MontgomeryPoint::BASE_POINT.scalar_mult(&bob);
    let shared = session.generate_shared_secret(&bob_public)?;
    assert_eq!(*shared, alice_public.scalar_mult(&bob).0);

    Ok(())
}

#[test]
fn rfc7748_vectors_through_token() -> Result<()> {
    selftest::verify_reference_vector()?;
    selftest::verify_token(&mut session(6)?)?;

    // The card encodes big-endian, so Alice's key goes over the wire reversed
    let alice = encode::decode_le(&selftest::ALICE_PRIVATE_KEY)?;
    let mut reversed = selftest::ALICE_PRIVATE_KEY;
    reversed.reverse();
    assert_eq!(encode::encode_be(&alice), reversed);

    Ok(())
}

#[test]
fn errors_are_typed() {
    assert_eq!(
        encode::decode_be(&[0u8; 33]),
        Err(Card25519Error::IncorrectSliceLength(32, 33))
    );
}
