use super::{
    Command, PrivateKey, Response, SharedSecret, TokenError, Transport,
    INS_COMPUTE_SHARED_SECRET, INS_GENERATE_KEYPAIR, INS_LOAD_PRIVATE_KEY,
};
use crate::curve::{
    weierstrass, weierstrass_to_montgomery, ClampedScalar, CurveError, MontgomeryPoint, Scalar,
};
use crate::field::FieldElement;
use crate::{mem, Card25519Error};
use log::{debug, info, warn};

const COORDINATE_LENGTH: usize = weierstrass::COORDINATE_LENGTH;

/// A key agreement session with a token.
///
/// The session owns its [`Transport`], and every operation takes `&mut self`, so at most one
/// command is ever in flight. All keys and points passed to or returned from the session are in
/// the standard Curve25519 format: conversion to and from the token's Weierstrass representation,
/// and the final multiplication by the cofactor, happen internally.
#[derive(Debug)]
pub struct KeyAgreementSession<T: Transport> {
    transport: T,
    connected: bool,
}

impl<T: Transport> KeyAgreementSession<T> {
    /// Create a new session over `transport`.
    ///
    /// The applet must be selected with [`Self::connect`] before any other operation.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            connected: false,
        }
    }

    /// Select the applet on the token.
    ///
    /// If selection fails, the session is left disconnected, and [`TokenError::SelectFailed`] is
    /// returned.
    pub fn connect(&mut self) -> Result<(), Card25519Error> {
        self.connected = false;

        let response = self.transport.transmit(&Command::select().to_bytes())?;
        if !response.is_success() {
            warn!(
                "applet selection failed with status {:02x} {:02x}",
                response.sw1, response.sw2
            );
            return Err(TokenError::SelectFailed.into());
        }

        info!("applet selected");
        self.connected = true;
        Ok(())
    }

    /// Whether the applet has been selected.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Consume the session, returning the underlying transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send `command`, and check the response status and length.
    ///
    /// The serialised command is cleared after sending, as it may hold a private key.
    fn exchange(
        &mut self,
        mut command: Command,
        expected_length: usize,
    ) -> Result<Response, Card25519Error> {
        if !self.connected {
            return Err(TokenError::NotConnected.into());
        }

        let mut bytes = command.to_bytes();
        let result = self.transport.transmit(&bytes);
        mem::clear(&mut bytes)?;
        mem::clear(&mut command.data)?;
        let mut response = result?;

        debug!(
            "INS {:02x}: status {:02x} {:02x}, {} bytes",
            command.ins,
            response.sw1,
            response.sw2,
            response.data.len()
        );

        if !response.is_success() {
            warn!(
                "INS {:02x} failed with status {:02x} {:02x}",
                command.ins, response.sw1, response.sw2
            );
            mem::clear(&mut response.data)?;
            return Err(TokenError::Status {
                sw1: response.sw1,
                sw2: response.sw2,
            }
            .into());
        }

        if response.data.len() != expected_length {
            warn!(
                "INS {:02x} returned {} bytes, expected {}",
                command.ins,
                response.data.len(),
                expected_length
            );
            let actual = response.data.len();
            mem::clear(&mut response.data)?;
            return Err(TokenError::ResponseLength {
                expected: expected_length,
                actual,
            }
            .into());
        }

        Ok(response)
    }

    /// Generate a keypair on the token.
    ///
    /// The applet returns its private key for testing purposes, so this function can return it as
    /// well. Returns the private key (already clamped) and the corresponding public key.
    pub fn generate_keypair(&mut self) -> Result<(PrivateKey, MontgomeryPoint), Card25519Error> {
        let mut response =
            self.exchange(Command::new(INS_GENERATE_KEYPAIR, &[]), 2 * COORDINATE_LENGTH)?;

        let keypair = keypair_from_response(&response.data);
        mem::clear(&mut response.data)?;
        keypair
    }

    /// Install `private_key` on the token.
    ///
    /// Returns the public key the token computes for it, which will equal
    /// `MontgomeryPoint::BASE_POINT.scalar_mult(private_key)`.
    pub fn set_private_key(
        &mut self,
        private_key: &ClampedScalar,
    ) -> Result<MontgomeryPoint, Card25519Error> {
        let encoded = private_key.as_scalar().to_be_bytes();
        let response = self.exchange(
            Command::new(INS_LOAD_PRIVATE_KEY, &encoded[..]),
            COORDINATE_LENGTH,
        )?;

        point_from_token(&response.data)
    }

    /// Compute a shared secret from the private key held by the token and `public_key`.
    ///
    /// A private key must first be installed, using [`Self::generate_keypair`] or
    /// [`Self::set_private_key`], otherwise the token will refuse the command. Returns
    /// [`FieldError::NoSquareRoot`](crate::field::FieldError::NoSquareRoot) if `public_key` is not
    /// on Curve25519, and [`CurveError::ScalarMultUnacceptable`] if the shared secret is zero.
    pub fn generate_shared_secret(
        &mut self,
        public_key: &MontgomeryPoint,
    ) -> Result<SharedSecret, Card25519Error> {
        let peer = public_key.to_weierstrass()?;
        let mut response = self.exchange(
            Command::new(INS_COMPUTE_SHARED_SECRET, &peer.0),
            COORDINATE_LENGTH,
        )?;

        let shared = point_from_token(&response.data);
        mem::clear(&mut response.data)?;
        let mut shared = shared?;

        let result = if mem::is_zero(&shared.0)? {
            Err(CurveError::ScalarMultUnacceptable.into())
        } else {
            SharedSecret::try_from(&shared.0[..])
        };
        mem::clear(&mut shared.0)?;
        result
    }
}

/// Convert a Weierstrass x-coordinate computed by the token with `s / 8` to the Curve25519 point
/// for `s`.
fn point_from_token(x: &[u8]) -> Result<MontgomeryPoint, Card25519Error> {
    let x = FieldElement::from_be_bytes(x)?;
    Ok(MontgomeryPoint::from_field(&weierstrass_to_montgomery(&x)).mul_by_cofactor())
}

fn keypair_from_response(data: &[u8]) -> Result<(PrivateKey, MontgomeryPoint), Card25519Error> {
    let (reduced, public) = data.split_at(COORDINATE_LENGTH);

    let scalar = ClampedScalar::try_from(Scalar::from_be_bytes(reduced)?.mul_by_cofactor())?;
    let private_key = PrivateKey::from_scalar(&scalar)?;

    Ok((private_key, point_from_token(public)?))
}
