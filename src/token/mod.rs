//! Curve25519 key agreement on a token which only implements Weierstrass ECDH.
//!
//! The token runs an applet (selected by [`APPLET_AID`]) with three instructions: generate a
//! keypair, load a private key, and compute a shared secret. It works on Wei25519, stores private
//! keys divided by the cofactor, and returns only x-coordinates. [`KeyAgreementSession`] hides all
//! of this: it accepts and returns Curve25519 keys in the standard little-endian format, and its
//! results are bit-for-bit those of X25519.
//!
//! Communication is half-duplex: one command is sent, and its response received, before the next
//! command may be sent. The physical link is supplied by the caller as a [`Transport`]; a
//! [`SimulatedToken`] implementing the applet in software is provided for testing.
//!
//! # Examples
//! ```rust
//! use card25519::curve::MontgomeryPoint;
//! use card25519::token::{KeyAgreementSession, SimulatedToken};
//!
//! let mut session = KeyAgreementSession::new(SimulatedToken::new());
//! session.connect().unwrap();
//!
//! // Alice's key lives on the token, Bob's is an ordinary X25519 key
//! let (_, alice_pub) = session.generate_keypair().unwrap();
//! let bob = card25519::curve::Scalar::generate(&mut card25519::random::SodiumRng).clamp();
//! let bob_pub = MontgomeryPoint::BASE_POINT.scalar_mult(&bob);
//!
//! let shared = session.generate_shared_secret(&bob_pub).unwrap();
//! assert_eq!(&shared[..], &alice_pub.scalar_mult(&bob).0[..]);
//! ```

mod session;
mod simulator;

pub use session::KeyAgreementSession;
pub use simulator::SimulatedToken;

use crate::curve::{ClampedScalar, MontgomeryPoint, Scalar};
use crate::{mem, Card25519Error};
use thiserror::Error;

/// Error type returned if something went wrong communicating with the token.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum TokenError {
    /// An operation was attempted before the applet was selected with
    /// [`KeyAgreementSession::connect`].
    #[error("not connected to the token")]
    NotConnected,

    /// The token refused to select the applet.
    #[error("failed to select the applet")]
    SelectFailed,

    /// The token answered with a status word other than `90 00`.
    #[error("token returned status {sw1:02x} {sw2:02x}")]
    Status {
        /// First status byte.
        sw1: u8,
        /// Second status byte.
        sw2: u8,
    },

    /// The token's response had the wrong length.
    ///
    /// The applet reports internal errors (for example, a point which is not on the curve) by
    /// returning a 2-byte reason code with a success status, so this usually indicates a
    /// cryptographic failure on the token.
    #[error("token response is {actual} bytes, expected {expected}")]
    ResponseLength {
        /// Expected length of the response data.
        expected: usize,
        /// Actual length of the response data.
        actual: usize,
    },

    /// The underlying transport failed to exchange a command and response.
    #[error("communication with the token failed")]
    CommunicationFailed,
}

/// Application identifier of the applet.
pub const APPLET_AID: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

/// Version number returned by the applet when it is selected.
pub const APPLET_VERSION: u16 = 0x5519;

/// Instruction byte of the SELECT command.
pub const INS_SELECT: u8 = 0xa4;

/// Instruction byte to generate a keypair on the token.
pub const INS_GENERATE_KEYPAIR: u8 = 0x01;

/// Instruction byte to load a private key onto the token.
pub const INS_LOAD_PRIVATE_KEY: u8 = 0x02;

/// Instruction byte to compute a shared secret on the token.
pub const INS_COMPUTE_SHARED_SECRET: u8 = 0x03;

/// Status word for success.
pub const SW_SUCCESS: (u8, u8) = (0x90, 0x00);

/// Status word for invalid command data.
pub const SW_DATA_INVALID: (u8, u8) = (0x69, 0x84);

/// Status word for an unsupported instruction.
pub const SW_INS_NOT_SUPPORTED: (u8, u8) = (0x6d, 0x00);

/// A command APDU.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Command {
    /// Class byte.
    pub cla: u8,
    /// Instruction byte.
    pub ins: u8,
    /// First parameter.
    pub p1: u8,
    /// Second parameter.
    pub p2: u8,
    /// Command data, at most 255 bytes.
    pub data: Vec<u8>,
}

impl Command {
    /// A command to the applet, with class byte and both parameters zero.
    pub fn new(ins: u8, data: &[u8]) -> Self {
        Self {
            cla: 0x00,
            ins,
            p1: 0x00,
            p2: 0x00,
            data: data.to_vec(),
        }
    }

    /// The SELECT command for the applet.
    pub fn select() -> Self {
        Self {
            cla: 0x00,
            ins: INS_SELECT,
            p1: 0x04,
            p2: 0x00,
            data: APPLET_AID.to_vec(),
        }
    }

    /// Serialise this command as `CLA INS P1 P2 Lc data`.
    ///
    /// The `Lc` byte is always present, and is zero for commands without data.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(5 + self.data.len());
        bytes.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2, self.data.len() as u8]);
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Parse a command from `CLA INS P1 P2 [Lc data]`.
    ///
    /// Returns `None` if the header is incomplete or `Lc` does not match the data length.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (header, rest) = bytes.split_at(bytes.len().min(4));
        if header.len() < 4 {
            return None;
        }

        let data = match rest.split_first() {
            None => Vec::new(),
            Some((&lc, data)) if data.len() == lc as usize => data.to_vec(),
            Some(_) => return None,
        };

        Some(Self {
            cla: header[0],
            ins: header[1],
            p1: header[2],
            p2: header[3],
            data,
        })
    }
}

/// A response APDU: the response data and the status word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    /// Response data.
    pub data: Vec<u8>,
    /// First status byte.
    pub sw1: u8,
    /// Second status byte.
    pub sw2: u8,
}

impl Response {
    /// A response with the given data and status word.
    pub fn new(data: Vec<u8>, (sw1, sw2): (u8, u8)) -> Self {
        Self { data, sw1, sw2 }
    }

    /// Whether the status word is `90 00`.
    pub fn is_success(&self) -> bool {
        (self.sw1, self.sw2) == SW_SUCCESS
    }
}

/// A half-duplex link to a token.
///
/// Implementations send the raw command bytes and block until the response arrives. Anything
/// below the APDU layer (reader enumeration, connection, retries) is the implementation's
/// concern; a failure to exchange the command should be reported as
/// [`TokenError::CommunicationFailed`].
pub trait Transport {
    /// Send a command APDU and return the token's response.
    fn transmit(&mut self, command: &[u8]) -> Result<Response, Card25519Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transmit(&mut self, command: &[u8]) -> Result<Response, Card25519Error> {
        (**self).transmit(command)
    }
}

mem::hardened_buffer! {
    /// A Curve25519 private key: a clamped scalar, encoded little-endian.
    ///
    /// This is a hardened buffer type, and will be zeroed on drop. It can be thought of as
    /// roughly equivalent to a `[u8; 32]`, and implements [`core::ops::Deref`], so it can be used
    /// like it is an `&[u8]`. This struct uses heap memory while in scope, allocated using
    /// Sodium's [secure memory utilities](https://doc.libsodium.org/memory_management).
    pub PrivateKey(32);

    /// The result of a key agreement: the little-endian u-coordinate of the shared point.
    ///
    /// This is a hardened buffer type, and will be zeroed on drop. It should be passed through a
    /// key derivation function before being used as a symmetric key.
    pub SharedSecret(32);
}

impl PrivateKey {
    /// Store a clamped scalar as a private key.
    pub fn from_scalar(scalar: &ClampedScalar) -> Result<Self, Card25519Error> {
        let mut key = Self::new_empty()?;
        key.copy_from_slice(&scalar.to_le_bytes()[..]);
        Ok(key)
    }

    /// The scalar this key holds.
    ///
    /// Returns [`CurveError::ScalarNotClamped`](crate::curve::CurveError::ScalarNotClamped) if
    /// the buffer has been modified so that it no longer holds a clamped scalar.
    pub fn scalar(&self) -> Result<ClampedScalar, Card25519Error> {
        ClampedScalar::try_from(Scalar::from_le_bytes(&self[..])?)
    }

    /// Compute the public key corresponding to this private key.
    pub fn public_key(&self) -> Result<MontgomeryPoint, Card25519Error> {
        Ok(MontgomeryPoint::BASE_POINT.scalar_mult(&self.scalar()?))
    }
}
