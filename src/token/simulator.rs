use super::{
    Command, Response, Transport, APPLET_AID, APPLET_VERSION, INS_COMPUTE_SHARED_SECRET,
    INS_GENERATE_KEYPAIR, INS_LOAD_PRIVATE_KEY, INS_SELECT, SW_DATA_INVALID,
    SW_INS_NOT_SUPPORTED, SW_SUCCESS,
};
use crate::curve::weierstrass::{self, WeierstrassPoint};
use crate::curve::{
    montgomery_to_weierstrass_x, scalar_multiply, weierstrass_to_montgomery, Scalar,
    MONTGOMERY_BASE_U,
};
use crate::field::FieldElement;
use crate::random::SodiumRng;
use crate::Card25519Error;
use log::debug;
use rand_core::{CryptoRng, RngCore};

/// Status word for a command the applet cannot parse.
const SW_WRONG_LENGTH: (u8, u8) = (0x67, 0x00);

/// Status word for a SELECT naming an unknown applet.
const SW_FILE_NOT_FOUND: (u8, u8) = (0x6a, 0x82);

/// Status word for a command sent before the applet was selected.
const SW_CONDITIONS_NOT_SATISFIED: (u8, u8) = (0x69, 0x85);

/// Reason code the token reports for an invalid point (`CryptoException.ILLEGAL_VALUE`).
const ILLEGAL_VALUE: u16 = 0x0001;

/// A software token, answering commands as the applet does.
///
/// The token's Weierstrass arithmetic is reproduced by mapping points to Curve25519 and running
/// the Montgomery ladder. It stores private keys divided by the cofactor, returns only
/// x-coordinates, and reports errors with the same status words and reason codes as the applet,
/// so a [`KeyAgreementSession`](super::KeyAgreementSession) cannot tell the difference.
///
/// This is intended for testing. Like the applet, it returns generated private keys to the host.
#[derive(Debug)]
pub struct SimulatedToken<R = SodiumRng> {
    rng: R,
    selected: bool,
    private_key: Option<Scalar>,
}

impl SimulatedToken<SodiumRng> {
    /// Create a new token, which generates keys using Sodium's CSPRNG.
    pub fn new() -> Self {
        Self::with_rng(SodiumRng)
    }
}

impl Default for SimulatedToken<SodiumRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> SimulatedToken<R> {
    /// Create a new token, which generates keys using `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            selected: false,
            private_key: None,
        }
    }

    /// The private key currently held by the token, divided by the cofactor.
    pub fn private_key(&self) -> Option<Scalar> {
        self.private_key.clone()
    }

    fn process(&mut self, command: &Command) -> Response {
        if command.ins == INS_SELECT {
            self.selected = command.data == APPLET_AID;
            return if self.selected {
                Response::new(APPLET_VERSION.to_be_bytes().to_vec(), SW_SUCCESS)
            } else {
                Response::new(vec![], SW_FILE_NOT_FOUND)
            };
        }

        if !self.selected {
            return Response::new(vec![], SW_CONDITIONS_NOT_SATISFIED);
        }

        match command.ins {
            INS_GENERATE_KEYPAIR => self.generate_keypair(),
            INS_LOAD_PRIVATE_KEY => self.load_private_key(&command.data),
            INS_COMPUTE_SHARED_SECRET => self.compute_shared_secret(&command.data),
            ins => {
                debug!("simulated token: unsupported INS {:02x}", ins);
                Response::new(vec![], SW_INS_NOT_SUPPORTED)
            }
        }
    }

    fn generate_keypair(&mut self) -> Response {
        let reduced = Scalar::generate(&mut self.rng).clamp().div_by_cofactor();

        let mut data = reduced.to_be_bytes().to_vec();
        data.extend_from_slice(&public_x(&reduced));
        self.private_key = Some(reduced);

        Response::new(data, SW_SUCCESS)
    }

    fn load_private_key(&mut self, data: &[u8]) -> Response {
        // The applet clamps and divides by the cofactor whatever it is sent.
        let reduced = match Scalar::from_be_bytes(data) {
            Ok(scalar) => scalar.clamp().div_by_cofactor(),
            Err(_) => return Response::new(vec![], SW_DATA_INVALID),
        };

        let data = public_x(&reduced).to_vec();
        self.private_key = Some(reduced);

        Response::new(data, SW_SUCCESS)
    }

    fn compute_shared_secret(&mut self, data: &[u8]) -> Response {
        let (key, point) = match (&self.private_key, WeierstrassPoint::from_slice(data)) {
            (Some(key), Ok(point)) => (key, point),
            _ => return Response::new(vec![], SW_DATA_INVALID),
        };

        if !point.is_on_curve() {
            return Response::new(ILLEGAL_VALUE.to_be_bytes().to_vec(), SW_SUCCESS);
        }

        let u = scalar_multiply(key, &weierstrass_to_montgomery(&point.x()));
        Response::new(
            montgomery_to_weierstrass_x(&u).to_be_bytes().to_vec(),
            SW_SUCCESS,
        )
    }
}

/// The Weierstrass x-coordinate of `n * G`.
fn public_x(n: &Scalar) -> [u8; weierstrass::COORDINATE_LENGTH] {
    let u = scalar_multiply(n, &FieldElement::from_u64(MONTGOMERY_BASE_U));
    montgomery_to_weierstrass_x(&u).to_be_bytes()
}

impl<R: RngCore + CryptoRng> Transport for SimulatedToken<R> {
    fn transmit(&mut self, command: &[u8]) -> Result<Response, Card25519Error> {
        Ok(match Command::from_bytes(command) {
            Some(command) => self.process(&command),
            None => Response::new(vec![], SW_WRONG_LENGTH),
        })
    }
}
