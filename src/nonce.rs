//! Generating the nonces each signer contributes to a ceremony.
//!
//! Every signer generates a fresh [`SecretNonce`] and [`PublicNonce`] per
//! ceremony. The public half is sent to everybody, the secret half is kept
//! until signing, where it gets consumed.
//!
//! **WARNING** A secret nonce must never be used to sign twice: two partial
//! signatures under the same nonce reveal the signer's secret key. This crate
//! makes that impossible by having [`crate::sign`] take the nonce by value,
//! but any copy made through [`SecretNonce::into_bytes`] is your responsibility.
use std::fmt;

use elliptic_curve::{group::Curve as _, Field, Group};
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::compat::{MuSigCurve, POINT_LEN, SCALAR_LEN};
use crate::context::Tag;
use crate::crypto::{tagged_hash, tagged_scalar, xor_bytes};
use crate::errors::{CryptoFailure, MuSigError, Result};
use crate::key_agg::AggregationState;
use crate::keys::{PublicKey, SecretKey};

/// The length of an encoded secret nonce.
pub const SECRET_NONCE_LEN: usize = 2 * SCALAR_LEN + POINT_LEN;
/// The length of an encoded public nonce, or aggregate nonce.
pub const PUBLIC_NONCE_LEN: usize = 2 * POINT_LEN;

/// The length of a session id.
pub const SESSION_ID_LEN: usize = 32;

/// The secret half of a signer's nonce.
///
/// This can't be cloned, and gets wiped from memory when dropped.
pub struct SecretNonce<C: MuSigCurve> {
    k1: C::Scalar,
    k2: C::Scalar,
    owner: PublicKey<C>,
}

impl<C: MuSigCurve> SecretNonce<C> {
    /// Parse a secret nonce from its 97 byte encoding, `k1 || k2 || pk`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MuSigError::check_size(bytes, SECRET_NONCE_LEN)?;
        let k1 = parse_nonce_scalar::<C>(&bytes[..SCALAR_LEN])?;
        let k2 = parse_nonce_scalar::<C>(&bytes[SCALAR_LEN..2 * SCALAR_LEN])?;
        let owner = PublicKey::from_bytes(&bytes[2 * SCALAR_LEN..])?;
        Ok(Self { k1, k2, owner })
    }

    /// Encode this nonce, consuming it.
    ///
    /// Use this only to move a nonce across a process boundary; the encoding
    /// must be deleted as soon as it has been parsed again.
    pub fn into_bytes(self) -> Zeroizing<[u8; SECRET_NONCE_LEN]> {
        let mut out = Zeroizing::new([0u8; SECRET_NONCE_LEN]);
        out[..SCALAR_LEN].copy_from_slice(&C::scalar_to_bytes(&self.k1));
        out[SCALAR_LEN..2 * SCALAR_LEN].copy_from_slice(&C::scalar_to_bytes(&self.k2));
        out[2 * SCALAR_LEN..].copy_from_slice(&self.owner.to_bytes());
        out
    }

    /// The public key of the signer this nonce belongs to.
    pub fn owner(&self) -> &PublicKey<C> {
        &self.owner
    }

    /// The public nonce matching this secret nonce.
    pub fn public_nonce(&self) -> PublicNonce<C> {
        let g = C::ProjectivePoint::generator();
        PublicNonce::from_points(g * self.k1, g * self.k2)
    }

    pub(crate) fn k1(&self) -> &C::Scalar {
        &self.k1
    }

    pub(crate) fn k2(&self) -> &C::Scalar {
        &self.k2
    }
}

fn parse_nonce_scalar<C: MuSigCurve>(bytes: &[u8]) -> Result<C::Scalar> {
    let mut array = Zeroizing::new([0u8; SCALAR_LEN]);
    array.copy_from_slice(bytes);
    let k = C::scalar_from_bytes(&array).ok_or(CryptoFailure::ScalarOutOfRange)?;
    if bool::from(k.is_zero()) {
        return Err(CryptoFailure::ZeroScalar.into());
    }
    Ok(k)
}

impl<C: MuSigCurve> fmt::Debug for SecretNonce<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretNonce")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl<C: MuSigCurve> Drop for SecretNonce<C> {
    fn drop(&mut self) {
        self.k1.zeroize();
        self.k2.zeroize();
    }
}

impl<C: MuSigCurve> ZeroizeOnDrop for SecretNonce<C> {}

/// The public half of a signer's nonce, i.e. two points.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicNonce<C: MuSigCurve> {
    r1: C::AffinePoint,
    r2: C::AffinePoint,
    bytes: [u8; PUBLIC_NONCE_LEN],
}

impl<C: MuSigCurve> PublicNonce<C> {
    /// Parse a public nonce from its 66 byte encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MuSigError::check_size(bytes, PUBLIC_NONCE_LEN)?;
        let mut r1 = [0u8; POINT_LEN];
        r1.copy_from_slice(&bytes[..POINT_LEN]);
        let mut r2 = [0u8; POINT_LEN];
        r2.copy_from_slice(&bytes[POINT_LEN..]);
        let r1 = C::point_from_bytes(&r1).ok_or(CryptoFailure::InvalidPoint)?;
        let r2 = C::point_from_bytes(&r2).ok_or(CryptoFailure::InvalidPoint)?;
        let mut array = [0u8; PUBLIC_NONCE_LEN];
        array.copy_from_slice(bytes);
        Ok(Self {
            r1,
            r2,
            bytes: array,
        })
    }

    /// Build a public nonce from two points other than the identity.
    fn from_points(r1: C::ProjectivePoint, r2: C::ProjectivePoint) -> Self {
        let r1 = r1.to_affine();
        let r2 = r2.to_affine();
        let mut bytes = [0u8; PUBLIC_NONCE_LEN];
        bytes[..POINT_LEN].copy_from_slice(&crate::compat::point_to_bytes_ext::<C>(&r1));
        bytes[POINT_LEN..].copy_from_slice(&crate::compat::point_to_bytes_ext::<C>(&r2));
        Self { r1, r2, bytes }
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_NONCE_LEN] {
        self.bytes
    }

    pub(crate) fn points(&self) -> (C::ProjectivePoint, C::ProjectivePoint) {
        (self.r1.into(), self.r2.into())
    }
}

impl<C: MuSigCurve> fmt::Debug for PublicNonce<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicNonce({})", hex::encode(self.bytes))
    }
}

/// The arguments needed to generate a nonce.
///
/// Everything here is hashed into the nonce alongside the session id, so
/// that a weak session id alone does not make the nonce predictable.
#[derive(Clone, Copy)]
pub struct NonceGenArguments<'a, C: MuSigCurve> {
    /// The key the signer will sign with.
    pub secret_key: &'a SecretKey<C>,
    /// The public key matching `secret_key`.
    pub public_key: &'a PublicKey<C>,
    /// The digest of the message which will be signed.
    pub message: &'a [u8; 32],
    /// The aggregation the signer is taking part in, if already known.
    pub aggregation: Option<&'a AggregationState<C>>,
    /// Any additional context to bind the nonce to.
    pub extra_input: Option<&'a [u8; 32]>,
}

/// Generate a nonce from an explicit session id.
///
/// The same session id and arguments always produce the same nonce. This
/// is meant for reproducible tests: reusing a session id for two different
/// messages leaks your secret key. Use [generate_nonce] otherwise.
pub fn generate_nonce_with_session_id<C: MuSigCurve>(
    session_id: &[u8; SESSION_ID_LEN],
    args: NonceGenArguments<'_, C>,
) -> Result<(SecretNonce<C>, PublicNonce<C>)> {
    if args.secret_key.public_key() != *args.public_key {
        return Err(CryptoFailure::KeyMismatch.into());
    }

    let sk_bytes = Zeroizing::new(args.secret_key.to_bytes());
    let rand = Zeroizing::new(xor_bytes(
        &*sk_bytes,
        &tagged_hash(Tag::NonceAux, &[session_id]),
    ));

    let pk = args.public_key.to_bytes();
    let agg_pk = args.aggregation.map(|s| s.x_only_public_key().to_bytes());
    let agg_pk: &[u8] = match &agg_pk {
        Some(k) => k,
        None => &[],
    };
    let msg_len = (args.message.len() as u64).to_be_bytes();
    let extra: &[u8] = match args.extra_input {
        Some(e) => e,
        None => &[],
    };
    let extra_len = (extra.len() as u32).to_be_bytes();

    let derive = |i: u8| {
        tagged_scalar::<C>(
            Tag::Nonce,
            &[
                &rand[..],
                &[pk.len() as u8],
                &pk,
                &[agg_pk.len() as u8],
                agg_pk,
                &[1u8],
                &msg_len,
                args.message,
                &extra_len,
                extra,
                &[i],
            ],
        )
    };
    let k1 = derive(0);
    let k2 = derive(1);
    if bool::from(k1.is_zero() | k2.is_zero()) {
        return Err(CryptoFailure::ZeroScalar.into());
    }

    let secret = SecretNonce {
        k1,
        k2,
        owner: *args.public_key,
    };
    let public = secret.public_nonce();
    tracing::debug!(signer = ?args.public_key, "generated nonce");
    Ok((secret, public))
}

/// Generate a nonce, drawing a fresh session id from `rng`.
///
/// This is the function to use outside of tests.
pub fn generate_nonce<C: MuSigCurve>(
    rng: &mut impl CryptoRngCore,
    args: NonceGenArguments<'_, C>,
) -> Result<(SecretNonce<C>, PublicNonce<C>)> {
    let mut session_id = Zeroizing::new([0u8; SESSION_ID_LEN]);
    rng.fill_bytes(&mut session_id[..]);
    generate_nonce_with_session_id(&session_id, args)
}
