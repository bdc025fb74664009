use elliptic_curve::{Field, Group};
use zeroize::Zeroize;

use crate::compat::{MuSigCurve, SCALAR_LEN};
use crate::errors::{CryptoFailure, MuSigError, Result};
use crate::keys::{PublicKey, SecretKey};
use crate::nonce::{PublicNonce, SecretNonce};
use crate::session::{SigningSession, MESSAGE_LEN};

/// One signer's share of the final signature.
///
/// A partial signature remembers the session it was produced under, so that
/// shares from different ceremonies can't be mixed by accident.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialSignature<C: MuSigCurve> {
    s: C::Scalar,
    session: SigningSession<C>,
}

impl<C: MuSigCurve> PartialSignature<C> {
    /// Parse a partial signature received for a given session.
    pub fn from_bytes(bytes: &[u8], session: &SigningSession<C>) -> Result<Self> {
        MuSigError::check_size(bytes, SCALAR_LEN)?;
        let mut array = [0u8; SCALAR_LEN];
        array.copy_from_slice(bytes);
        let s = C::scalar_from_bytes(&array).ok_or(CryptoFailure::ScalarOutOfRange)?;
        Ok(Self {
            s,
            session: session.clone(),
        })
    }

    pub fn to_bytes(&self) -> [u8; SCALAR_LEN] {
        C::scalar_to_bytes(&self.s)
    }

    /// The session this partial signature belongs to.
    pub fn session(&self) -> &SigningSession<C> {
        &self.session
    }

    pub(crate) fn scalar(&self) -> &C::Scalar {
        &self.s
    }
}

/// `-1` if the aggregate key has an odd y coordinate, `1` otherwise.
fn key_sign<C: MuSigCurve>(session: &SigningSession<C>) -> C::Scalar {
    if session.aggregation_state().public_key().parity().is_odd() {
        -C::Scalar::ONE
    } else {
        C::Scalar::ONE
    }
}

/// Produce a partial signature.
///
/// This consumes the secret nonce, which is wiped whether or not signing
/// succeeds, so a nonce can never be used twice.
pub fn sign<C: MuSigCurve>(
    session: &SigningSession<C>,
    secret_nonce: SecretNonce<C>,
    secret_key: &SecretKey<C>,
) -> Result<PartialSignature<C>> {
    let public_key = secret_key.public_key();
    if public_key != *secret_nonce.owner() {
        return Err(CryptoFailure::KeyMismatch.into());
    }
    let state = session.aggregation_state();
    let a = state
        .coefficient(&public_key)
        .ok_or(CryptoFailure::UnknownSigner)?;

    let public_nonce = secret_nonce.public_nonce();
    let mut k1 = *secret_nonce.k1();
    let mut k2 = *secret_nonce.k2();
    drop(secret_nonce);
    if session.nonce_parity().is_odd() {
        k1 = -k1;
        k2 = -k2;
    }

    let mut d = key_sign(session) * state.gacc() * secret_key.scalar();
    let s = k1 + *session.b() * k2 + *session.e() * a * d;
    k1.zeroize();
    k2.zeroize();
    d.zeroize();

    let out = PartialSignature {
        s,
        session: session.clone(),
    };
    if !session.verify_partial(&out, &public_key, &public_nonce) {
        return Err(CryptoFailure::InvalidPartialSignature.into());
    }
    tracing::debug!(signer = ?public_key, "produced partial signature");
    Ok(out)
}

impl<C: MuSigCurve> SigningSession<C> {
    /// Check the partial signature of one signer against this session.
    ///
    /// This returns false if the signature was produced under a different
    /// session, or if `public_key` is not part of the aggregation.
    #[must_use]
    pub fn verify_partial(
        &self,
        partial: &PartialSignature<C>,
        public_key: &PublicKey<C>,
        public_nonce: &PublicNonce<C>,
    ) -> bool {
        if partial.session != *self {
            tracing::trace!(signer = ?public_key, "partial signature from another session");
            return false;
        }
        let a = match self.aggregation_state().coefficient(public_key) {
            Some(a) => a,
            None => {
                tracing::trace!(signer = ?public_key, "partial signature from non participant");
                return false;
            }
        };

        let (r1, r2) = public_nonce.points();
        let mut effective_nonce = r1 + r2 * self.b();
        if self.nonce_parity().is_odd() {
            effective_nonce = -effective_nonce;
        }
        let g = key_sign(self) * self.aggregation_state().gacc();
        let expected = effective_nonce + public_key.to_projective() * (*self.e() * a * g);
        let valid = C::ProjectivePoint::generator() * partial.s == expected;

        tracing::trace!(signer = ?public_key, valid, "verified partial signature");
        valid
    }
}

/// Verify a partial signature against a message digest.
///
/// This only fails if the digest has the wrong length. A digest other than
/// the one the session was created for is simply an invalid signature.
pub fn verify_partial<C: MuSigCurve>(
    session: &SigningSession<C>,
    partial: &PartialSignature<C>,
    public_key: &PublicKey<C>,
    public_nonce: &PublicNonce<C>,
    digest: &[u8],
) -> Result<bool> {
    MuSigError::check_size(digest, MESSAGE_LEN)?;
    if digest != &session.message()[..] {
        tracing::trace!(signer = ?public_key, "partial signature for another message");
        return Ok(false);
    }
    Ok(session.verify_partial(partial, public_key, public_nonce))
}
