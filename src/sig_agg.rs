//! Combining partial signatures into a BIP-340 signature.
use std::fmt;

use elliptic_curve::{group::Curve as _, Field, Group};

use crate::compat::{self, MuSigCurve, SCALAR_LEN};
use crate::crypto::challenge;
use crate::errors::{ContributionKind, CryptoFailure, MuSigError, Result};
use crate::key_agg::AggregationState;
use crate::keys::XOnlyPublicKey;
use crate::session::{SigningSession, MESSAGE_LEN};
use crate::sign::PartialSignature;

/// The length of an encoded signature.
pub const SIGNATURE_LEN: usize = 2 * SCALAR_LEN;

/// A complete Schnorr signature, `x(R) || s`, as defined by BIP-340.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AggregateSignature<C: MuSigCurve> {
    r: [u8; SCALAR_LEN],
    s: C::Scalar,
}

impl<C: MuSigCurve> AggregateSignature<C> {
    /// Parse a signature from 64 bytes.
    ///
    /// The first half isn't checked here; a bad nonce just fails verification.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MuSigError::check_size(bytes, SIGNATURE_LEN)?;
        let mut r = [0u8; SCALAR_LEN];
        r.copy_from_slice(&bytes[..SCALAR_LEN]);
        let mut s = [0u8; SCALAR_LEN];
        s.copy_from_slice(&bytes[SCALAR_LEN..]);
        let s = C::scalar_from_bytes(&s).ok_or(CryptoFailure::ScalarOutOfRange)?;
        Ok(Self { r, s })
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..SCALAR_LEN].copy_from_slice(&self.r);
        out[SCALAR_LEN..].copy_from_slice(&C::scalar_to_bytes(&self.s));
        out
    }

    /// Verify this signature, as any BIP-340 verifier would.
    #[must_use]
    pub fn verify(&self, public_key: &XOnlyPublicKey<C>, message: &[u8; MESSAGE_LEN]) -> bool {
        let e = challenge::<C>(&self.r, &public_key.to_bytes(), message);
        let big_p = C::ProjectivePoint::from(*public_key.as_affine());
        let big_r = (C::ProjectivePoint::generator() * self.s - big_p * e).to_affine();
        if C::point_to_bytes(&big_r).is_none() {
            return false;
        }
        if bool::from(compat::y_is_odd::<C>(&big_r)) {
            return false;
        }
        C::x_only_bytes(&big_r) == self.r
    }
}

impl<C: MuSigCurve> fmt::Debug for AggregateSignature<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateSignature({})", hex::encode(self.to_bytes()))
    }
}

impl<C: MuSigCurve> AggregationState<C> {
    /// Verify a signature against the aggregate key, with all tweaks applied.
    #[must_use]
    pub fn verify(&self, signature: &AggregateSignature<C>, message: &[u8; MESSAGE_LEN]) -> bool {
        signature.verify(&self.x_only_public_key(), message)
    }
}

/// Aggregate the partial signatures of every signer.
///
/// Every partial signature must come from the same session, otherwise
/// the first one which doesn't is reported.
///
/// This does not check the partial signatures themselves: an invalid one
/// results in an invalid signature. Use [`SigningSession::verify_partial`]
/// to find out who is responsible.
pub fn aggregate_signatures<C: MuSigCurve>(
    partials: &[PartialSignature<C>],
) -> Result<AggregateSignature<C>> {
    let session = partials
        .first()
        .ok_or(CryptoFailure::EmptyInput)?
        .session();
    if let Some(index) = partials.iter().position(|p| p.session() != session) {
        tracing::warn!(index, "partial signature from another session");
        return Err(MuSigError::SessionMismatch { index });
    }

    let state = session.aggregation_state();
    let g = if state.public_key().parity().is_odd() {
        -C::Scalar::ONE
    } else {
        C::Scalar::ONE
    };
    let s = partials
        .iter()
        .fold(*session.e() * g * state.tacc(), |acc, p| acc + p.scalar());

    tracing::debug!(participants = partials.len(), "aggregated partial signatures");
    Ok(AggregateSignature {
        r: session.nonce_x(),
        s,
    })
}

/// Parse and aggregate encoded partial signatures, all for one session.
///
/// A partial signature which fails to parse is reported with its index.
pub fn aggregate_signature_bytes<C: MuSigCurve>(
    session: &SigningSession<C>,
    partials: &[impl AsRef<[u8]>],
) -> Result<AggregateSignature<C>> {
    let parsed = partials
        .iter()
        .enumerate()
        .map(|(i, p)| {
            PartialSignature::from_bytes(p.as_ref(), session)
                .map_err(|e| e.attribute(i, ContributionKind::PartialSignature))
        })
        .collect::<Result<Vec<_>>>()?;
    aggregate_signatures(&parsed)
}
