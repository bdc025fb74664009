use digest::Digest;
use elliptic_curve::{group::Curve as _, Group};
use sha2::Sha256;

use crate::compat::{MuSigCurve, SCALAR_LEN};
use crate::context::Tag;
use crate::crypto::{challenge, tagged_scalar};
use crate::errors::{MuSigError, Result};
use crate::key_agg::AggregationState;
use crate::keys::Parity;
use crate::nonce_agg::AggregateNonce;

/// The length of the message digests we sign.
pub const MESSAGE_LEN: usize = 32;

/// Everything about a single ceremony which signers and verifiers agree on.
///
/// This binds together the aggregate nonce, the aggregation state, and the
/// message, and precomputes the values derived from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningSession<C: MuSigCurve> {
    aggregate_nonce: AggregateNonce<C>,
    state: AggregationState<C>,
    message: [u8; MESSAGE_LEN],
    /// The coefficient of the second nonce.
    b: C::Scalar,
    /// The final nonce, R.
    nonce: C::AffinePoint,
    /// The BIP-340 challenge.
    e: C::Scalar,
}

impl<C: MuSigCurve> SigningSession<C> {
    pub fn new(
        aggregate_nonce: &AggregateNonce<C>,
        state: &AggregationState<C>,
        message: &[u8; MESSAGE_LEN],
    ) -> Self {
        let key_x = state.x_only_public_key().to_bytes();
        let b = tagged_scalar::<C>(
            Tag::NonceCoefficient,
            &[&aggregate_nonce.to_bytes(), &key_x, message],
        );

        let (r1, r2) = aggregate_nonce.points();
        let r = r1 + r2 * b;
        // An infinite nonce can only be produced by a malicious signer, and we
        // can't tell who, so we continue with the generator instead.
        let r = if bool::from(r.is_identity()) {
            C::ProjectivePoint::generator()
        } else {
            r
        };
        let nonce = r.to_affine();
        let e = challenge::<C>(&C::x_only_bytes(&nonce), &key_x, message);

        tracing::debug!(
            participants = state.participants().len(),
            "created signing session"
        );
        Self {
            aggregate_nonce: *aggregate_nonce,
            state: state.clone(),
            message: *message,
            b,
            nonce,
            e,
        }
    }

    /// Like [`SigningSession::new`], checking that the digest has the right length.
    pub fn from_digest(
        aggregate_nonce: &AggregateNonce<C>,
        state: &AggregationState<C>,
        digest: &[u8],
    ) -> Result<Self> {
        MuSigError::check_size(digest, MESSAGE_LEN)?;
        let mut message = [0u8; MESSAGE_LEN];
        message.copy_from_slice(digest);
        Ok(Self::new(aggregate_nonce, state, &message))
    }

    /// Sign arbitrary data, by signing its SHA-256 digest.
    ///
    /// Verifiers need to check the signature against that same digest.
    pub fn for_message(
        aggregate_nonce: &AggregateNonce<C>,
        state: &AggregationState<C>,
        data: &[u8],
    ) -> Self {
        let mut message = [0u8; MESSAGE_LEN];
        message.copy_from_slice(&Sha256::digest(data));
        Self::new(aggregate_nonce, state, &message)
    }

    pub fn aggregate_nonce(&self) -> &AggregateNonce<C> {
        &self.aggregate_nonce
    }

    pub fn aggregation_state(&self) -> &AggregationState<C> {
        &self.state
    }

    pub fn message(&self) -> &[u8; MESSAGE_LEN] {
        &self.message
    }

    pub(crate) fn b(&self) -> &C::Scalar {
        &self.b
    }

    pub(crate) fn e(&self) -> &C::Scalar {
        &self.e
    }

    /// The x coordinate of the final nonce, which starts the signature.
    pub(crate) fn nonce_x(&self) -> [u8; SCALAR_LEN] {
        C::x_only_bytes(&self.nonce)
    }

    pub(crate) fn nonce_parity(&self) -> Parity {
        Parity::of::<C>(&self.nonce)
    }
}
