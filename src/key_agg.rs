//! Aggregating the public keys of every signer into a single key.
//!
//! The result of aggregation is an [`AggregationState`], which every later
//! step of a ceremony needs. It contains only public information, and should
//! be treated as an opaque token: pass it along, don't look inside.
use elliptic_curve::{Field, Group};

use crate::compat::{MuSigCurve, POINT_LEN, SCALAR_LEN};
use crate::context::Tag;
use crate::crypto::{tagged_hash, tagged_scalar, HASH_LEN};
use crate::errors::{ContributionKind, CryptoFailure, MuSigError, Result};
use crate::keys::{PublicKey, XOnlyPublicKey};

/// The public state threaded through a ceremony after key aggregation.
///
/// Each tweak produces a new state, leaving the old one valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationState<C: MuSigCurve> {
    /// The aggregate key, including any tweaks.
    key: PublicKey<C>,
    /// Whether the accumulated sign `gacc` is -1 rather than 1.
    negated: bool,
    /// The accumulated tweak.
    tweak: C::Scalar,
    /// The participants, in the order they were aggregated.
    participants: Vec<PublicKey<C>>,
    keys_hash: [u8; HASH_LEN],
    second_key: Option<[u8; POINT_LEN]>,
}

/// Represents the output of key aggregation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyAggOutput<C: MuSigCurve> {
    /// The key signatures will verify against.
    pub aggregate_key: XOnlyPublicKey<C>,
    /// The state needed for tweaking, and for signing.
    pub state: AggregationState<C>,
}

/// The hash committing to the whole list of keys.
fn hash_keys<C: MuSigCurve>(keys: &[PublicKey<C>]) -> [u8; HASH_LEN] {
    let encoded: Vec<u8> = keys.iter().flat_map(|k| k.to_bytes()).collect();
    tagged_hash(Tag::KeyAggList, &[&encoded])
}

/// The first key differing from the first key in the list, if any.
fn second_key<C: MuSigCurve>(keys: &[PublicKey<C>]) -> Option<[u8; POINT_LEN]> {
    let first = keys.first()?.to_bytes();
    keys.iter().map(|k| k.to_bytes()).find(|k| *k != first)
}

fn key_coefficient<C: MuSigCurve>(
    keys_hash: &[u8; HASH_LEN],
    second_key: Option<&[u8; POINT_LEN]>,
    key: &PublicKey<C>,
) -> C::Scalar {
    let bytes = key.to_bytes();
    if second_key == Some(&bytes) {
        return C::Scalar::ONE;
    }
    tagged_scalar::<C>(Tag::KeyAggCoefficient, &[keys_hash, &bytes])
}

/// The untweaked aggregate point, `Σ a_i * P_i`.
fn aggregate_point<C: MuSigCurve>(
    keys: &[PublicKey<C>],
    keys_hash: &[u8; HASH_LEN],
    second_key: Option<&[u8; POINT_LEN]>,
) -> C::ProjectivePoint {
    keys.iter()
        .map(|k| k.to_projective() * key_coefficient::<C>(keys_hash, second_key, k))
        .sum()
}

impl<C: MuSigCurve> AggregationState<C> {
    fn new(
        key: PublicKey<C>,
        negated: bool,
        tweak: C::Scalar,
        participants: Vec<PublicKey<C>>,
    ) -> Self {
        let keys_hash = hash_keys(&participants);
        let second_key = second_key(&participants);
        Self {
            key,
            negated,
            tweak,
            participants,
            keys_hash,
            second_key,
        }
    }

    /// The aggregate key, including any tweaks applied so far.
    pub fn public_key(&self) -> PublicKey<C> {
        self.key
    }

    /// The x-only version of [`AggregationState::public_key`].
    pub fn x_only_public_key(&self) -> XOnlyPublicKey<C> {
        self.key.x_only().0
    }

    /// The keys which were aggregated, in aggregation order.
    pub fn participants(&self) -> &[PublicKey<C>] {
        &self.participants
    }

    /// The aggregation coefficient of a participant, or `None` for outsiders.
    pub(crate) fn coefficient(&self, key: &PublicKey<C>) -> Option<C::Scalar> {
        if !self.participants.contains(key) {
            return None;
        }
        Some(key_coefficient::<C>(
            &self.keys_hash,
            self.second_key.as_ref(),
            key,
        ))
    }

    /// The accumulated sign, as a scalar.
    pub(crate) fn gacc(&self) -> C::Scalar {
        if self.negated {
            -C::Scalar::ONE
        } else {
            C::Scalar::ONE
        }
    }

    pub(crate) fn negated(&self) -> bool {
        self.negated
    }

    /// The accumulated tweak.
    pub(crate) fn tacc(&self) -> C::Scalar {
        self.tweak
    }

    /// Build the state following this one, after a tweak.
    pub(crate) fn successor(&self, key: PublicKey<C>, negated: bool, tweak: C::Scalar) -> Self {
        Self {
            key,
            negated,
            tweak,
            participants: self.participants.clone(),
            keys_hash: self.keys_hash,
            second_key: self.second_key,
        }
    }

    /// Encode this state as an opaque blob, for moving it between processes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            POINT_LEN + 1 + SCALAR_LEN + 4 + POINT_LEN * self.participants.len(),
        );
        out.extend_from_slice(&self.key.to_bytes());
        out.push(u8::from(self.negated));
        out.extend_from_slice(&C::scalar_to_bytes(&self.tweak));
        // A fixed width count, so the blob is the same on every platform.
        out.extend_from_slice(&(self.participants.len() as u32).to_be_bytes());
        for p in &self.participants {
            out.extend_from_slice(&p.to_bytes());
        }
        out
    }

    /// Decode a blob produced by [`AggregationState::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        const HEADER: usize = POINT_LEN + 1 + SCALAR_LEN + 4;
        let malformed = || MuSigError::UnderlyingCrypto(CryptoFailure::MalformedState);

        if bytes.len() < HEADER {
            return Err(malformed());
        }
        let (key, rest) = bytes.split_at(POINT_LEN);
        let key = PublicKey::from_bytes(key).map_err(|_| malformed())?;
        let negated = match rest[0] {
            0 => false,
            1 => true,
            _ => return Err(malformed()),
        };
        let (tweak, rest) = rest[1..].split_at(SCALAR_LEN);
        let mut tweak_bytes = [0u8; SCALAR_LEN];
        tweak_bytes.copy_from_slice(tweak);
        let tweak = C::scalar_from_bytes(&tweak_bytes).ok_or_else(malformed)?;
        let (count, rest) = rest.split_at(4);
        let mut count_bytes = [0u8; 4];
        count_bytes.copy_from_slice(count);
        let count = u32::from_be_bytes(count_bytes) as usize;
        let expected_len = count.checked_mul(POINT_LEN).ok_or_else(malformed)?;
        if count == 0 || rest.len() != expected_len {
            return Err(malformed());
        }
        let participants = rest
            .chunks_exact(POINT_LEN)
            .map(PublicKey::from_bytes)
            .collect::<Result<Vec<_>>>()
            .map_err(|_| malformed())?;

        let state = Self::new(key, negated, tweak, participants);
        // The key must be gacc * Q0 + tacc * G for the participants' own Q0.
        let untweaked = aggregate_point::<C>(
            &state.participants,
            &state.keys_hash,
            state.second_key.as_ref(),
        );
        let expected = untweaked * state.gacc() + C::ProjectivePoint::generator() * state.tacc();
        if expected != key.to_projective() {
            tracing::warn!("aggregation state key does not match its participants");
            return Err(malformed());
        }
        Ok(state)
    }
}

/// Aggregate public keys, in exactly the order given.
///
/// Different orders produce different aggregate keys. Prefer [aggregate],
/// unless all signers have agreed on an order some other way.
pub fn aggregate_in_order<C: MuSigCurve>(keys: &[PublicKey<C>]) -> Result<KeyAggOutput<C>> {
    if keys.is_empty() {
        return Err(CryptoFailure::EmptyInput.into());
    }
    let keys_hash = hash_keys(keys);
    let second = second_key(keys);

    let point = aggregate_point::<C>(keys, &keys_hash, second.as_ref());
    let key = PublicKey::from_projective(point)?;

    tracing::debug!(participants = keys.len(), "aggregated public keys");
    let state = AggregationState::new(key, false, C::Scalar::ZERO, keys.to_vec());
    Ok(KeyAggOutput {
        aggregate_key: state.x_only_public_key(),
        state,
    })
}

/// Aggregate the public keys of all signers.
///
/// The keys are sorted first, so every signer arrives at the same aggregate
/// key no matter what order they collected the keys in.
pub fn aggregate<C: MuSigCurve>(keys: &[PublicKey<C>]) -> Result<KeyAggOutput<C>> {
    let mut sorted = keys.to_vec();
    sorted.sort();
    aggregate_in_order(&sorted)
}

/// Parse and aggregate encoded public keys.
///
/// Every key is validated on its own first, so that an invalid key can be
/// traced back to its index.
pub fn aggregate_bytes<C: MuSigCurve>(keys: &[impl AsRef<[u8]>]) -> Result<KeyAggOutput<C>> {
    let parsed = keys
        .iter()
        .enumerate()
        .map(|(i, k)| {
            PublicKey::from_bytes(k.as_ref())
                .map_err(|e| e.attribute(i, ContributionKind::PublicKey))
        })
        .collect::<Result<Vec<_>>>()?;
    aggregate(&parsed)
}
