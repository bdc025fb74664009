//! Tweaking an aggregate key.
//!
//! A tweak adds `t * G` to the aggregate key, for example to commit to a
//! taproot script tree. An x-only tweak first normalizes the key to have an
//! even y coordinate, which is what BIP-341 style tweaking expects.
//!
//! Tweaks are applied one at a time, each producing a new [`AggregationState`].
//! Unlike key aggregation, the order matters as soon as plain and x-only
//! tweaks are mixed.
use elliptic_curve::{Field, Group};

use crate::compat::{MuSigCurve, SCALAR_LEN};
use crate::errors::{CryptoFailure, MuSigError, Result};
use crate::key_agg::AggregationState;
use crate::keys::{Parity, PublicKey, XOnlyPublicKey};

/// How a tweak gets applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweakMode {
    /// Add the tweak to the key as is.
    Plain,
    /// Add the tweak to the key with even y coordinate.
    XOnly,
}

/// A 32 byte tweak, along with how to apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tweak {
    bytes: [u8; SCALAR_LEN],
    mode: TweakMode,
}

impl Tweak {
    pub fn plain(bytes: [u8; SCALAR_LEN]) -> Self {
        Self {
            bytes,
            mode: TweakMode::Plain,
        }
    }

    pub fn x_only(bytes: [u8; SCALAR_LEN]) -> Self {
        Self {
            bytes,
            mode: TweakMode::XOnly,
        }
    }

    /// Create a tweak from a slice, which must be exactly 32 bytes.
    pub fn from_slice(bytes: &[u8], mode: TweakMode) -> Result<Self> {
        MuSigError::check_key_size(bytes, SCALAR_LEN)?;
        let mut array = [0u8; SCALAR_LEN];
        array.copy_from_slice(bytes);
        Ok(Self { bytes: array, mode })
    }

    pub fn bytes(&self) -> &[u8; SCALAR_LEN] {
        &self.bytes
    }

    pub fn mode(&self) -> TweakMode {
        self.mode
    }
}

/// Apply one tweak, returning the next state.
fn apply<C: MuSigCurve>(
    state: &AggregationState<C>,
    tweak: &[u8; SCALAR_LEN],
    mode: TweakMode,
) -> Result<AggregationState<C>> {
    let t = C::scalar_from_bytes(tweak).ok_or(CryptoFailure::ScalarOutOfRange)?;
    if bool::from(t.is_zero()) {
        return Err(CryptoFailure::ZeroScalar.into());
    }
    let key = state.public_key();
    let flip = mode == TweakMode::XOnly && key.parity().is_odd();

    let mut q = key.to_projective();
    let mut tacc = state.tacc();
    if flip {
        q = -q;
        tacc = -tacc;
    }
    let q = q + C::ProjectivePoint::generator() * t;
    let key = PublicKey::from_projective(q)?;

    tracing::debug!(?mode, "applied tweak to aggregate key");
    Ok(state.successor(key, state.negated() ^ flip, t + tacc))
}

/// Apply a plain tweak, returning the tweaked key and the new state.
pub fn add_plain<C: MuSigCurve>(
    state: &AggregationState<C>,
    tweak: &[u8; SCALAR_LEN],
) -> Result<(PublicKey<C>, AggregationState<C>)> {
    let next = apply(state, tweak, TweakMode::Plain)?;
    Ok((next.public_key(), next))
}

/// Apply an x-only tweak, returning the tweaked x-only key, its parity, and the new state.
pub fn add_x_only<C: MuSigCurve>(
    state: &AggregationState<C>,
    tweak: &[u8; SCALAR_LEN],
) -> Result<(XOnlyPublicKey<C>, Parity, AggregationState<C>)> {
    let next = apply(state, tweak, TweakMode::XOnly)?;
    let (x_only, parity) = next.public_key().x_only();
    Ok((x_only, parity, next))
}

/// Apply a sequence of tweaks, in order.
pub fn apply_tweaks<C: MuSigCurve>(
    state: &AggregationState<C>,
    tweaks: &[Tweak],
) -> Result<AggregationState<C>> {
    let mut current = state.clone();
    for tweak in tweaks {
        current = apply(&current, &tweak.bytes, tweak.mode)?;
    }
    Ok(current)
}

impl<C: MuSigCurve> AggregationState<C> {
    /// Whether the accumulated tweak is zero, i.e. whether this is an untweaked key.
    pub fn is_untweaked(&self) -> bool {
        bool::from(self.tacc().is_zero()) && !self.negated()
    }
}
