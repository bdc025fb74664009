//! Errors produced by the MuSig2 operations.
//!
//! Length problems are reported before any curve arithmetic happens.
//! Everything the curve layer rejects is an [`MuSigError::UnderlyingCrypto`],
//! unless the caller went through one of the `*_bytes` entry points, which
//! validate each contribution on its own and can therefore say who sent it.
use core::fmt;

use thiserror::Error;

/// The reason the curve layer refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CryptoFailure {
    /// Bytes which do not encode a point on the curve.
    InvalidPoint,
    /// A scalar greater than or equal to the group order.
    ScalarOutOfRange,
    /// A scalar which must be nonzero was zero.
    ZeroScalar,
    /// The operation produced the point at infinity.
    PointAtInfinity,
    /// An aggregation was asked to combine nothing.
    EmptyInput,
    /// A secret key does not match the public key it was paired with.
    KeyMismatch,
    /// The signer's key is not part of the aggregation.
    UnknownSigner,
    /// A freshly produced partial signature failed its own verification.
    InvalidPartialSignature,
    /// An aggregation state blob could not be decoded.
    MalformedState,
}

impl fmt::Display for CryptoFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CryptoFailure::InvalidPoint => "invalid curve point",
            CryptoFailure::ScalarOutOfRange => "scalar not below the group order",
            CryptoFailure::ZeroScalar => "zero scalar",
            CryptoFailure::PointAtInfinity => "result is the point at infinity",
            CryptoFailure::EmptyInput => "nothing to aggregate",
            CryptoFailure::KeyMismatch => "secret key does not match public key",
            CryptoFailure::UnknownSigner => "signer is not part of the aggregate key",
            CryptoFailure::InvalidPartialSignature => "partial signature failed to verify",
            CryptoFailure::MalformedState => "malformed aggregation state",
        };
        f.write_str(s)
    }
}

/// The kind of value a participant contributed to a ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContributionKind {
    PublicKey,
    PublicNonce,
    PartialSignature,
}

impl fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContributionKind::PublicKey => f.write_str("pubkey"),
            ContributionKind::PublicNonce => f.write_str("pubnonce"),
            ContributionKind::PartialSignature => f.write_str("partial-sig"),
        }
    }
}

/// Represents an error which can happen in any of the MuSig2 operations.
///
/// None of these are worth retrying: the caller should abort the ceremony
/// for the affected signer, and restart from nonce generation if needed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MuSigError {
    /// A fixed size wire artifact had the wrong length.
    #[error("incorrect parameter size: expected {expected} bytes, found {actual}")]
    IncorrectParameterSize { expected: usize, actual: usize },

    /// A secret scalar or tweak had the wrong length.
    #[error("incorrect key size: expected {expected} bytes, found {actual}")]
    IncorrectKeySize { expected: usize, actual: usize },

    /// The curve layer rejected the operation.
    #[error("underlying crypto error: {0}")]
    UnderlyingCrypto(CryptoFailure),

    /// A specific participant's contribution was rejected.
    #[error("invalid {kind} contribution at index {index}: {reason}")]
    InvalidContribution {
        index: usize,
        kind: ContributionKind,
        reason: CryptoFailure,
    },

    /// A partial signature was produced under a different session than the others.
    #[error("partial signature at index {index} belongs to a different session")]
    SessionMismatch { index: usize },
}

impl From<CryptoFailure> for MuSigError {
    fn from(e: CryptoFailure) -> Self {
        Self::UnderlyingCrypto(e)
    }
}

impl MuSigError {
    /// Check that a byte slice has the length a wire format requires.
    pub(crate) fn check_size(bytes: &[u8], expected: usize) -> Result<(), Self> {
        if bytes.len() != expected {
            return Err(Self::IncorrectParameterSize {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(())
    }

    /// Attribute an underlying failure to the participant who caused it.
    ///
    /// Errors which aren't about the curve layer pass through unchanged.
    pub(crate) fn attribute(self, index: usize, kind: ContributionKind) -> Self {
        match self {
            Self::UnderlyingCrypto(reason) => {
                tracing::warn!(index, %kind, %reason, "rejected contribution");
                Self::InvalidContribution {
                    index,
                    kind,
                    reason,
                }
            }
            other => other,
        }
    }

    /// Like [`MuSigError::check_size`], for secret scalars and tweaks.
    pub(crate) fn check_key_size(bytes: &[u8], expected: usize) -> Result<(), Self> {
        if bytes.len() != expected {
            return Err(Self::IncorrectKeySize {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(())
    }
}

pub type Result<T, E = MuSigError> = std::result::Result<T, E>;
