//! Cait-MuSig is an implementation of MuSig2 multi-signatures, as
//! specified by [BIP-327](https://github.com/bitcoin/bips/blob/master/bip-0327.mediawiki).
//!
//! Several signers, each holding their own key, jointly produce a single
//! BIP-340 Schnorr signature under a single aggregate key. Neither the key
//! nor the signature reveal that several parties were involved.
//!
//! # Warning
//!
//! This is experimental cryptographic software, and has not undergone any
//! form of audit.
//!
//! # Design
//!
//! A signing ceremony goes through the following steps:
//!
//! - The public keys of every signer are aggregated into an aggregate key,
//! along with an [`AggregationState`]. This only needs to happen once per set of signers.
//! - Optionally, tweaks are applied to the aggregate key, e.g. for taproot.
//! - Each signer generates a nonce for the ceremony, sharing the public half.
//! - The public nonces are aggregated, and combined with the aggregation state
//! and the message into a [`SigningSession`].
//! - Each signer produces a partial signature, which anybody can check.
//! - The partial signatures are aggregated into the final signature.
//!
//! The library only does computation: moving values between signers is up to you.
//! Every value which needs to be sent has a fixed size byte encoding, and
//! implements `serde` traits.
//!
//! It's important that nonces are **never** reused. Secret nonces can't be
//! cloned, and [`sign`] consumes them, so this is enforced by the compiler,
//! unless you go out of your way to encode them.
//!
//! # Generic Curves
//!
//! The protocol logic is written against the `MuSigCurve` trait, which adapts
//! a curve from the RustCrypto [elliptic-curves](https://github.com/RustCrypto/elliptic-curves)
//! suite of libraries. MuSig2 is only defined over secp256k1, which
//! is provided behind a feature:
//!
//! | Curve | Feature |
//! |-------|---------|
//! |Secp256k1|`k256`|
//!
//! # Initialization
//!
//! Hashing makes use of a process-wide context, built on first use.
//! Calling [`init`] at startup builds it ahead of time.
mod compat;
mod context;
mod crypto;
mod errors;
mod key_agg;
mod keys;
mod nonce;
mod nonce_agg;
mod serde;
mod session;
mod sig_agg;
mod sign;
#[cfg(test)]
mod test;
mod tweak;

pub use compat::MuSigCurve;
pub use context::{init, Context};
pub use errors::{ContributionKind, CryptoFailure, MuSigError, Result};
pub use key_agg::{aggregate, aggregate_bytes, aggregate_in_order, AggregationState, KeyAggOutput};
pub use keys::{Parity, PublicKey, SecretKey, XOnlyPublicKey};
pub use nonce::{
    generate_nonce, generate_nonce_with_session_id, NonceGenArguments, PublicNonce, SecretNonce,
};
pub use nonce_agg::{aggregate_nonce_bytes, aggregate_nonces, AggregateNonce};
pub use session::SigningSession;
pub use sig_agg::{aggregate_signature_bytes, aggregate_signatures, AggregateSignature};
pub use sign::{sign, verify_partial, PartialSignature};
pub use tweak::{add_plain, add_x_only, apply_tweaks, Tweak, TweakMode};
