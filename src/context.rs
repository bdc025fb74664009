//! The process-wide context shared by every operation.
//!
//! The context holds SHA-256 states which have already absorbed the prefix
//! `sha256(tag) || sha256(tag)` for each tag MuSig2 uses, so a tagged hash only
//! costs hashing the message itself.
//!
//! The context is built once, on first use, and is read-only afterwards.
//! Applications should call [`init`] during startup to make that moment
//! explicit. Every operation in the crate goes through [`Context::global`],
//! which performs the same one-time initialization if [`init`] was skipped,
//! so concurrent first calls never observe a partially built context.
use std::sync::OnceLock;

use digest::Digest;
use sha2::Sha256;

static CONTEXT: OnceLock<Context> = OnceLock::new();

/// The tags used for domain separation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    KeyAggList,
    KeyAggCoefficient,
    NonceAux,
    Nonce,
    NonceCoefficient,
    Challenge,
}

impl Tag {
    const ALL: [Tag; 6] = [
        Tag::KeyAggList,
        Tag::KeyAggCoefficient,
        Tag::NonceAux,
        Tag::Nonce,
        Tag::NonceCoefficient,
        Tag::Challenge,
    ];

    fn label(self) -> &'static [u8] {
        match self {
            Tag::KeyAggList => b"KeyAgg list",
            Tag::KeyAggCoefficient => b"KeyAgg coefficient",
            Tag::NonceAux => b"MuSig/aux",
            Tag::Nonce => b"MuSig/nonce",
            Tag::NonceCoefficient => b"MuSig/noncecoef",
            Tag::Challenge => b"BIP0340/challenge",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Immutable state shared by every signer in the process.
pub struct Context {
    /// One prefixed hasher per tag, in the order of `Tag::ALL`.
    tagged: Vec<Sha256>,
}

impl Context {
    fn new() -> Self {
        let tagged = Tag::ALL
            .iter()
            .map(|tag| {
                let tag_hash = Sha256::digest(tag.label());
                let mut hasher = Sha256::new();
                hasher.update(&tag_hash);
                hasher.update(&tag_hash);
                hasher
            })
            .collect();
        tracing::debug!("initialized musig context");
        Self { tagged }
    }

    /// Get the process-wide context, initializing it if necessary.
    pub fn global() -> &'static Context {
        CONTEXT.get_or_init(Context::new)
    }

    /// A hasher which has already absorbed the prefix for `tag`.
    pub(crate) fn hasher(&self, tag: Tag) -> Sha256 {
        self.tagged[tag.index()].clone()
    }
}

/// Initialize the process-wide context.
///
/// This is cheap and idempotent; calling it from several threads at once
/// results in exactly one initialization.
pub fn init() -> &'static Context {
    Context::global()
}
