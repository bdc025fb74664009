use digest::Digest;

use crate::compat::{MuSigCurve, SCALAR_LEN};
use crate::context::{Context, Tag};

/// The output length of our hash function.
pub(crate) const HASH_LEN: usize = 32;

/// Hash the concatenation of some byte strings, domain separated by a tag.
pub(crate) fn tagged_hash(tag: Tag, parts: &[&[u8]]) -> [u8; HASH_LEN] {
    let mut hasher = Context::global().hasher(tag);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Like [tagged_hash], but reducing the output into a scalar.
pub(crate) fn tagged_scalar<C: MuSigCurve>(tag: Tag, parts: &[&[u8]]) -> C::Scalar {
    C::scalar_reduce(&tagged_hash(tag, parts))
}

/// The BIP-340 challenge binding a nonce, a public key, and a message.
pub(crate) fn challenge<C: MuSigCurve>(
    nonce_x: &[u8; SCALAR_LEN],
    key_x: &[u8; SCALAR_LEN],
    msg: &[u8],
) -> C::Scalar {
    tagged_scalar::<C>(Tag::Challenge, &[nonce_x, key_x, msg])
}

/// XOR two byte arrays together.
pub(crate) fn xor_bytes<const N: usize>(a: &[u8; N], b: &[u8; N]) -> [u8; N] {
    let mut out = [0u8; N];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *o = x ^ y;
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    use sha2::Sha256;

    #[test]
    fn test_tagged_hash_concatenates_parts() {
        let split = tagged_hash(Tag::Nonce, &[b"hello", b" ", b"world"]);
        let whole = tagged_hash(Tag::Nonce, &[b"hello world"]);
        assert_eq!(split, whole);
        assert_ne!(whole, tagged_hash(Tag::NonceAux, &[b"hello world"]));
    }

    #[test]
    fn test_tagged_hash_definition() {
        let tag = Sha256::digest(b"KeyAgg list");
        let expected: [u8; HASH_LEN] = Sha256::new()
            .chain_update(tag)
            .chain_update(tag)
            .chain_update(b"data")
            .finalize()
            .into();
        assert_eq!(tagged_hash(Tag::KeyAggList, &[b"data"]), expected);
    }

    #[test]
    fn test_xor_bytes() {
        assert_eq!(xor_bytes(&[0b1100, 0xFF], &[0b1010, 0xFF]), [0b0110, 0x00]);
    }
}
