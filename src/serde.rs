//! Serde support for the values signers exchange.
//!
//! Human readable formats get a hex string, binary formats get raw bytes.
//! Secret values deliberately don't implement these traits.
use std::fmt;

use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::compat::MuSigCurve;
use crate::key_agg::AggregationState;
use crate::keys::{PublicKey, XOnlyPublicKey};
use crate::nonce::PublicNonce;
use crate::nonce_agg::AggregateNonce;
use crate::sig_agg::AggregateSignature;

struct BytesVisitor(&'static str);

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an encoded {}", self.0)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        hex::decode(v).map_err(E::custom)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(v.to_vec())
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            out.push(byte);
        }
        Ok(out)
    }
}

fn serialize_bytes<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    if serializer.is_human_readable() {
        serializer.serialize_str(&hex::encode(bytes))
    } else {
        serializer.serialize_bytes(bytes)
    }
}

fn deserialize_bytes<'de, D: Deserializer<'de>>(
    deserializer: D,
    what: &'static str,
) -> Result<Vec<u8>, D::Error> {
    if deserializer.is_human_readable() {
        deserializer.deserialize_any(BytesVisitor(what))
    } else {
        deserializer.deserialize_bytes(BytesVisitor(what))
    }
}

macro_rules! impl_wire_serde {
    ($name:ident, $what:literal) => {
        impl<C: MuSigCurve> Serialize for $name<C> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_bytes(&self.to_bytes(), serializer)
            }
        }

        impl<'de, C: MuSigCurve> Deserialize<'de> for $name<C> {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let bytes = deserialize_bytes(deserializer, $what)?;
                Self::from_bytes(&bytes).map_err(de::Error::custom)
            }
        }
    };
}

impl_wire_serde!(PublicKey, "public key");
impl_wire_serde!(XOnlyPublicKey, "x-only public key");
impl_wire_serde!(PublicNonce, "public nonce");
impl_wire_serde!(AggregateNonce, "aggregate nonce");
impl_wire_serde!(AggregateSignature, "signature");
impl_wire_serde!(AggregationState, "aggregation state");
