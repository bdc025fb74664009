//! Combining the public nonces of every signer.
//!
//! Anybody can do this, signer or not: a coordinator can aggregate the nonces
//! once, and hand the result out, instead of every signer repeating the work.
use std::fmt;

use elliptic_curve::{group::Curve as _, Group};

use crate::compat::{self, MuSigCurve, POINT_LEN};
use crate::errors::{ContributionKind, CryptoFailure, MuSigError, Result};
use crate::nonce::{PublicNonce, PUBLIC_NONCE_LEN};

/// The sum of the public nonces of every signer.
///
/// Unlike a [`PublicNonce`], either component may be the point at infinity,
/// which gets encoded as 33 zero bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AggregateNonce<C: MuSigCurve> {
    r1: C::AffinePoint,
    r2: C::AffinePoint,
    bytes: [u8; PUBLIC_NONCE_LEN],
}

impl<C: MuSigCurve> AggregateNonce<C> {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MuSigError::check_size(bytes, PUBLIC_NONCE_LEN)?;
        let mut r1 = [0u8; POINT_LEN];
        r1.copy_from_slice(&bytes[..POINT_LEN]);
        let mut r2 = [0u8; POINT_LEN];
        r2.copy_from_slice(&bytes[POINT_LEN..]);
        let r1 = compat::point_from_bytes_ext::<C>(&r1).ok_or(CryptoFailure::InvalidPoint)?;
        let r2 = compat::point_from_bytes_ext::<C>(&r2).ok_or(CryptoFailure::InvalidPoint)?;
        Ok(Self::from_points(r1, r2))
    }

    fn from_points(r1: C::ProjectivePoint, r2: C::ProjectivePoint) -> Self {
        let r1 = r1.to_affine();
        let r2 = r2.to_affine();
        let mut bytes = [0u8; PUBLIC_NONCE_LEN];
        bytes[..POINT_LEN].copy_from_slice(&compat::point_to_bytes_ext::<C>(&r1));
        bytes[POINT_LEN..].copy_from_slice(&compat::point_to_bytes_ext::<C>(&r2));
        Self { r1, r2, bytes }
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_NONCE_LEN] {
        self.bytes
    }

    pub(crate) fn points(&self) -> (C::ProjectivePoint, C::ProjectivePoint) {
        (self.r1.into(), self.r2.into())
    }
}

impl<C: MuSigCurve> fmt::Debug for AggregateNonce<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggregateNonce({})", hex::encode(self.bytes))
    }
}

/// Aggregate the public nonces of every signer.
pub fn aggregate_nonces<C: MuSigCurve>(nonces: &[PublicNonce<C>]) -> Result<AggregateNonce<C>> {
    if nonces.is_empty() {
        return Err(CryptoFailure::EmptyInput.into());
    }
    let mut r1 = C::ProjectivePoint::identity();
    let mut r2 = C::ProjectivePoint::identity();
    for nonce in nonces {
        let (n1, n2) = nonce.points();
        r1 += n1;
        r2 += n2;
    }
    tracing::debug!(participants = nonces.len(), "aggregated public nonces");
    Ok(AggregateNonce::from_points(r1, r2))
}

/// Parse and aggregate encoded public nonces.
///
/// An invalid nonce is reported with the index it had in `nonces`.
pub fn aggregate_nonce_bytes<C: MuSigCurve>(
    nonces: &[impl AsRef<[u8]>],
) -> Result<AggregateNonce<C>> {
    let parsed = nonces
        .iter()
        .enumerate()
        .map(|(i, n)| {
            PublicNonce::from_bytes(n.as_ref())
                .map_err(|e| e.attribute(i, ContributionKind::PublicNonce))
        })
        .collect::<Result<Vec<_>>>()?;
    aggregate_nonces(&parsed)
}

#[cfg(test)]
mod test {
    use super::*;

    use k256::{ProjectivePoint, Secp256k1};
    use rand_core::OsRng;

    use crate::keys::SecretKey;
    use crate::nonce::{generate_nonce, NonceGenArguments};

    fn public_nonces(n: usize) -> Vec<PublicNonce<Secp256k1>> {
        (0..n)
            .map(|_| {
                let sk = SecretKey::<Secp256k1>::random(&mut OsRng);
                let pk = sk.public_key();
                let args = NonceGenArguments {
                    secret_key: &sk,
                    public_key: &pk,
                    message: &[0u8; 32],
                    aggregation: None,
                    extra_input: None,
                };
                generate_nonce(&mut OsRng, args).unwrap().1
            })
            .collect()
    }

    /// The same nonce, with both points negated.
    fn negate(nonce: &PublicNonce<Secp256k1>) -> PublicNonce<Secp256k1> {
        let mut bytes = nonce.to_bytes();
        bytes[0] ^= 1;
        bytes[POINT_LEN] ^= 1;
        PublicNonce::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_aggregate_is_componentwise_sum() -> Result<()> {
        let nonces = public_nonces(3);
        let agg = aggregate_nonces(&nonces)?;

        let (mut r1, mut r2) = (ProjectivePoint::IDENTITY, ProjectivePoint::IDENTITY);
        for n in &nonces {
            let (n1, n2) = n.points();
            r1 += n1;
            r2 += n2;
        }
        assert_eq!(agg.points(), (r1, r2));

        let reversed: Vec<_> = nonces.iter().rev().copied().collect();
        assert_eq!(aggregate_nonces(&reversed)?, agg);
        assert_eq!(AggregateNonce::<Secp256k1>::from_bytes(&agg.to_bytes())?, agg);
        Ok(())
    }

    #[test]
    fn test_infinite_components_encode_as_zeros() -> Result<()> {
        let nonce = public_nonces(1)[0];
        let agg = aggregate_nonces(&[nonce, negate(&nonce)])?;
        assert_eq!(agg.to_bytes(), [0u8; PUBLIC_NONCE_LEN]);
        assert_eq!(AggregateNonce::<Secp256k1>::from_bytes(&[0u8; PUBLIC_NONCE_LEN])?, agg);
        Ok(())
    }

    #[test]
    fn test_invalid_nonce_is_attributed() {
        let mut encoded: Vec<Vec<u8>> =
            public_nonces(3).iter().map(|n| n.to_bytes().to_vec()).collect();
        encoded[2][POINT_LEN] = 0x07;

        assert_eq!(
            aggregate_nonce_bytes::<Secp256k1>(&encoded).unwrap_err(),
            MuSigError::InvalidContribution {
                index: 2,
                kind: ContributionKind::PublicNonce,
                reason: CryptoFailure::InvalidPoint,
            }
        );

        encoded[2].truncate(65);
        assert_eq!(
            aggregate_nonce_bytes::<Secp256k1>(&encoded).unwrap_err(),
            MuSigError::IncorrectParameterSize {
                expected: 66,
                actual: 65
            }
        );
    }

    #[test]
    fn test_zero_components_are_not_valid_public_nonces() {
        let mut encoded: Vec<Vec<u8>> =
            public_nonces(2).iter().map(|n| n.to_bytes().to_vec()).collect();
        encoded[0][..POINT_LEN].copy_from_slice(&[0u8; POINT_LEN]);
        assert_eq!(
            aggregate_nonce_bytes::<Secp256k1>(&encoded).unwrap_err(),
            MuSigError::InvalidContribution {
                index: 0,
                kind: ContributionKind::PublicNonce,
                reason: CryptoFailure::InvalidPoint,
            }
        );
    }

    #[test]
    fn test_empty_aggregation_fails() {
        assert_eq!(
            aggregate_nonces::<Secp256k1>(&[]).unwrap_err(),
            MuSigError::UnderlyingCrypto(CryptoFailure::EmptyInput)
        );
    }
}
